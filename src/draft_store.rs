// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Observable container for the single in-flight draft.
//!
//! The composer and any number of views share one [`DraftStore`] handle. Every
//! effective mutation notifies subscribers synchronously, before the mutating
//! call returns, with the draft as it is after the change.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::models::{Draft, ImageRef};

type Listener = Arc<dyn Fn(&Draft) + Send + Sync>;

#[derive(Default)]
struct Inner {
    draft: Draft,
    listeners: Vec<(u64, Listener)>,
    next_listener: u64,
}

/// Cloneable handle to the shared draft.
#[derive(Clone, Default)]
pub struct DraftStore {
    inner: Arc<Mutex<Inner>>,
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    store: Weak<Mutex<Inner>>,
    id: u64,
}

impl Subscription {
    /// Unsubscribe explicitly.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.lock().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current draft.
    pub fn snapshot(&self) -> Draft {
        self.inner.lock().draft.clone()
    }

    pub fn content(&self) -> String {
        self.inner.lock().draft.content.clone()
    }

    pub fn images(&self) -> Vec<ImageRef> {
        self.inner.lock().draft.images.clone()
    }

    pub fn image_count(&self) -> usize {
        self.inner.lock().draft.images.len()
    }

    /// Replace the text unconditionally. No validation happens here.
    pub fn set_content(&self, text: impl Into<String>) {
        let text = text.into();
        self.mutate(|draft| {
            draft.content = text;
            true
        });
    }

    /// Append an image after all existing ones. Duplicates are kept.
    pub fn add_image(&self, image: ImageRef) {
        self.mutate(|draft| {
            draft.images.push(image);
            true
        });
    }

    /// Append several images in order with a single notification.
    pub fn add_images(&self, images: impl IntoIterator<Item = ImageRef>) {
        let images: Vec<ImageRef> = images.into_iter().collect();
        if images.is_empty() {
            return;
        }
        self.mutate(|draft| {
            draft.images.extend(images);
            true
        });
    }

    /// Remove the image at `index`. Out-of-range indices are ignored and notify nobody.
    pub fn remove_image(&self, index: usize) {
        self.mutate(|draft| {
            if index < draft.images.len() {
                draft.images.remove(index);
                true
            } else {
                false
            }
        });
    }

    /// Clear text and images.
    pub fn reset(&self) {
        self.mutate(|draft| {
            *draft = Draft::default();
            true
        });
    }

    /// Replace the whole draft, e.g. when opening an existing post for editing.
    pub fn load(&self, draft: Draft) {
        self.mutate(|current| {
            *current = draft;
            true
        });
    }

    /// Register `listener` for change notifications.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Draft) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        let id = inner.next_listener;
        inner.next_listener += 1;
        inner.listeners.push((id, Arc::new(listener)));
        Subscription {
            store: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    /// Apply `change`; when it reports a modification, notify listeners outside the lock
    /// so they may read or even mutate the store themselves.
    fn mutate(&self, change: impl FnOnce(&mut Draft) -> bool) {
        let (draft, listeners) = {
            let mut inner = self.inner.lock();
            if !change(&mut inner.draft) {
                return;
            }
            let listeners: Vec<Listener> =
                inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (inner.draft.clone(), listeners)
        };

        for listener in listeners {
            listener(&draft);
        }
    }
}
