// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Turn a draft into a durable post, or reject it.
//!
//! Responsibilities:
//! - Sanitize post text (markup stripped, whitespace trimmed).
//! - Validate that something is left to post, and the optional image cap.
//! - Persist through the [`Storage`] collaborator exactly once per accepted attempt.
//! - Refuse overlapping attempts instead of issuing duplicate writes.
//!
//! The draft itself is never touched here: callers reset it after a success and
//! keep it after a failure so the user can retry without retyping.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{DeleteError, PublishError};
use crate::models::{Draft, ImageRef, NewPost, PostId};
use crate::store::Storage;
use crate::utils::sanitize_content;

/// Publish-time policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishConfig {
    /// Author recorded on new posts.
    pub author: String,
    /// Upper bound on attached images. `None` means unbounded.
    pub max_images: Option<usize>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            author: "me".to_string(),
            max_images: None,
        }
    }
}

/// Progress of the most recent publish or update attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PublishState {
    #[default]
    Idle,
    Validating,
    Persisting,
    Succeeded,
    Failed,
}

/// Validated, sanitized content ready for storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedPost {
    pub content: String,
    pub images: Vec<ImageRef>,
}

/// Sanitize and validate `draft` without touching storage.
pub fn prepare(draft: &Draft, config: &PublishConfig) -> Result<PreparedPost, PublishError> {
    let content = sanitize_content(&draft.content);

    if content.is_empty() && draft.images.is_empty() {
        return Err(PublishError::EmptyPost);
    }

    if let Some(max) = config.max_images
        && draft.images.len() > max
    {
        return Err(PublishError::TooManyImages {
            count: draft.images.len(),
            max,
        });
    }

    Ok(PreparedPost {
        content,
        images: draft.images.clone(),
    })
}

/// Clears the in-flight flag when the attempt ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Validates, sanitizes and persists drafts through a storage collaborator.
pub struct PublishService<S: Storage + ?Sized> {
    storage: Arc<S>,
    config: PublishConfig,
    in_flight: AtomicBool,
    state: Mutex<PublishState>,
}

impl<S: Storage + ?Sized> PublishService<S> {
    pub fn new(storage: Arc<S>, config: PublishConfig) -> Self {
        Self {
            storage,
            config,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(PublishState::Idle),
        }
    }

    /// State of the latest attempt.
    pub fn state(&self) -> PublishState {
        *self.state.lock()
    }

    /// True while a publish or update is awaiting storage.
    pub fn is_publishing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Publish `draft` as a new post.
    ///
    /// # Errors
    ///
    /// - [`PublishError::InFlight`] when another attempt is still pending (storage untouched).
    /// - [`PublishError::EmptyPost`] / [`PublishError::TooManyImages`] on validation failure
    ///   (storage untouched).
    /// - [`PublishError::Storage`] with the collaborator's error as-is. No retry.
    pub async fn publish(&self, draft: &Draft) -> Result<PostId, PublishError> {
        let _guard = self.begin()?;

        let prepared = self.validate(draft)?;
        let request = NewPost {
            content: prepared.content,
            images: prepared.images,
            author: self.config.author.clone(),
        };

        self.set_state(PublishState::Persisting);
        match self.storage.create_post(request).await {
            Ok(id) => {
                self.set_state(PublishState::Succeeded);
                info!(post_id = %id, images = draft.images.len(), "post published");
                Ok(id)
            }
            Err(err) => {
                self.set_state(PublishState::Failed);
                warn!(error = %err, "publishing post failed");
                Err(err.into())
            }
        }
    }

    /// Replace an existing post's content with `draft`, through the same sanitize/validate path.
    pub async fn update(&self, id: PostId, draft: &Draft) -> Result<(), PublishError> {
        let _guard = self.begin()?;

        let prepared = self.validate(draft)?;

        self.set_state(PublishState::Persisting);
        match self
            .storage
            .update_post(id, prepared.content, prepared.images)
            .await
        {
            Ok(()) => {
                self.set_state(PublishState::Succeeded);
                info!(post_id = %id, "post updated");
                Ok(())
            }
            Err(err) => {
                self.set_state(PublishState::Failed);
                warn!(post_id = %id, error = %err, "updating post failed");
                Err(err.into())
            }
        }
    }

    /// Delete a post. No local state changes; callers re-fetch the feed afterwards.
    pub async fn delete_post(&self, id: PostId) -> Result<(), DeleteError> {
        debug!(post_id = %id, "deleting post");
        self.storage.delete_post(id).await.map_err(|err| {
            warn!(post_id = %id, error = %err, "deleting post failed");
            DeleteError::from(err)
        })?;
        info!(post_id = %id, "post deleted");
        Ok(())
    }

    fn begin(&self) -> Result<InFlightGuard<'_>, PublishError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("publish rejected: another attempt is pending");
            return Err(PublishError::InFlight);
        }
        Ok(InFlightGuard(&self.in_flight))
    }

    fn validate(&self, draft: &Draft) -> Result<PreparedPost, PublishError> {
        self.set_state(PublishState::Validating);
        prepare(draft, &self.config).inspect_err(|err| {
            self.set_state(PublishState::Failed);
            debug!(error = %err, "draft rejected");
        })
    }

    fn set_state(&self, state: PublishState) {
        *self.state.lock() = state;
    }
}
