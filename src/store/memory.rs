// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! In-memory storage collaborator.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::StorageError;
use crate::models::{ImageRef, NewPost, Post, PostId};
use crate::store::Storage;

#[derive(Debug, Default)]
struct Tables {
    posts: BTreeMap<PostId, Post>,
    last_id: u64,
}

/// Process-local [`Storage`] backed by a `BTreeMap`. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.lock().posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_post(&self, post: NewPost) -> Result<PostId, StorageError> {
        let mut tables = self.tables.lock();
        tables.last_id += 1;
        let id = PostId(tables.last_id);
        tables.posts.insert(
            id,
            Post {
                id,
                content: post.content,
                images: post.images,
                author: post.author,
                created_at: OffsetDateTime::now_utc(),
                updated_at: None,
            },
        );
        debug!(post_id = %id, "stored post in memory");
        Ok(id)
    }

    async fn update_post(
        &self,
        id: PostId,
        content: String,
        images: Vec<ImageRef>,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.lock();
        let post = tables
            .posts
            .get_mut(&id)
            .ok_or(StorageError::NotFound(id))?;
        post.content = content;
        post.images = images;
        post.updated_at = Some(OffsetDateTime::now_utc());
        Ok(())
    }

    async fn delete_post(&self, id: PostId) -> Result<(), StorageError> {
        self.tables
            .lock()
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound(id))
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError> {
        Ok(self.tables.lock().posts.get(&id).cloned())
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StorageError> {
        // Ids are monotonic, so reverse key order is newest first.
        Ok(self.tables.lock().posts.values().rev().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(content: &str) -> NewPost {
        NewPost {
            content: content.into(),
            images: vec![ImageRef::from("a"), ImageRef::from("b")],
            author: "me".into(),
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids_and_keeps_image_order() {
        let store = MemoryStorage::new();
        let first = store.create_post(new_post("one")).await.unwrap();
        let second = store.create_post(new_post("two")).await.unwrap();

        assert_eq!(first, PostId(1));
        assert_eq!(second, PostId(2));

        let post = store.get_post(first).await.unwrap().unwrap();
        assert_eq!(post.images, vec![ImageRef::from("a"), ImageRef::from("b")]);
        assert!(post.updated_at.is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryStorage::new();
        store.create_post(new_post("old")).await.unwrap();
        store.create_post(new_post("new")).await.unwrap();

        let contents: Vec<_> = store
            .list_posts()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.content)
            .collect();
        assert_eq!(contents, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn delete_unknown_post_is_not_found() {
        let store = MemoryStorage::new();
        assert_eq!(
            store.delete_post(PostId(42)).await,
            Err(StorageError::NotFound(PostId(42)))
        );
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = MemoryStorage::new();
        let id = store.create_post(new_post("x")).await.unwrap();
        store.delete_post(id).await.unwrap();
        let next = store.create_post(new_post("y")).await.unwrap();
        assert!(next > id);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn update_sets_updated_at() {
        let store = MemoryStorage::new();
        let id = store.create_post(new_post("x")).await.unwrap();
        store
            .update_post(id, "edited".into(), Vec::new())
            .await
            .unwrap();

        let post = store.get_post(id).await.unwrap().unwrap();
        assert_eq!(post.content, "edited");
        assert!(post.images.is_empty());
        assert!(post.updated_at.is_some());
    }
}
