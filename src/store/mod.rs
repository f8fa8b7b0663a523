// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Storage collaborators: the component that owns post identity, timestamps and durability.
//!
//! The publish logic only talks to [`Storage`]. Two implementations ship with the crate:
//! - [`MemoryStorage`] for tests and throwaway sessions.
//! - [`RedbStorage`], an embedded on-disk database.

pub mod memory;
pub mod disk;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::{ImageRef, NewPost, Post, PostId};

pub use self::memory::MemoryStorage;
pub use self::disk::RedbStorage;

/// Persistence contract consumed by the publish service and the feed.
///
/// `create_post` is treated as atomic: it either assigns an id and stores the
/// post, or fails without a visible partial write.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a new post, assigning its id and creation timestamp.
    async fn create_post(&self, post: NewPost) -> Result<PostId, StorageError>;

    /// Replace content and images of an existing post.
    async fn update_post(
        &self,
        id: PostId,
        content: String,
        images: Vec<ImageRef>,
    ) -> Result<(), StorageError>;

    /// Remove a post. Unknown ids fail with [`StorageError::NotFound`].
    async fn delete_post(&self, id: PostId) -> Result<(), StorageError>;

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError>;

    /// All posts, newest first.
    async fn list_posts(&self) -> Result<Vec<Post>, StorageError>;
}
