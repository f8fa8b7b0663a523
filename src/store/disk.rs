// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Embedded on-disk storage collaborator built on redb.
//!
//! Layout:
//! - `posts`: post id -> JSON [`StoredPost`] (images replaced by content digests).
//! - `images`: SHA-256 hex of the image reference -> reference bytes.
//! - `image_refs`: digest -> number of posts pointing at it.
//! - `meta`: `last_id` counter so ids are never reused.
//!
//! Each operation runs in a single write transaction, so a failed create
//! leaves no partial post behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition, WriteTransaction};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, instrument};

use crate::error::StorageError;
use crate::models::{ImageRef, NewPost, Post, PostId};
use crate::store::Storage;
use crate::utils::hash_bytes;

const POSTS: TableDefinition<u64, &[u8]> = TableDefinition::new("posts");
const IMAGES: TableDefinition<&str, &[u8]> = TableDefinition::new("images");
const IMAGE_REFS: TableDefinition<&str, u64> = TableDefinition::new("image_refs");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const LAST_ID_KEY: &str = "last_id";

/// On-disk shape of a post. Images are stored once and referenced by digest.
#[derive(Debug, Serialize, Deserialize)]
struct StoredPost {
    content: String,
    image_digests: Vec<String>,
    author: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    updated_at: Option<OffsetDateTime>,
}

/// [`Storage`] persisted in a single redb file.
pub struct RedbStorage {
    db: Database,
    path: PathBuf,
}

impl RedbStorage {
    /// Open or create the database at `path`, creating parent directories and tables.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(path).map_err(StorageError::database)?;
        let storage = Self {
            db,
            path: path.to_path_buf(),
        };
        storage.init_tables()?;

        info!("opened post database");
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of distinct image payloads currently stored.
    pub fn image_blob_count(&self) -> Result<u64, StorageError> {
        let read = self.db.begin_read().map_err(StorageError::database)?;
        let images = read.open_table(IMAGES).map_err(StorageError::database)?;
        images.len().map_err(StorageError::database)
    }

    fn init_tables(&self) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(StorageError::database)?;
        txn.open_table(POSTS).map_err(StorageError::database)?;
        txn.open_table(IMAGES).map_err(StorageError::database)?;
        txn.open_table(IMAGE_REFS).map_err(StorageError::database)?;
        txn.open_table(META).map_err(StorageError::database)?;
        txn.commit().map_err(StorageError::database)?;
        debug!("initialized post tables");
        Ok(())
    }

    fn read_stored(txn: &WriteTransaction, id: PostId) -> Result<StoredPost, StorageError> {
        let posts = txn.open_table(POSTS).map_err(StorageError::database)?;
        let bytes = posts
            .get(id.0)
            .map_err(StorageError::database)?
            .map(|guard| guard.value().to_vec())
            .ok_or(StorageError::NotFound(id))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_stored(
        txn: &WriteTransaction,
        id: PostId,
        post: &StoredPost,
    ) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(post)?;
        let mut posts = txn.open_table(POSTS).map_err(StorageError::database)?;
        posts
            .insert(id.0, bytes.as_slice())
            .map_err(StorageError::database)?;
        Ok(())
    }

    /// Store image payloads (once per digest) and bump their reference counts.
    fn retain_images(
        txn: &WriteTransaction,
        images: &[ImageRef],
    ) -> Result<Vec<String>, StorageError> {
        let mut blobs = txn.open_table(IMAGES).map_err(StorageError::database)?;
        let mut refs = txn.open_table(IMAGE_REFS).map_err(StorageError::database)?;
        let mut digests = Vec::with_capacity(images.len());

        for image in images {
            let digest = hash_bytes(image.as_str().as_bytes());
            let count = refs
                .get(digest.as_str())
                .map_err(StorageError::database)?
                .map(|guard| guard.value())
                .unwrap_or(0);
            if count == 0 {
                blobs
                    .insert(digest.as_str(), image.as_str().as_bytes())
                    .map_err(StorageError::database)?;
            }
            refs.insert(digest.as_str(), count + 1)
                .map_err(StorageError::database)?;
            digests.push(digest);
        }

        Ok(digests)
    }

    /// Drop one reference per digest; payloads with no remaining references are removed.
    fn release_images(txn: &WriteTransaction, digests: &[String]) -> Result<(), StorageError> {
        let mut blobs = txn.open_table(IMAGES).map_err(StorageError::database)?;
        let mut refs = txn.open_table(IMAGE_REFS).map_err(StorageError::database)?;

        for digest in digests {
            let count = refs
                .get(digest.as_str())
                .map_err(StorageError::database)?
                .map(|guard| guard.value())
                .unwrap_or(0);
            if count <= 1 {
                refs.remove(digest.as_str())
                    .map_err(StorageError::database)?;
                blobs
                    .remove(digest.as_str())
                    .map_err(StorageError::database)?;
            } else {
                refs.insert(digest.as_str(), count - 1)
                    .map_err(StorageError::database)?;
            }
        }

        Ok(())
    }

    fn next_id(txn: &WriteTransaction) -> Result<PostId, StorageError> {
        let mut meta = txn.open_table(META).map_err(StorageError::database)?;
        let last = meta
            .get(LAST_ID_KEY)
            .map_err(StorageError::database)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = last + 1;
        meta.insert(LAST_ID_KEY, next)
            .map_err(StorageError::database)?;
        Ok(PostId(next))
    }

    /// Rebuild a [`Post`] by resolving image digests against the blob table.
    fn hydrate<T>(images: &T, id: PostId, stored: StoredPost) -> Result<Post, StorageError>
    where
        T: ReadableTable<&'static str, &'static [u8]>,
    {
        let mut resolved = Vec::with_capacity(stored.image_digests.len());
        for digest in &stored.image_digests {
            let bytes = images
                .get(digest.as_str())
                .map_err(StorageError::database)?
                .map(|guard| guard.value().to_vec())
                .ok_or_else(|| {
                    StorageError::Database(format!("post {id} references missing image {digest}"))
                })?;
            let value = String::from_utf8(bytes)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            resolved.push(ImageRef::new(value));
        }

        Ok(Post {
            id,
            content: stored.content,
            images: resolved,
            author: stored.author,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }
}

#[async_trait]
impl Storage for RedbStorage {
    #[instrument(skip_all, fields(images = post.images.len()))]
    async fn create_post(&self, post: NewPost) -> Result<PostId, StorageError> {
        let txn = self.db.begin_write().map_err(StorageError::database)?;
        let id = Self::next_id(&txn)?;
        let image_digests = Self::retain_images(&txn, &post.images)?;
        let stored = StoredPost {
            content: post.content,
            image_digests,
            author: post.author,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        };
        Self::write_stored(&txn, id, &stored)?;
        txn.commit().map_err(StorageError::database)?;

        debug!(post_id = %id, "post written");
        Ok(id)
    }

    #[instrument(skip(self, content, images), fields(post_id = %id))]
    async fn update_post(
        &self,
        id: PostId,
        content: String,
        images: Vec<ImageRef>,
    ) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(StorageError::database)?;
        let mut stored = Self::read_stored(&txn, id)?;

        // Retain first so images kept across the edit never drop to zero references.
        let image_digests = Self::retain_images(&txn, &images)?;
        Self::release_images(&txn, &stored.image_digests)?;

        stored.content = content;
        stored.image_digests = image_digests;
        stored.updated_at = Some(OffsetDateTime::now_utc());
        Self::write_stored(&txn, id, &stored)?;
        txn.commit().map_err(StorageError::database)?;

        debug!("post updated");
        Ok(())
    }

    #[instrument(skip(self), fields(post_id = %id))]
    async fn delete_post(&self, id: PostId) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(StorageError::database)?;
        let stored = Self::read_stored(&txn, id)?;
        {
            let mut posts = txn.open_table(POSTS).map_err(StorageError::database)?;
            posts.remove(id.0).map_err(StorageError::database)?;
        }
        Self::release_images(&txn, &stored.image_digests)?;
        txn.commit().map_err(StorageError::database)?;

        debug!("post deleted");
        Ok(())
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError> {
        let read = self.db.begin_read().map_err(StorageError::database)?;
        let posts = read.open_table(POSTS).map_err(StorageError::database)?;
        let images = read.open_table(IMAGES).map_err(StorageError::database)?;

        let Some(bytes) = posts
            .get(id.0)
            .map_err(StorageError::database)?
            .map(|guard| guard.value().to_vec())
        else {
            return Ok(None);
        };
        let stored: StoredPost = serde_json::from_slice(&bytes)?;
        Self::hydrate(&images, id, stored).map(Some)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StorageError> {
        let read = self.db.begin_read().map_err(StorageError::database)?;
        let posts = read.open_table(POSTS).map_err(StorageError::database)?;
        let images = read.open_table(IMAGES).map_err(StorageError::database)?;

        let mut out = Vec::new();
        // Ids are monotonic, so reverse key order is newest first.
        for entry in posts.iter().map_err(StorageError::database)?.rev() {
            let (key, value) = entry.map_err(StorageError::database)?;
            let id = PostId(key.value());
            let stored: StoredPost = serde_json::from_slice(value.value())?;
            out.push(Self::hydrate(&images, id, stored)?);
        }
        Ok(out)
    }
}
