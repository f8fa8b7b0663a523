// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Error types returned across the crate's boundaries.
//!
//! Every operation reports failure as one of these values; nothing here is
//! raised as a panic. `anyhow` is reserved for the application edge.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::PostId;

/// Failures reported by a storage collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Post {0} not found")]
    NotFound(PostId),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The collaborator refused the write (quota, constraint, disk full, ...).
    #[error("Write rejected: {0}")]
    Rejected(String),
}

impl StorageError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    pub fn database(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Why a draft could not be turned into a post.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("Nothing to post. Add some text or at least one image.")]
    EmptyPost,

    #[error("Too many images: {count} attached, at most {max} allowed.")]
    TooManyImages { count: usize, max: usize },

    #[error("A post is already being published.")]
    InFlight,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Why a post could not be deleted.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeleteError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures while turning picked files into image references.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to read image {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not an image: {path:?}")]
    Unsupported { path: PathBuf },
}

/// Failures while handing a post to the platform share sheet.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ShareError {
    #[error("No internet connection")]
    Offline,

    #[error("Share failed: {0}")]
    Failed(String),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Env(#[from] envy::Error),
}
