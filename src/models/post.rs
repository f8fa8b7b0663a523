// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Published post types. Identity and timestamps are owned by the storage collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::draft::ImageRef;

/// Storage-assigned post identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PostId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Durable post as returned by storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub content: String,
    pub images: Vec<ImageRef>,
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// Captured, sanitized data handed to storage on publish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPost {
    /// Sanitized text.
    pub content: String,
    /// Images exactly as attached.
    pub images: Vec<ImageRef>,
    pub author: String,
}
