// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Draft domain model: the single in-progress post held by the composer (UI-agnostic).

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::models::post::Post;

/// Opaque reference to an attached image: an encoded `data:` URI or any other URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Encode raw image bytes as a base64 `data:` URI.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for inline `data:` references.
    pub fn is_data_uri(&self) -> bool {
        self.0
            .get(..5)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
    }

}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Inline payloads can be megabytes; show the header only.
        if self.is_data_uri() {
            let header = self.0.split_once(',').map_or(self.0.as_str(), |(h, _)| h);
            write!(f, "{header},…")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// User-editable post content before it is published.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Draft {
    /// Free-form text, may be empty.
    pub content: String,
    /// Attached images in attachment order.
    pub images: Vec<ImageRef>,
}

impl Draft {
    pub fn new(content: impl Into<String>, images: Vec<ImageRef>) -> Self {
        Self {
            content: content.into(),
            images,
        }
    }

    /// Seed a draft from an existing post for editing.
    pub fn from_post(post: &Post) -> Self {
        Self {
            content: post.content.clone(),
            images: post.images.clone(),
        }
    }
}
