// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Image picking: the media-source seam and a file-backed implementation.
//!
//! A picker reports one of three outcomes. Only [`MediaOutcome::Picked`] carries
//! images; cancellation is silent and a denied permission is surfaced so the
//! caller can point the user at the platform settings.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::MediaError;
use crate::models::ImageRef;

/// Result of asking the user for images.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaOutcome {
    /// At least one image, in selection order.
    Picked(Vec<ImageRef>),
    Cancelled,
    PermissionDenied,
}

/// Something that can hand the composer a batch of images.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn pick(&self) -> Result<MediaOutcome, MediaError>;
}

/// Reads a fixed list of image files and inlines them as `data:` URIs.
///
/// An empty list behaves like a dismissed picker.
#[derive(Clone, Debug, Default)]
pub struct FileMediaSource {
    paths: Vec<PathBuf>,
}

impl FileMediaSource {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }
}

#[async_trait]
impl MediaSource for FileMediaSource {
    async fn pick(&self) -> Result<MediaOutcome, MediaError> {
        if self.paths.is_empty() {
            return Ok(MediaOutcome::Cancelled);
        }

        let mut images = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            let bytes = match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(err) if err.kind() == ErrorKind::PermissionDenied => {
                    warn!(path = %path.display(), "no permission to read image");
                    return Ok(MediaOutcome::PermissionDenied);
                }
                Err(source) => {
                    return Err(MediaError::Read {
                        path: path.clone(),
                        source,
                    });
                }
            };
            let mime = image_mime(path, &bytes).ok_or_else(|| MediaError::Unsupported {
                path: path.clone(),
            })?;
            debug!(path = %path.display(), %mime, size = bytes.len(), "image picked");
            images.push(ImageRef::from_bytes(&mime, &bytes));
        }
        Ok(MediaOutcome::Picked(images))
    }
}

/// Sniff the MIME type from the bytes, falling back to the extension. Non-images yield `None`.
pub fn image_mime(path: &Path, bytes: &[u8]) -> Option<String> {
    if let Ok(format) = image::guess_format(bytes) {
        return Some(format.to_mime_type().to_string());
    }
    mime_guess::from_path(path)
        .iter()
        .find(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .map(|mime| mime.essence_str().to_string())
}
