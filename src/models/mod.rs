// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Domain layer: pure data types shared between the draft store, publish logic and storage.

pub mod draft;
pub mod post;

pub use draft::{Draft, ImageRef};
pub use post::{NewPost, Post, PostId};
