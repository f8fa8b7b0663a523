// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Shared helper utilities reused by storage and business logic.

pub mod hash;
pub mod sanitize;

/// Compute the SHA-256 hex digest of a byte slice.
pub use hash::hash_bytes;
/// Strip markup and surrounding whitespace from post text.
pub use sanitize::sanitize_content;
