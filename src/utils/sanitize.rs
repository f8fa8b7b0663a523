// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Strip markup from user-provided post text before it reaches storage.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a tag-like run: `<` up to and including the next `>`, or to the end
/// of input when the tag is never closed.
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>?").expect("tag pattern is a valid regex"));

/// Produce feed-safe post text.
///
/// # Steps
/// - Remove every substring matching `<[^>]*>?` (tags, including unclosed ones).
/// - Trim leading/trailing whitespace, including whitespace exposed by removed tags.
///
/// The result never contains `<`, so running it twice is a no-op.
pub fn sanitize_content(value: &str) -> String {
    TAG_PATTERN.replace_all(value, "").trim().to_string()
}
