// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Read side of the app: load the feed from storage and render it as sanitized HTML.

use std::sync::Arc;

use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::error::StorageError;
use crate::models::Post;
use crate::store::Storage;

/// Feed reader over a storage collaborator.
pub struct Feed<S: Storage + ?Sized> {
    storage: Arc<S>,
}

impl<S: Storage + ?Sized> Feed<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Fetch every post, newest first, from the authoritative store.
    pub async fn load(&self) -> Result<Vec<Post>, StorageError> {
        let posts = self.storage.list_posts().await?;
        debug!(count = posts.len(), "feed loaded");
        Ok(posts)
    }
}

/// Render posts as a standalone HTML document.
///
/// Post text is escaped, not interpreted. The assembled document is passed
/// through Ammonia so only the expected elements survive; image sources are
/// limited to `data:`, `http` and `https`.
pub fn render_html(posts: &[Post]) -> String {
    let mut body = String::new();
    for post in posts {
        body.push_str(&render_post(post));
    }

    let cleaned = sanitizer().clean(&body).to_string();
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Feed</title></head>\n<body>\n{cleaned}\n</body>\n</html>\n"
    )
}

fn render_post(post: &Post) -> String {
    let created = post.created_at.format(&Rfc3339).unwrap_or_default();
    let mut html = format!(
        "<article class=\"post\"><header><strong>{}</strong> <time datetime=\"{created}\">{created}</time>",
        ammonia::clean_text(&post.author)
    );
    if post.updated_at.is_some() {
        html.push_str(" <em>(edited)</em>");
    }
    html.push_str("</header>");

    if !post.content.is_empty() {
        html.push_str("<p>");
        html.push_str(&ammonia::clean_text(&post.content));
        html.push_str("</p>");
    }

    for (index, image) in post.images.iter().enumerate() {
        html.push_str(&format!(
            "<img src=\"{}\" alt=\"image {}\">",
            ammonia::clean_text(image.as_str()),
            index + 1
        ));
    }

    html.push_str("</article>\n");
    html
}

fn sanitizer() -> ammonia::Builder<'static> {
    let mut builder = ammonia::Builder::default();
    builder
        .add_tags(&["article", "header", "time"])
        .add_tag_attributes("time", &["datetime"])
        .add_allowed_classes("article", &["post"])
        .add_url_schemes(&["data"]);
    builder
}
