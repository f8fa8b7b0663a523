// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Business logic: publishing drafts, reading the feed, sharing posts.

pub mod feed;
pub mod publish;
pub mod share;

pub use feed::{Feed, render_html};
pub use publish::{PublishConfig, PublishService, PublishState};
pub use share::{NetworkProbe, NetworkType, ShareOutcome, ShareRequest, ShareSheet, share_post};
