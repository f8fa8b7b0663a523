// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Headless core of a social-feed client.
//!
//! A single [`draft_store::DraftStore`] holds the post being composed. The
//! [`logic::publish::PublishService`] sanitizes and validates it, then hands it
//! to a [`store::Storage`] collaborator. The [`mvu`] kernel ties these together
//! for a host such as the bundled CLI in [`app`].

pub mod app;
pub mod config;
pub mod draft_store;
pub mod error;
pub mod logic;
pub mod media;
pub mod models;
pub mod mvu;
pub mod store;
pub mod utils;
