// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Runtime configuration read from `FEEDPOST_*` environment variables.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::logic::publish::PublishConfig;

const PREFIX: &str = "FEEDPOST_";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Location of the embedded post database.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Author recorded on new posts.
    #[serde(default = "default_author")]
    pub author: String,
    /// Optional cap on images per post.
    #[serde(default)]
    pub max_images: Option<usize>,
    /// `tracing` filter directive.
    #[serde(default = "default_log")]
    pub log: String,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./data/feedpost.redb")
}

fn default_author() -> String {
    PublishConfig::default().author
}

fn default_log() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            author: default_author(),
            max_images: None,
            log: default_log(),
        }
    }
}

impl Config {
    /// Load from the process environment, after an optional `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(envy::prefixed(PREFIX).from_env::<Config>()?)
    }

    /// Load from explicit key/value pairs (keys carry the `FEEDPOST_` prefix).
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(PREFIX).from_iter::<_, Config>(vars)?)
    }

    pub fn publish_config(&self) -> PublishConfig {
        PublishConfig {
            author: self.author.clone(),
            max_images: self.max_images,
        }
    }
}
