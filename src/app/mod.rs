// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Command-line host driving the composer kernel against the on-disk store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::logic::feed::render_html;
use crate::media::FileMediaSource;
use crate::models::{Post, PostId};
use crate::mvu::{self, Command, ComposerModel, Msg, Services};
use crate::store::{RedbStorage, Storage};

#[derive(Debug, Parser)]
#[command(name = "feedpost")]
#[command(about = "Compose, publish and browse posts in a local feed")]
pub struct Cli {
    /// Database file (overrides FEEDPOST_DATABASE_PATH)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Publish a new post
    Post {
        #[arg(long)]
        text: Option<String>,
        /// Image file to attach (repeatable)
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },

    /// Replace the text of a post and optionally attach more images
    Edit {
        id: u64,
        #[arg(long)]
        text: Option<String>,
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },

    /// List posts, newest first
    List,

    /// Delete a post
    Delete { id: u64 },

    /// Render the feed as sanitized HTML
    Render {
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Install the global `tracing` subscriber. Later calls are ignored.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Execute one CLI invocation.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env().context("Failed to read configuration")?;
    if let Some(path) = cli.database {
        config.database_path = path;
    }
    init_tracing(&config.log);
    debug!(?config, "configuration loaded");

    let storage = RedbStorage::open(&config.database_path).with_context(|| {
        format!(
            "Failed to open database {}",
            config.database_path.display()
        )
    })?;
    let storage: Arc<dyn Storage> = Arc::new(storage);

    match cli.command {
        Commands::Post { text, images } => {
            let services = services(&storage, &config, images);
            let mut model = ComposerModel::default();
            compose(&mut model, text, &services).await?;
            step(&mut model, Msg::PublishRequested, &services).await?;
            report(&model);
        }
        Commands::Edit { id, text, images } => {
            let id = PostId(id);
            let post = storage
                .get_post(id)
                .await
                .with_context(|| format!("Failed to load post {id}"))?
                .ok_or_else(|| anyhow!("Post {id} not found"))?;
            let services = services(&storage, &config, images);
            let mut model = ComposerModel::default();
            step(&mut model, Msg::EditRequested(post), &services).await?;
            compose(&mut model, text, &services).await?;
            step(&mut model, Msg::PublishRequested, &services).await?;
            report(&model);
        }
        Commands::List => {
            let services = services(&storage, &config, Vec::new());
            let mut model = ComposerModel::default();
            step(&mut model, Msg::RefreshFeed, &services).await?;
            if model.feed.is_empty() {
                println!("No posts yet.");
            }
            for post in &model.feed {
                println!("{}", summary_line(post));
            }
        }
        Commands::Delete { id } => {
            let services = services(&storage, &config, Vec::new());
            let mut model = ComposerModel::default();
            step(&mut model, Msg::DeleteRequested(PostId(id)), &services).await?;
            report(&model);
        }
        Commands::Render { output } => {
            let posts = storage.list_posts().await.context("Failed to load feed")?;
            let html = render_html(&posts);
            match output {
                Some(path) => {
                    tokio::fs::write(&path, html)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Rendered {} post(s) to {}", posts.len(), path.display());
                }
                None => println!("{html}"),
            }
        }
    }
    Ok(())
}

fn services(storage: &Arc<dyn Storage>, config: &Config, images: Vec<PathBuf>) -> Services {
    Services::new(
        Arc::clone(storage),
        config.publish_config(),
        Arc::new(FileMediaSource::new(images)),
    )
}

/// Apply `--text` and `--image` to the draft.
async fn compose(model: &mut ComposerModel, text: Option<String>, services: &Services) -> Result<()> {
    if let Some(text) = text {
        step(model, Msg::ContentChanged(text), services).await?;
    }
    step(model, Msg::RequestPickImages, services).await
}

/// Dispatch one message, turning a surfaced error into a failed invocation.
async fn step(model: &mut ComposerModel, msg: Msg, services: &Services) -> Result<()> {
    for cmd in mvu::dispatch(model, msg, services).await {
        if cmd == Command::OpenSettings {
            warn!("image files are not readable; check their permissions and try again");
        }
    }
    match model.error.take() {
        Some(err) => bail!(err),
        None => Ok(()),
    }
}

fn report(model: &ComposerModel) {
    if let Some(status) = &model.status {
        println!("{status}");
    }
}

fn summary_line(post: &Post) -> String {
    let edited = if post.updated_at.is_some() { " (edited)" } else { "" };
    let images = match post.images.len() {
        0 => String::new(),
        1 => " [1 image]".to_string(),
        n => format!(" [{n} images]"),
    };
    format!(
        "#{} {} {}{}: {}{}",
        post.id, post.author, post.created_at, edited, post.content, images
    )
}
