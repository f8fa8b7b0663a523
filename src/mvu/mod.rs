// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Composer Model-View-Update kernel wiring the draft, feed, messages, and commands.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use crate::draft_store::DraftStore;
use crate::error::{DeleteError, MediaError, PublishError, StorageError};
use crate::logic::feed::Feed;
use crate::logic::publish::{PublishConfig, PublishService};
use crate::media::{MediaOutcome, MediaSource};
use crate::models::{Draft, Post, PostId};
use crate::store::Storage;

/// Which screen the host should show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Route {
    #[default]
    Composer,
    Feed,
}

/// Top-level composer state.
#[derive(Default)]
pub struct ComposerModel {
    /// Shared draft; views subscribe to it directly.
    pub draft: DraftStore,
    /// Post being edited, `None` while composing a new one.
    pub editing: Option<PostId>,
    /// Last loaded feed, newest first.
    pub feed: Vec<Post>,
    pub route: Route,
    /// True between `PublishRequested` and `PublishCompleted`.
    pub publishing: bool,
    /// Latest status message to display.
    pub status: Option<String>,
    /// Latest error message to display in modal.
    pub error: Option<String>,
}

/// Messages routed through [`update`].
#[derive(Debug)]
pub enum Msg {
    ContentChanged(String),
    RequestPickImages,
    MediaPicked(Result<MediaOutcome, MediaError>),
    RemoveImage(usize),
    /// Leave the composer, discarding the draft.
    Cancel,
    EditRequested(Post),
    PublishRequested,
    /// Result of a publish attempt. `editing` is the post the attempt updated, `None` for a new post.
    PublishCompleted {
        editing: Option<PostId>,
        result: Result<PostId, PublishError>,
    },
    DeleteRequested(PostId),
    DeleteCompleted(PostId, Result<(), DeleteError>),
    RefreshFeed,
    FeedLoaded(Result<Vec<Post>, StorageError>),
    DismissError,
}

/// Side-effects executed outside of [`update`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    PickImages,
    Publish(Draft),
    Update(PostId, Draft),
    Delete(PostId),
    LoadFeed,
    /// Send the user to the platform permission settings. Only the host can do this.
    OpenSettings,
}

/// Collaborators needed to execute commands.
pub struct Services {
    pub publisher: Arc<PublishService<dyn Storage>>,
    pub feed: Feed<dyn Storage>,
    pub media: Arc<dyn MediaSource>,
}

impl Services {
    pub fn new(
        storage: Arc<dyn Storage>,
        config: PublishConfig,
        media: Arc<dyn MediaSource>,
    ) -> Self {
        Self {
            publisher: Arc::new(PublishService::new(Arc::clone(&storage), config)),
            feed: Feed::new(storage),
            media,
        }
    }
}

/// Update the composer model and enqueue commands.
pub fn update(model: &mut ComposerModel, msg: Msg, cmds: &mut Vec<Command>) {
    match msg {
        Msg::ContentChanged(text) => model.draft.set_content(text),
        Msg::RequestPickImages => cmds.push(Command::PickImages),
        Msg::MediaPicked(result) => match result {
            Ok(MediaOutcome::Picked(images)) => {
                let count = images.len();
                model.draft.add_images(images);
                surface_event(model, format!("Added {count} image(s)."), false);
            }
            Ok(MediaOutcome::Cancelled) => {}
            Ok(MediaOutcome::PermissionDenied) => {
                surface_event(
                    model,
                    "Photo library access was denied. Allow access in Settings to attach images."
                        .to_string(),
                    true,
                );
                cmds.push(Command::OpenSettings);
            }
            Err(err) => surface_event(model, format!("Failed to attach images:\n\n{err}"), true),
        },
        Msg::RemoveImage(index) => model.draft.remove_image(index),
        Msg::Cancel => {
            model.draft.reset();
            model.editing = None;
            model.route = Route::Feed;
        }
        Msg::EditRequested(post) => {
            model.draft.load(Draft::from_post(&post));
            model.editing = Some(post.id);
            model.route = Route::Composer;
        }
        Msg::PublishRequested => {
            if model.publishing {
                return;
            }
            model.publishing = true;
            let draft = model.draft.snapshot();
            cmds.push(match model.editing {
                Some(id) => Command::Update(id, draft),
                None => Command::Publish(draft),
            });
        }
        Msg::PublishCompleted { editing, result } => {
            model.publishing = false;
            match result {
                Ok(id) => {
                    let message = match editing {
                        Some(_) => format!("Post {id} updated."),
                        None => "Post published.".to_string(),
                    };
                    // The composer may have moved to another post while this attempt was pending.
                    if model.editing == editing {
                        model.editing = None;
                        model.draft.reset();
                        model.route = Route::Feed;
                    }
                    surface_event(model, message, false);
                    cmds.push(Command::LoadFeed);
                }
                Err(err) => surface_event(model, format!("Could not publish post: {err}"), true),
            }
        }
        Msg::DeleteRequested(id) => cmds.push(Command::Delete(id)),
        Msg::DeleteCompleted(id, result) => match result {
            Ok(()) => {
                if model.editing == Some(id) {
                    model.editing = None;
                    model.draft.reset();
                }
                surface_event(model, format!("Post {id} deleted."), false);
                cmds.push(Command::LoadFeed);
            }
            Err(err) => surface_event(model, format!("Failed to delete post {id}:\n\n{err}"), true),
        },
        Msg::RefreshFeed => cmds.push(Command::LoadFeed),
        Msg::FeedLoaded(result) => match result {
            Ok(posts) => model.feed = posts,
            Err(err) => surface_event(model, format!("Failed to load feed:\n\n{err}"), true),
        },
        Msg::DismissError => model.error = None,
    }
}

/// Execute a command and return the resulting message, if any.
pub async fn run_command(cmd: Command, services: &Services) -> Option<Msg> {
    match cmd {
        Command::PickImages => Some(Msg::MediaPicked(services.media.pick().await)),
        Command::Publish(draft) => Some(Msg::PublishCompleted {
            editing: None,
            result: services.publisher.publish(&draft).await,
        }),
        Command::Update(id, draft) => Some(Msg::PublishCompleted {
            editing: Some(id),
            result: services.publisher.update(id, &draft).await.map(|()| id),
        }),
        Command::Delete(id) => Some(Msg::DeleteCompleted(
            id,
            services.publisher.delete_post(id).await,
        )),
        Command::LoadFeed => Some(Msg::FeedLoaded(services.feed.load().await)),
        Command::OpenSettings => {
            debug!("open-settings request left to the host");
            None
        }
    }
}

/// Run `msg` through [`update`] and execute follow-up commands until the queue drains.
///
/// Commands only the host can perform are returned instead of executed.
pub async fn dispatch(model: &mut ComposerModel, msg: Msg, services: &Services) -> Vec<Command> {
    let mut host = Vec::new();
    let mut queue = VecDeque::from([msg]);
    while let Some(msg) = queue.pop_front() {
        let mut cmds = Vec::new();
        update(model, msg, &mut cmds);
        for cmd in cmds {
            if cmd == Command::OpenSettings {
                host.push(cmd);
                continue;
            }
            if let Some(next) = run_command(cmd, services).await {
                queue.push_back(next);
            }
        }
    }
    host
}

/// Update status/error fields consistently for user feedback.
fn surface_event(model: &mut ComposerModel, message: String, is_error: bool) {
    if is_error {
        model.error = Some(message.clone());
    }
    model.status = Some(message);
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::models::{ImageRef, NewPost};
    use crate::store::MemoryStorage;

    struct FixedMedia(MediaOutcome);

    #[async_trait]
    impl MediaSource for FixedMedia {
        async fn pick(&self) -> Result<MediaOutcome, MediaError> {
            Ok(self.0.clone())
        }
    }

    struct RejectingStorage;

    #[async_trait]
    impl Storage for RejectingStorage {
        async fn create_post(&self, _: NewPost) -> Result<PostId, StorageError> {
            Err(StorageError::rejected("disk full"))
        }
        async fn update_post(
            &self,
            _: PostId,
            _: String,
            _: Vec<ImageRef>,
        ) -> Result<(), StorageError> {
            Err(StorageError::rejected("disk full"))
        }
        async fn delete_post(&self, id: PostId) -> Result<(), StorageError> {
            Err(StorageError::NotFound(id))
        }
        async fn get_post(&self, _: PostId) -> Result<Option<Post>, StorageError> {
            Ok(None)
        }
        async fn list_posts(&self) -> Result<Vec<Post>, StorageError> {
            Ok(Vec::new())
        }
    }

    fn services_with(storage: Arc<dyn Storage>, media: MediaOutcome) -> Services {
        Services::new(storage, PublishConfig::default(), Arc::new(FixedMedia(media)))
    }

    fn memory_services() -> Services {
        services_with(Arc::new(MemoryStorage::new()), MediaOutcome::Cancelled)
    }

    #[test]
    fn publish_request_enqueues_publish_with_snapshot() {
        let mut model = ComposerModel::default();
        model.draft.set_content("hi");

        let mut cmds = Vec::new();
        update(&mut model, Msg::PublishRequested, &mut cmds);

        assert!(model.publishing);
        assert_eq!(cmds, vec![Command::Publish(Draft::new("hi", Vec::new()))]);
    }

    #[test]
    fn publish_request_while_publishing_is_ignored() {
        let mut model = ComposerModel::default();
        let mut cmds = Vec::new();

        update(&mut model, Msg::PublishRequested, &mut cmds);
        update(&mut model, Msg::PublishRequested, &mut cmds);

        assert_eq!(cmds.len(), 1);
    }

    #[test]
    fn permission_denied_surfaces_error_and_opens_settings() {
        let mut model = ComposerModel::default();
        let mut cmds = Vec::new();

        update(
            &mut model,
            Msg::MediaPicked(Ok(MediaOutcome::PermissionDenied)),
            &mut cmds,
        );

        assert!(model.error.is_some());
        assert_eq!(cmds, vec![Command::OpenSettings]);
        assert_eq!(model.draft.image_count(), 0);
    }

    #[test]
    fn cancelled_pick_changes_nothing() {
        let mut model = ComposerModel::default();
        let mut cmds = Vec::new();

        update(&mut model, Msg::MediaPicked(Ok(MediaOutcome::Cancelled)), &mut cmds);

        assert!(cmds.is_empty());
        assert!(model.status.is_none());
        assert!(model.error.is_none());
    }

    #[test]
    fn edit_then_cancel_restores_empty_composer_state() {
        let mut model = ComposerModel::default();
        let post = Post {
            id: PostId(3),
            content: "old".into(),
            images: vec![ImageRef::from("a")],
            author: "me".into(),
            created_at: time::OffsetDateTime::UNIX_EPOCH,
            updated_at: None,
        };
        let mut cmds = Vec::new();

        update(&mut model, Msg::EditRequested(post), &mut cmds);
        assert_eq!(model.editing, Some(PostId(3)));
        assert_eq!(model.draft.content(), "old");

        update(&mut model, Msg::PublishRequested, &mut cmds);
        assert!(matches!(cmds.as_slice(), [Command::Update(PostId(3), _)]));

        update(&mut model, Msg::Cancel, &mut cmds);
        assert_eq!(model.editing, None);
        assert_eq!(model.draft.snapshot(), Draft::default());
        assert_eq!(model.route, Route::Feed);
    }

    fn post_for_edit(id: u64, content: &str) -> Post {
        Post {
            id: PostId(id),
            content: content.into(),
            images: Vec::new(),
            author: "me".into(),
            created_at: time::OffsetDateTime::UNIX_EPOCH,
            updated_at: None,
        }
    }

    #[test]
    fn finished_create_does_not_end_an_edit_started_meanwhile() {
        let mut model = ComposerModel::default();
        model.draft.set_content("brand new");
        let mut cmds = Vec::new();

        update(&mut model, Msg::PublishRequested, &mut cmds);
        assert!(matches!(cmds.as_slice(), [Command::Publish(_)]));
        update(&mut model, Msg::EditRequested(post_for_edit(5, "old text")), &mut cmds);
        cmds.clear();
        update(
            &mut model,
            Msg::PublishCompleted {
                editing: None,
                result: Ok(PostId(6)),
            },
            &mut cmds,
        );

        assert!(!model.publishing);
        assert_eq!(model.status.as_deref(), Some("Post published."));
        assert_eq!(model.editing, Some(PostId(5)));
        assert_eq!(model.draft.content(), "old text");
        assert_eq!(model.route, Route::Composer);
        assert_eq!(cmds, vec![Command::LoadFeed]);
    }

    #[test]
    fn finished_update_after_cancel_leaves_fresh_draft_alone() {
        let mut model = ComposerModel::default();
        let mut cmds = Vec::new();

        update(&mut model, Msg::EditRequested(post_for_edit(5, "old text")), &mut cmds);
        update(&mut model, Msg::PublishRequested, &mut cmds);
        update(&mut model, Msg::Cancel, &mut cmds);
        update(&mut model, Msg::ContentChanged("next idea".into()), &mut cmds);
        update(
            &mut model,
            Msg::PublishCompleted {
                editing: Some(PostId(5)),
                result: Ok(PostId(5)),
            },
            &mut cmds,
        );

        assert_eq!(model.status.as_deref(), Some("Post 5 updated."));
        assert_eq!(model.editing, None);
        assert_eq!(model.draft.content(), "next idea");
    }

    #[tokio::test]
    async fn successful_publish_resets_draft_and_reloads_feed() {
        let services = memory_services();
        let mut model = ComposerModel::default();
        model.draft.set_content("  <b>Hello</b>  ");

        let host = dispatch(&mut model, Msg::PublishRequested, &services).await;

        assert!(host.is_empty());
        assert!(!model.publishing);
        assert_eq!(model.draft.snapshot(), Draft::default());
        assert_eq!(model.route, Route::Feed);
        assert_eq!(model.feed.len(), 1);
        assert_eq!(model.feed[0].content, "Hello");
        assert_eq!(model.status.as_deref(), Some("Post published."));
    }

    #[tokio::test]
    async fn empty_draft_surfaces_error_and_stays_in_composer() {
        let services = memory_services();
        let mut model = ComposerModel::default();

        dispatch(&mut model, Msg::PublishRequested, &services).await;

        assert!(!model.publishing);
        assert_eq!(model.route, Route::Composer);
        assert!(model.error.as_deref().is_some_and(|e| e.contains("Nothing to post")));
        assert!(model.feed.is_empty());
    }

    #[tokio::test]
    async fn storage_failure_keeps_draft_for_retry() {
        let services = services_with(Arc::new(RejectingStorage), MediaOutcome::Cancelled);
        let mut model = ComposerModel::default();
        model.draft.set_content("Hello");
        model.draft.add_image(ImageRef::from("a"));

        dispatch(&mut model, Msg::PublishRequested, &services).await;

        assert_eq!(model.draft.content(), "Hello");
        assert_eq!(model.draft.image_count(), 1);
        assert!(model.error.as_deref().is_some_and(|e| e.contains("disk full")));
    }

    #[tokio::test]
    async fn picked_images_are_appended_to_draft() {
        let picked = vec![ImageRef::from("data:image/png;base64,AA"), ImageRef::from("b")];
        let services = services_with(
            Arc::new(MemoryStorage::new()),
            MediaOutcome::Picked(picked.clone()),
        );
        let mut model = ComposerModel::default();
        model.draft.add_image(ImageRef::from("a"));

        dispatch(&mut model, Msg::RequestPickImages, &services).await;

        let mut expected = vec![ImageRef::from("a")];
        expected.extend(picked);
        assert_eq!(model.draft.images(), expected);
    }

    #[tokio::test]
    async fn permission_denied_is_returned_to_host() {
        let services = services_with(
            Arc::new(MemoryStorage::new()),
            MediaOutcome::PermissionDenied,
        );
        let mut model = ComposerModel::default();

        let host = dispatch(&mut model, Msg::RequestPickImages, &services).await;

        assert_eq!(host, vec![Command::OpenSettings]);
    }

    #[tokio::test]
    async fn delete_refreshes_feed_and_reports_missing_posts() {
        let services = memory_services();
        let mut model = ComposerModel::default();
        model.draft.set_content("first");
        dispatch(&mut model, Msg::PublishRequested, &services).await;
        let id = model.feed[0].id;

        dispatch(&mut model, Msg::DeleteRequested(id), &services).await;
        assert!(model.feed.is_empty());
        assert_eq!(model.status, Some(format!("Post {id} deleted.")));

        dispatch(&mut model, Msg::DeleteRequested(PostId(99)), &services).await;
        assert!(model.error.as_deref().is_some_and(|e| e.contains("not found")));
    }

    #[tokio::test]
    async fn edit_flow_updates_existing_post() {
        let services = memory_services();
        let mut model = ComposerModel::default();
        model.draft.set_content("draft one");
        dispatch(&mut model, Msg::PublishRequested, &services).await;
        let post = model.feed[0].clone();

        dispatch(&mut model, Msg::EditRequested(post.clone()), &services).await;
        dispatch(&mut model, Msg::ContentChanged("draft two".into()), &services).await;
        dispatch(&mut model, Msg::PublishRequested, &services).await;

        assert_eq!(model.feed.len(), 1);
        assert_eq!(model.feed[0].id, post.id);
        assert_eq!(model.feed[0].content, "draft two");
        assert!(model.feed[0].updated_at.is_some());
        assert_eq!(model.editing, None);
    }

    #[test]
    fn dismiss_error_clears_only_error() {
        let mut model = ComposerModel::default();
        model.error = Some("boom".into());
        model.status = Some("boom".into());
        let mut cmds = Vec::new();

        update(&mut model, Msg::DismissError, &mut cmds);

        assert!(model.error.is_none());
        assert_eq!(model.status.as_deref(), Some("boom"));
    }
}
