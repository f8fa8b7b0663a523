// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Hand a post to the platform share sheet once a usable network is confirmed.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::ShareError;
use crate::models::Post;

/// Connection type reported by the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkType {
    Wifi,
    Cellular,
    Ethernet,
    None,
    Unknown,
}

impl NetworkType {
    /// Only Wi-Fi and cellular count as online for sharing.
    pub fn can_share(self) -> bool {
        matches!(self, NetworkType::Wifi | NetworkType::Cellular)
    }
}

/// What the share sheet is asked to send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareRequest {
    pub message: String,
    pub url: Option<String>,
}

impl ShareRequest {
    pub fn for_post(post: &Post) -> Self {
        Self {
            message: post.content.clone(),
            url: post
                .images
                .iter()
                .find(|image| !image.is_data_uri())
                .map(|image| image.as_str().to_string()),
        }
    }
}

/// How the user left the share sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared { activity: Option<String> },
    Dismissed,
}

#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn network_type(&self) -> NetworkType;
}

#[async_trait]
pub trait ShareSheet: Send + Sync {
    async fn share(&self, request: ShareRequest) -> Result<ShareOutcome, ShareError>;
}

/// Share `post`, refusing early with [`ShareError::Offline`] when there is no Wi-Fi or cellular link.
pub async fn share_post<P, S>(probe: &P, sheet: &S, post: &Post) -> Result<ShareOutcome, ShareError>
where
    P: NetworkProbe + ?Sized,
    S: ShareSheet + ?Sized,
{
    let network = probe.network_type().await;
    if !network.can_share() {
        debug!(?network, post_id = %post.id, "share refused: offline");
        return Err(ShareError::Offline);
    }

    let outcome = sheet.share(ShareRequest::for_post(post)).await?;
    match &outcome {
        ShareOutcome::Shared {
            activity: Some(activity),
        } => info!(post_id = %post.id, %activity, "post shared"),
        ShareOutcome::Shared { activity: None } => info!(post_id = %post.id, "post shared"),
        ShareOutcome::Dismissed => debug!(post_id = %post.id, "share dismissed"),
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use time::OffsetDateTime;

    use super::*;
    use crate::models::{ImageRef, PostId};

    struct FixedNetwork(NetworkType);

    #[async_trait]
    impl NetworkProbe for FixedNetwork {
        async fn network_type(&self) -> NetworkType {
            self.0
        }
    }

    struct RecordingSheet {
        requests: Mutex<Vec<ShareRequest>>,
        result: Result<ShareOutcome, ShareError>,
    }

    impl RecordingSheet {
        fn returning(result: Result<ShareOutcome, ShareError>) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                result,
            }
        }
    }

    #[async_trait]
    impl ShareSheet for RecordingSheet {
        async fn share(&self, request: ShareRequest) -> Result<ShareOutcome, ShareError> {
            self.requests.lock().push(request);
            self.result.clone()
        }
    }

    fn post() -> Post {
        Post {
            id: PostId(9),
            content: "look".into(),
            images: vec![
                ImageRef::from("data:image/png;base64,AA"),
                ImageRef::from("https://example.com/p.png"),
            ],
            author: "me".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn offline_networks_never_reach_the_sheet() {
        for network in [NetworkType::None, NetworkType::Unknown, NetworkType::Ethernet] {
            let sheet = RecordingSheet::returning(Ok(ShareOutcome::Dismissed));
            let result = share_post(&FixedNetwork(network), &sheet, &post()).await;

            assert_eq!(result, Err(ShareError::Offline));
            assert!(sheet.requests.lock().is_empty());
        }
    }

    #[tokio::test]
    async fn online_share_forwards_text_and_first_linkable_image() {
        let sheet = RecordingSheet::returning(Ok(ShareOutcome::Shared {
            activity: Some("com.apple.UIKit.activity.Message".into()),
        }));

        let result = share_post(&FixedNetwork(NetworkType::Wifi), &sheet, &post()).await;

        assert!(matches!(result, Ok(ShareOutcome::Shared { activity: Some(_) })));
        let requests = sheet.requests.lock();
        assert_eq!(requests[0].message, "look");
        assert_eq!(requests[0].url.as_deref(), Some("https://example.com/p.png"));
    }

    #[tokio::test]
    async fn dismissal_and_sheet_errors_pass_through() {
        let dismissed = RecordingSheet::returning(Ok(ShareOutcome::Dismissed));
        assert_eq!(
            share_post(&FixedNetwork(NetworkType::Cellular), &dismissed, &post()).await,
            Ok(ShareOutcome::Dismissed)
        );

        let broken = RecordingSheet::returning(Err(ShareError::Failed("sheet crashed".into())));
        assert_eq!(
            share_post(&FixedNetwork(NetworkType::Cellular), &broken, &post()).await,
            Err(ShareError::Failed("sheet crashed".into()))
        );
    }
}
