use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt as _, ResultExt as _};
use tracing::instrument;

use super::{App, NotFoundSnafu, Result, UnavailableSnafu};
use crate::database::Record;
use crate::engagement::{RecordView, ViewCounts};
use crate::model::{Timestamp, UserId, Video, ViewEvent};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ViewRequest {
    pub video_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Address as seen by an upstream proxy. The peer address is used when absent.
    #[serde(default)]
    pub origin_address: Option<String>,
}

/// Counters after a view. `views` is the public, boosted count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ViewResponse {
    pub views: u64,
    pub real_views: u64,
}

impl From<ViewCounts> for ViewResponse {
    fn from(counts: ViewCounts) -> Self {
        Self {
            views: counts.boosted_views,
            real_views: counts.real_views,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ViewEventView {
    pub id: String,
    pub video_id: String,
    pub user_id: Option<UserId>,
    pub origin_address: String,
    pub created_at: Timestamp,
}

impl From<ViewEvent> for ViewEventView {
    fn from(event: ViewEvent) -> Self {
        Self {
            id: event.id.key(),
            video_id: event.video.key(),
            user_id: event.viewer,
            origin_address: event.origin,
            created_at: event.created_at,
        }
    }
}

#[instrument(skip(app))]
pub async fn record(
    State(app): State<App>, ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(request): Json<ViewRequest>,
) -> Result<Json<ViewResponse>> {
    let origin = request
        .origin_address
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .unwrap_or_else(|| peer.ip().to_string());

    let view = RecordView {
        video: Record::new(request.video_id),
        viewer: request.user_id.map(UserId::new),
        origin,
    };

    let counts = app.record_view(view).await?;
    Ok(Json(counts.into()))
}

#[instrument(skip(app))]
pub async fn history(
    State(app): State<App>, Path(video_id): Path<String>,
) -> Result<Json<Vec<ViewEventView>>> {
    let video = Record::<Video>::new(video_id.as_str());

    Video::get(&video, &app.database)
        .await
        .context(UnavailableSnafu)?
        .context(NotFoundSnafu {
            kind: "video",
            id: video_id,
        })?;

    let events = app
        .ledger()
        .history(&video, &app.database)
        .await
        .context(UnavailableSnafu)?;

    Ok(Json(events.into_iter().map(Into::into).collect()))
}
