use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt as _, ResultExt as _};
use tracing::instrument;

use super::{App, NotFoundSnafu, Result, UnavailableSnafu};
use crate::database::Record;
use crate::model::{Channel, Timestamp, Video, VideoChanges, VideoListing, DEFAULT_CATEGORY};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UploadVideo {
    pub channel: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    pub video_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// Category filter value that lists every category.
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct VideoFilter {
    pub channel: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VideoView {
    pub id: String,
    pub channel: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub views: u64,
    pub real_views: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Video> for VideoView {
    fn from(video: Video) -> Self {
        Self {
            id: video.id.key(),
            channel: video.channel.key(),
            title: video.title,
            description: video.description,
            category: video.category,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            views: video.boosted_views,
            real_views: video.real_views,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VideoListingView {
    #[serde(flatten)]
    pub video: VideoView,
    pub channel_name: String,
    pub channel_avatar: Option<String>,
    pub subscribers: u64,
}

impl From<VideoListing> for VideoListingView {
    fn from(listing: VideoListing) -> Self {
        Self {
            video: listing.video.into(),
            channel_name: listing.channel_name,
            channel_avatar: listing.channel_avatar,
            subscribers: listing.subscribers,
        }
    }
}

#[instrument(skip(app))]
pub async fn create(
    State(app): State<App>, Json(request): Json<UploadVideo>,
) -> Result<Json<VideoView>> {
    let channel = Record::<Channel>::new(request.channel.as_str());

    Channel::get(&channel, &app.database)
        .await
        .context(UnavailableSnafu)?
        .context(NotFoundSnafu {
            kind: "channel",
            id: request.channel,
        })?;

    let category = request
        .category
        .filter(|category| !category.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let video = Video::new(
        channel,
        request.title,
        request.description,
        category,
        request.video_url,
        request.thumbnail_url,
        app.initial_views,
    )
    .create(&app.database)
    .await
    .context(UnavailableSnafu)?;

    Ok(Json(video.into()))
}

#[instrument(skip(app))]
pub async fn list(
    State(app): State<App>, Query(filter): Query<VideoFilter>,
) -> Result<Json<Vec<VideoListingView>>> {
    let channel = filter.channel.map(|id| Record::<Channel>::new(id));
    let category = filter.category.filter(|category| {
        !category.trim().is_empty() && !category.eq_ignore_ascii_case(ALL_CATEGORIES)
    });
    let search = filter
        .search
        .map(|search| search.trim().to_lowercase())
        .filter(|search| !search.is_empty());

    let videos = Video::list(
        channel.as_ref(),
        category.as_deref(),
        search,
        &app.database,
    )
    .await
    .context(UnavailableSnafu)?;

    Ok(Json(videos.into_iter().map(Into::into).collect()))
}

#[instrument(skip(app))]
pub async fn get(
    State(app): State<App>, Path(video_id): Path<String>,
) -> Result<Json<VideoView>> {
    let id = Record::<Video>::new(video_id.as_str());

    let video = Video::get(&id, &app.database)
        .await
        .context(UnavailableSnafu)?
        .context(NotFoundSnafu {
            kind: "video",
            id: video_id,
        })?;

    Ok(Json(video.into()))
}

#[instrument(skip(app))]
pub async fn update(
    State(app): State<App>, Path(video_id): Path<String>, Json(changes): Json<VideoChanges>,
) -> Result<Json<VideoView>> {
    let id = Record::<Video>::new(video_id.as_str());

    let video = Video::edit(&id, &changes, &app.database)
        .await
        .context(UnavailableSnafu)?
        .context(NotFoundSnafu {
            kind: "video",
            id: video_id,
        })?;

    Ok(Json(video.into()))
}
