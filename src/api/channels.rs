use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt as _, ResultExt as _};
use tracing::instrument;

use super::{App, NotFoundSnafu, Result, UnavailableSnafu};
use crate::database::Record;
use crate::model::{Channel, ChannelChanges, ChannelTotals, Timestamp, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CreateChannel {
    pub owner: UserId,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChannelView {
    pub id: String,
    pub owner: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub subscribers: u64,
    pub created_at: Timestamp,
}

impl From<Channel> for ChannelView {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id.key(),
            owner: channel.owner,
            name: channel.name,
            avatar_url: channel.avatar_url,
            subscribers: channel.subscribers,
            created_at: channel.created_at,
        }
    }
}

/// A channel together with aggregates over its uploads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChannelProfile {
    #[serde(flatten)]
    pub channel: ChannelView,
    pub video_count: u64,
    pub total_views: u64,
}

#[instrument(skip(app))]
pub async fn create(
    State(app): State<App>, Json(request): Json<CreateChannel>,
) -> Result<Json<ChannelView>> {
    let channel = Channel::new(request.owner, request.name, request.avatar_url)
        .create(&app.database)
        .await
        .context(UnavailableSnafu)?;

    Ok(Json(channel.into()))
}

#[instrument(skip(app))]
pub async fn profile(
    State(app): State<App>, Path(channel_id): Path<String>,
) -> Result<Json<ChannelProfile>> {
    let id = Record::<Channel>::new(channel_id.as_str());

    let channel = Channel::get(&id, &app.database)
        .await
        .context(UnavailableSnafu)?
        .context(NotFoundSnafu {
            kind: "channel",
            id: channel_id,
        })?;

    let ChannelTotals {
        video_count,
        total_views,
    } = Channel::totals(&id, &app.database)
        .await
        .context(UnavailableSnafu)?
        .unwrap_or_default();

    Ok(Json(ChannelProfile {
        channel: channel.into(),
        video_count,
        total_views,
    }))
}

#[instrument(skip(app))]
pub async fn update(
    State(app): State<App>, Path(channel_id): Path<String>, Json(changes): Json<ChannelChanges>,
) -> Result<Json<ChannelView>> {
    let id = Record::<Channel>::new(channel_id.as_str());

    let channel = Channel::edit(&id, &changes, &app.database)
        .await
        .context(UnavailableSnafu)?
        .context(NotFoundSnafu {
            kind: "channel",
            id: channel_id,
        })?;

    Ok(Json(channel.into()))
}
