use crate::engagement::ViewCounts;

use super::*;

pub const DEFAULT_CATEGORY: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, new)]
pub struct Video {
    #[new(default)]
    pub id: Record<Video>,
    #[new(value = "now()")]
    pub created_at: Timestamp,
    #[new(value = "now()")]
    pub updated_at: Timestamp,

    pub channel: Record<Channel>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,

    #[new(default)]
    pub real_views: u64,
    pub boosted_views: u64,
}

define_table!("videos": Video);

define_relation! {
    Video > get(id: &Record<Video>) > Option<Video>
        where "SELECT * FROM $id"
}

define_relation! {
    Video > list(channel: Option<&Record<Channel>>, category: Option<&str>, search: Option<String>) > Vec<VideoListing>
        where "SELECT *, channel.name AS channel_name, channel.avatar_url AS channel_avatar, channel.subscribers AS subscribers
               FROM videos
               WHERE ($channel = NONE OR channel = $channel)
                 AND ($category = NONE OR category = $category)
                 AND ($search = NONE
                      OR string::lowercase(title) CONTAINS $search
                      OR string::lowercase(description) CONTAINS $search
                      OR string::lowercase(channel.name) CONTAINS $search)
               ORDER BY created_at DESC"
}

impl Video {
    pub fn counts(&self) -> ViewCounts {
        ViewCounts {
            real_views: self.real_views,
            boosted_views: self.boosted_views,
        }
    }

    pub async fn create(&self, db: &Database) -> Result<Video, DatabaseQueryError> {
        tracing::info!(video.id = %self.id, video.channel = %self.channel, "creating video");
        db.sql("CREATE $id CONTENT $video")
            .bind(("id", &self.id))
            .bind(("video", self))
            .fetch_one()
            .await
    }

    /// Replace the editable metadata of a video. Counters are never touched here.
    #[tracing::instrument(skip(db))]
    pub async fn edit(
        id: &Record<Video>, changes: &VideoChanges, db: &Database,
    ) -> Result<Option<Video>, DatabaseQueryError> {
        if Video::get(id, db).await?.is_none() {
            return Ok(None);
        }

        db.sql(
            "UPDATE $id SET title = $title, description = $description, category = $category, updated_at = $updated_at RETURN AFTER",
        )
        .bind(("id", id))
        .bind(("title", &changes.title))
        .bind(("description", &changes.description))
        .bind(("category", &changes.category))
        .bind(("updated_at", now()))
        .fetch_first()
        .await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VideoChanges {
    pub title: String,
    pub description: String,
    pub category: String,
}

/// A video joined with the public details of the channel that uploaded it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VideoListing {
    #[serde(flatten)]
    pub video: Video,
    pub channel_name: String,
    pub channel_avatar: Option<String>,
    pub subscribers: u64,
}
