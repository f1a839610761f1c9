use super::*;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, new)]
pub struct Channel {
    #[new(default)]
    pub id: Record<Channel>,
    #[new(value = "now()")]
    pub created_at: Timestamp,

    pub owner: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    #[new(default)]
    pub subscribers: u64,
}

define_table!("channels": Channel);

define_relation! {
    Channel > get(id: &Record<Channel>) > Option<Channel>
        where "SELECT * FROM $id"
}

define_relation! {
    Channel > totals(channel: &Record<Channel>) > Option<ChannelTotals>
        where "SELECT count() AS video_count, math::sum(boosted_views) AS total_views FROM videos WHERE channel = $channel GROUP ALL"
}

/// Profile edits. The avatar is only replaced when a new one is given.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChannelChanges {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Aggregates over every video a channel uploaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChannelTotals {
    pub video_count: u64,
    pub total_views: u64,
}

impl Channel {
    pub async fn create(&self, db: &Database) -> Result<Channel, DatabaseQueryError> {
        tracing::info!(channel.id = %self.id, channel.owner = %self.owner, "creating channel");
        db.sql("CREATE $id CONTENT $channel")
            .bind(("id", &self.id))
            .bind(("channel", self))
            .fetch_one()
            .await
    }

    /// Apply profile edits to an existing channel. Returns `None` when the channel does not exist.
    #[tracing::instrument(skip(db))]
    pub async fn edit(
        id: &Record<Channel>, changes: &ChannelChanges, db: &Database,
    ) -> Result<Option<Channel>, DatabaseQueryError> {
        if Channel::get(id, db).await?.is_none() {
            return Ok(None);
        }

        db.sql("UPDATE $id MERGE $changes RETURN AFTER")
            .bind(("id", id))
            .bind(("changes", changes))
            .fetch_first()
            .await
    }
}
