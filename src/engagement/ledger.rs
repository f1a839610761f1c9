use crate::database::{Database, DatabaseQueryError, Record};
use crate::model::{UserId, Video, ViewEvent};

/// Append-only log of view events.
///
/// Appends are staged against a video that is known to exist and written as part of the
/// same transaction as the counter update, see [EngagementStore::commit](super::EngagementStore::commit).
/// Repeat viewers are not deduplicated, every call produces a new event.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewLedger;

impl ViewLedger {
    pub fn record(&self, video: &Video, viewer: Option<UserId>, origin: String) -> ViewEvent {
        let event = ViewEvent::new(video.id.clone(), viewer, origin);
        tracing::debug!(event.id = %event.id, video.id = %video.id, "staged view event");
        event
    }

    /// Every event recorded for a video, newest first.
    pub async fn history(
        &self, video: &Record<Video>, db: &Database,
    ) -> Result<Vec<ViewEvent>, DatabaseQueryError> {
        ViewEvent::for_video(video, db).await
    }
}
