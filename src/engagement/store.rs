use std::future::Future;

use snafu::{IntoError as _, Location, Snafu};
use surrealdb::error::{Api, Db};

use super::{RewardTier, ViewCounts};
use crate::database::{Database, DatabaseQueryError, MalformedQuerySnafu, Record, Sql as _};
use crate::model::{Channel, Video, ViewEvent};

/// Writes one view: conditional counter update, ledger append and channel rewards.
///
/// The counter update only matches while the stored counters still equal the ones the
/// caller read. Anything else throws, which rolls the whole transaction back.
const COMMIT_VIEW: &str = r#"
BEGIN TRANSACTION;
LET $updated = (UPDATE $video SET real_views = $real_after, boosted_views = $boosted_after WHERE real_views = $real_before AND boosted_views = $boosted_before RETURN AFTER);
IF array::len($updated) = 0 { THROW $stale_counters };
CREATE $event_id CONTENT $event RETURN NONE;
IF $reward > 0 { UPDATE $channel SET subscribers += $reward RETURN NONE };
COMMIT TRANSACTION;
"#;

/// Message thrown by [COMMIT_VIEW] when the counters moved on.
const STALE_COUNTERS: &str = "view counters changed since they were read";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    #[snafu(display("counters changed since they were read"))]
    StaleCounters {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("the backing store failed: {source}"))]
    Backend {
        source: DatabaseQueryError,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Everything one recorded view changes, persisted as a single unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewBatch {
    pub event: ViewEvent,
    pub video: Record<Video>,
    pub channel: Record<Channel>,
    pub before: ViewCounts,
    pub after: ViewCounts,
    pub rewards: Vec<RewardTier>,
}

impl ViewBatch {
    /// Subscribers gained by the channel in this batch.
    pub fn subscriber_gain(&self) -> u64 {
        self.rewards.iter().map(|tier| tier.reward).sum()
    }
}

/// The persistence the engagement core needs from the video and channel stores.
pub trait EngagementStore: Send + Sync {
    fn video(
        &self, id: &Record<Video>,
    ) -> impl Future<Output = Result<Option<Video>, StoreError>> + Send;

    /// Persist a batch atomically. Fails with [StoreError::StaleCounters] when the video's
    /// counters no longer equal `batch.before`, in which case nothing is written.
    fn commit(&self, batch: &ViewBatch) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl EngagementStore for Database {
    async fn video(&self, id: &Record<Video>) -> Result<Option<Video>, StoreError> {
        Video::get(id, self).await.map_err(|source| BackendSnafu.into_error(source))
    }

    #[tracing::instrument(skip(self))]
    async fn commit(&self, batch: &ViewBatch) -> Result<(), StoreError> {
        let mut response = self
            .sql(COMMIT_VIEW)
            .bind(("video", &batch.video))
            .bind(("real_before", batch.before.real_views))
            .bind(("boosted_before", batch.before.boosted_views))
            .bind(("real_after", batch.after.real_views))
            .bind(("boosted_after", batch.after.boosted_views))
            .bind(("event_id", &batch.event.id))
            .bind(("event", &batch.event))
            .bind(("channel", &batch.channel))
            .bind(("reward", batch.subscriber_gain()))
            .bind(("stale_counters", STALE_COUNTERS))
            .execute()
            .await
            .map_err(|source| BackendSnafu.into_error(source))?;

        let mut errors: Vec<_> = response.take_errors().into_iter().collect();
        errors.sort_by_key(|(index, _)| *index);

        // A failed transaction reports every statement as failed, only one carries the cause.
        if errors.iter().any(|(_, error)| is_stale(error)) {
            tracing::warn!(video.id = %batch.video, "view counters changed concurrently");
            return StaleCountersSnafu.fail();
        }

        match errors.into_iter().next() {
            None => Ok(()),
            Some((_, error)) => Err(BackendSnafu.into_error(MalformedQuerySnafu.into_error(error))),
        }
    }
}

/// Whether a statement failed because the video was written concurrently: either the
/// conditional update missed, or the datastore itself refused a conflicting commit.
fn is_stale(error: &surrealdb::Error) -> bool {
    match error {
        surrealdb::Error::Db(Db::Thrown(message)) => message == STALE_COUNTERS,
        surrealdb::Error::Db(Db::TxConditionNotMet) => true,
        surrealdb::Error::Db(Db::Tx(message)) => message.to_lowercase().contains("conflict"),
        // Remote servers only send the rendered error text.
        surrealdb::Error::Api(Api::Query(message)) => message.contains(STALE_COUNTERS),
        _ => false,
    }
}
