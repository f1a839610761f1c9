//! View accounting.
//!
//! A recorded view appends to the [ViewLedger], bumps the video's counters through the
//! [Counter] and grants any [RewardTier] the boosted count crossed to the owning channel.
//! All three effects are committed together by an [EngagementStore].
//!
//! Views on the same video are serialized twice: by an in-process lock per video, and by
//! the store refusing to commit counters that changed since they were read. The latter
//! covers several processes sharing one datastore and surfaces as [EngagementError::Conflict].

use std::num::NonZeroU64;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use snafu::OptionExt as _;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::instrument;

use crate::database::Record;
use crate::model::{UserId, Video};

pub use counter::*;
pub use error::*;
pub use ledger::*;
pub use reward::*;
pub use store::*;

mod counter;
mod error;
mod ledger;
mod reward;
mod store;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngagementConfig {
    /// Boosted views added for every recorded view.
    #[serde(default = "default_boost_increment")]
    pub boost_increment: NonZeroU64,
    /// Boosted views a freshly uploaded video starts with.
    #[serde(default = "default_initial_views")]
    pub initial_views: u64,
    #[serde(default)]
    pub reward_tiers: RewardSchedule,
}

fn default_boost_increment() -> NonZeroU64 {
    NonZeroU64::MIN.saturating_add(9)
}

fn default_initial_views() -> u64 {
    100
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            boost_increment: default_boost_increment(),
            initial_views: default_initial_views(),
            reward_tiers: RewardSchedule::default(),
        }
    }
}

/// A view as reported by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordView {
    pub video: Record<Video>,
    pub viewer: Option<UserId>,
    pub origin: String,
}

#[derive(Debug, Default)]
struct VideoLocks(DashMap<Record<Video>, Arc<Mutex<()>>>);

impl VideoLocks {
    async fn lock(&self, video: &Record<Video>) -> OwnedMutexGuard<()> {
        let lock = self.0.entry(video.clone()).or_default().clone();
        lock.lock_owned().await
    }
}

#[derive(Debug)]
pub struct Engagement<S> {
    store: S,
    ledger: ViewLedger,
    counter: Counter,
    rewards: RewardSchedule,
    locks: VideoLocks,
}

impl<S: EngagementStore> Engagement<S> {
    pub fn new(store: S, config: &EngagementConfig) -> Self {
        Self {
            store,
            ledger: ViewLedger,
            counter: Counter::new(config.boost_increment),
            rewards: config.reward_tiers.clone(),
            locks: VideoLocks::default(),
        }
    }

    pub fn ledger(&self) -> &ViewLedger {
        &self.ledger
    }

    /// Record one view and return the video's counters after it.
    ///
    /// Nothing is persisted unless the whole view is: the ledger entry, the new counters and
    /// the channel's rewards are written together. Calls are not idempotent, retrying a
    /// failed call that did commit counts the view twice.
    #[instrument(skip(self), fields(video.id = %view.video))]
    pub async fn record_view(&self, view: RecordView) -> Result<ViewCounts, EngagementError> {
        let RecordView {
            video,
            viewer,
            origin,
        } = view;

        let _guard = self.locks.lock(&video).await;

        let current = self
            .store
            .video(&video)
            .await
            .map_err(|error| EngagementError::from_store(error, &video))?
            .context(NotFoundSnafu {
                video: video.clone(),
            })?;

        let event = self.ledger.record(&current, viewer, origin);
        let before = current.counts();
        let after = self.counter.apply_view(before);
        let rewards = self.rewards.evaluate(before.boosted_views, after.boosted_views);

        let batch = ViewBatch {
            event,
            video: current.id.clone(),
            channel: current.channel.clone(),
            before,
            after,
            rewards,
        };

        self.store
            .commit(&batch)
            .await
            .map_err(|error| EngagementError::from_store(error, &video))?;

        for tier in &batch.rewards {
            tracing::info!(
                video.id = %batch.video,
                channel.id = %batch.channel,
                tier.views = tier.views,
                tier.reward = tier.reward,
                "video reached {} views, channel gains {} subscribers",
                tier.views,
                tier.reward
            );
        }

        tracing::debug!(event.id = %batch.event.id, ?after, "recorded view");

        Ok(after)
    }
}
