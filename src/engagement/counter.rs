use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

/// The pair of counters every video carries.
///
/// `boosted_views` is what the public sees, `real_views` is the number of events in the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ViewCounts {
    pub real_views: u64,
    pub boosted_views: u64,
}

/// Applies the fixed per-view increments to a video's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    boost_increment: NonZeroU64,
}

impl Counter {
    pub fn new(boost_increment: NonZeroU64) -> Self {
        Self { boost_increment }
    }

    pub fn boost_increment(&self) -> u64 {
        self.boost_increment.get()
    }

    /// Counters after one more recorded view. Saturates instead of wrapping.
    pub fn apply_view(&self, counts: ViewCounts) -> ViewCounts {
        ViewCounts {
            real_views: counts.real_views.saturating_add(1),
            boosted_views: counts.boosted_views.saturating_add(self.boost_increment()),
        }
    }
}
