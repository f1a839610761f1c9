use snafu::{IntoError as _, Location, Snafu};

use super::StoreError;
use crate::database::{DatabaseQueryError, Record};
use crate::model::Video;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EngagementError {
    /// The video does not exist, nothing was recorded.
    #[snafu(display("video `{video}` does not exist"))]
    NotFound {
        video: Record<Video>,
        #[snafu(implicit)]
        location: Location,
    },

    /// The video changed between read and write. Retry with fresh state.
    #[snafu(display("video `{video}` was updated concurrently, try again"))]
    Conflict {
        video: Record<Video>,
        #[snafu(implicit)]
        location: Location,
    },

    /// The backing store could not be used, nothing was recorded.
    #[snafu(display("the backing store is unavailable: {source}"))]
    StoreUnavailable {
        source: DatabaseQueryError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl EngagementError {
    pub(crate) fn from_store(error: StoreError, video: &Record<Video>) -> Self {
        match error {
            StoreError::StaleCounters { .. } => ConflictSnafu { video: video.clone() }.build(),
            StoreError::Backend { source, .. } => StoreUnavailableSnafu.into_error(source),
        }
    }
}
