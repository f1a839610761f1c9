use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use snafu::{Location, Snafu};

use crate::database::DatabaseQueryError;
use crate::engagement::EngagementError;

#[derive(Debug, Snafu, Serialize)]
#[snafu(visibility(pub(crate)))]
#[serde(tag = "error", content = "data")]
pub enum ApiError {
    #[snafu(display("{kind} `{id}` does not exist"))]
    NotFound { kind: &'static str, id: String },

    #[snafu(display("video `{video}` was updated concurrently, try again"))]
    Conflict { video: String },

    #[snafu(display("the database is unavailable"))]
    Unavailable {
        #[serde(skip)]
        source: DatabaseQueryError,

        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<EngagementError> for ApiError {
    fn from(error: EngagementError) -> Self {
        match error {
            EngagementError::NotFound { video, .. } => ApiError::NotFound {
                kind: "video",
                id: video.key(),
            },
            EngagementError::Conflict { video, .. } => ApiError::Conflict { video: video.key() },
            EngagementError::StoreUnavailable { source, location } => {
                ApiError::Unavailable { source, location }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(flatten)]
    data: ApiError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed: {}", self);
        }

        let content = ErrorResponse {
            message: self.to_string(),
            data: self,
        };

        (status, Json(content)).into_response()
    }
}
