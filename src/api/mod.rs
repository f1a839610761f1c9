use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod error;
mod state;

pub mod channels;
pub mod videos;
pub mod views;

pub use error::*;
pub use state::*;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

pub fn create_router(app: App) -> Router {
    Router::new()
        .route("/channels", post(channels::create))
        .route("/channels/:id", get(channels::profile).put(channels::update))
        .route("/videos", get(videos::list).post(videos::create))
        .route("/videos/:id", get(videos::get).put(videos::update))
        .route("/videos/:id/views", get(views::history))
        .route("/views", post(views::record))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app)
}
