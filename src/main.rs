use std::net::SocketAddr;

use dotenvy::dotenv;
use snafu::ResultExt as _;

use vidcast::error::{ApplicationError, BindAddressSnafu, ConnectDatabaseSnafu, WebServerSnafu};
use vidcast::{api, config, database, logger};

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = config::load()?;

    let _guard = logger::init(&config.server)?;

    let database = database::connect(&config.database)
        .await
        .context(ConnectDatabaseSnafu)?;

    let app = api::create_app(database, &config.engagement);
    let router = api::create_router(app);

    let address = config.server.host;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .context(BindAddressSnafu { address })?;

    tracing::info!(%address, "listening");

    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown())
        .await
        .context(WebServerSnafu)
}

async fn shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "could not listen for the shutdown signal");
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down");
}
