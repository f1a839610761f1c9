use std::net::SocketAddr;

use snafu::{Location, Snafu};

use crate::database::DatabaseError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApplicationError {
    /// could not parse the configuration from the environment
    #[snafu(display("invalid {section} configuration: {source}"))]
    ConfigLoad {
        section: &'static str,
        source: envy::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// could not connect to the database
    #[snafu(display("could not connect to the database: {source}"))]
    ConnectDatabase {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not serve the application
    WebServer {
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not bind to the given address, check if it's already in use
    BindAddress {
        address: SocketAddr,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not initialize the logger
    InitializeLogger {
        source: tracing::subscriber::SetGlobalDefaultError,
        #[snafu(implicit)]
        location: Location,
    },
}
