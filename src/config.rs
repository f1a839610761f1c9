use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use snafu::ResultExt as _;

use crate::database::DatabaseConfig;
use crate::engagement::EngagementConfig;
use crate::error::{ApplicationError, ConfigLoadSnafu};

/// Everything the process reads from its environment, loaded once at start up.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub engagement: EngagementConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(rename = "host_address", default = "default_host")]
    pub host: SocketAddr,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_host() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

/// Each section is read on its own so a section using `#[serde(flatten)]` cannot affect how
/// numbers in another one are parsed.
pub fn load() -> Result<Config, ApplicationError> {
    from_iter(std::env::vars().collect::<Vec<_>>())
}

pub fn from_iter<I>(vars: I) -> Result<Config, ApplicationError>
where
    I: IntoIterator<Item = (String, String)>,
    I::IntoIter: Clone,
{
    let vars = vars.into_iter();

    let server = envy::from_iter(vars.clone()).context(ConfigLoadSnafu { section: "server" })?;
    let database =
        envy::from_iter(vars.clone()).context(ConfigLoadSnafu { section: "database" })?;
    let engagement = envy::from_iter(vars).context(ConfigLoadSnafu {
        section: "engagement",
    })?;

    Ok(Config {
        server,
        database,
        engagement,
    })
}
