use std::ops::Deref;

use serde::Deserialize;
use snafu::{Location, ResultExt, Snafu};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth;
use surrealdb::Surreal;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use url::Url;

/// Helper trait for executing arbitrary SurrealQL queries.
pub mod query;

/// Typed record identifiers.
pub mod record;

/// Macros for defining table methods.
pub mod macros;

pub use query::{Bindings, DatabaseQueryError, MalformedQuerySnafu, Sql};
pub use record::Record;

pub type Result<T, E = DatabaseError> = std::result::Result<T, E>;

const SETUP: &str = include_str!("../../schema.surrealql");

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DatabaseError {
    #[snafu(display("cannot connect to the database `{url}` at {location}: {source}"))]
    DatabaseConnection {
        url: Url,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot sign in to the database `{url}` at {location}: {source}"))]
    SignIn {
        url: Url,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot select namespace `{namespace}` and database `{database}`: {source}"))]
    SelectDatabase {
        namespace: String,
        database: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to apply the database schema at {location}: {source}"))]
    Schema {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Represents a table that a model is stored in.
pub trait Table {
    /// Returns the name of the table associated with the record.
    fn table() -> &'static str;
}

/// Represents a type that can be used to establish a connection to a database.
pub trait Connection {
    /// Establishes a connection to the database.
    fn connect(&self) -> impl std::future::Future<Output = Result<Database>> + Send;
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(rename = "surreal_url")]
    url: Url,
    #[serde(rename = "surreal_ns", default = "default_name")]
    namespace: String,
    #[serde(rename = "surreal_db", default = "default_name")]
    database: String,
    #[serde(flatten)]
    credentials: Option<DatabaseCredentials>,
}

fn default_name() -> String {
    "vidcast".to_string()
}

impl DatabaseConfig {
    /// An embedded in-memory datastore, every connection gets a fresh one.
    pub fn in_memory() -> Self {
        Self {
            url: Url::parse("mem://").expect("mem:// is a valid url"),
            namespace: default_name(),
            database: default_name(),
            credentials: None,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[derive(Debug, Deserialize, Clone)]
struct DatabaseCredentials {
    #[serde(rename = "surreal_user")]
    username: String,
    #[serde(rename = "surreal_pass")]
    password: String,
}

impl DatabaseCredentials {
    fn auth(&self) -> auth::Root<'_> {
        auth::Root {
            username: &self.username,
            password: &self.password,
        }
    }
}

impl Connection for DatabaseConfig {
    async fn connect(&self) -> Result<Database> {
        let database = surrealdb::engine::any::connect(self.url.as_str())
            .await
            .context(DatabaseConnectionSnafu {
                url: self.url.clone(),
            })?;

        if let Some(credentials) = &self.credentials {
            database
                .signin(credentials.auth())
                .await
                .context(SignInSnafu {
                    url: self.url.clone(),
                })?;
        }

        database
            .use_ns(&self.namespace)
            .use_db(&self.database)
            .await
            .context(SelectDatabaseSnafu {
                namespace: &self.namespace,
                database: &self.database,
            })?;

        database
            .query(SETUP)
            .await
            .and_then(|response| response.check())
            .context(SchemaSnafu)?;

        tracing::info!(url = %self.url, namespace = %self.namespace, database = %self.database, "connected to the database");

        Ok(Database::new(database))
    }
}

/// Connect to the database, retrying with an exponential backoff while it is not reachable yet.
pub async fn connect(config: &DatabaseConfig) -> Result<Database> {
    let strategy = ExponentialBackoff::from_millis(100)
        .max_delay(std::time::Duration::from_secs(5))
        .map(jitter)
        .take(5);

    Retry::spawn(strategy, || async {
        config.connect().await.inspect_err(|error| {
            tracing::warn!(%error, "could not connect to the database, retrying");
        })
    })
    .await
}

/// Represents a database wrapper.
///
/// Cheap to clone, every clone shares the same underlying connection.
#[derive(Debug, Clone)]
pub struct Database {
    database: Surreal<Any>,
}

impl Database {
    pub fn new(database: Surreal<Any>) -> Self {
        Self { database }
    }

    /// Connect to a fresh in-memory datastore with the schema applied.
    pub async fn memory() -> Result<Self> {
        DatabaseConfig::in_memory().connect().await
    }
}

impl Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.database
    }
}
