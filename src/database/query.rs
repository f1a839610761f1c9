use serde::de::DeserializeOwned;
use snafu::{Location, OptionExt as _, ResultExt as _, Snafu};
use surrealdb::opt::QueryResult;

use super::Database;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DatabaseQueryError {
    #[snafu(display("failed to query the database at {location}: {source}"))]
    MalformedQuery {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to deserialize the database response at {location}: {source}"))]
    Deserialize {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("expected a result from the database but got none at {location}"))]
    NoResults {
        #[snafu(implicit)]
        location: Location,
    },
}

/// An extension trait that allows you to execute raw SQL queries. Parameters can be bound using the [Bindings::bind] method which takes any serializable data structure.
///
/// # Example
/// ```ignore
/// let uploads: Vec<Video> = database.sql("SELECT * FROM videos WHERE channel = $channel")
///     .bind(("channel", channel_id))
///     .fetch_first()
///     .await?;
/// ```
pub trait Sql {
    fn sql(&self, query: &str) -> Bindings<'_>;
}

impl Sql for Database {
    fn sql(&self, query: &str) -> Bindings<'_> {
        let query = self.query(query);
        Bindings { query }
    }
}

#[derive(Debug)]
pub struct Bindings<'a> {
    query: surrealdb::method::Query<'a, surrealdb::engine::any::Any>,
}

impl Bindings<'_> {
    pub fn bind(mut self, params: impl serde::Serialize) -> Self {
        let query = self.query;
        self.query = query.bind(params);
        self
    }

    /// Execute the query and return a [surrealdb::Response] which is SurrealDB's way to represent a list of statements returned from the database.
    ///
    /// Statement level errors are left inside the response, see [surrealdb::Response::take_errors].
    pub async fn execute(self) -> Result<surrealdb::Response, DatabaseQueryError> {
        let response = self.query.await.context(MalformedQuerySnafu)?;
        tracing::debug!(?response, "executed query");
        Ok(response)
    }

    /// Execute the query and return the first result as a deserialized value.
    pub async fn fetch_first<T: DeserializeOwned>(self) -> Result<T, DatabaseQueryError>
    where
        usize: QueryResult<T>,
    {
        let mut statements = self.execute().await?;
        let result = statements.take::<T>(0).context(DeserializeSnafu)?;
        Ok(result)
    }

    /// Like [Bindings::fetch_first] but an empty result is an error.
    pub async fn fetch_one<T: DeserializeOwned>(self) -> Result<T, DatabaseQueryError>
    where
        usize: QueryResult<Option<T>>,
    {
        self.fetch_first::<Option<T>>()
            .await?
            .context(NoResultsSnafu)
    }
}
