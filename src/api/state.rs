use std::{ops::Deref, sync::Arc};

use crate::database::Database;
use crate::engagement::{Engagement, EngagementConfig};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct App {
    pub database: Database,
    pub engagement: Arc<Engagement<Database>>,
    /// Boosted views a new upload starts with.
    pub initial_views: u64,
}

impl Deref for App {
    type Target = Engagement<Database>;

    fn deref(&self) -> &Self::Target {
        &self.engagement
    }
}

pub fn create_app(database: Database, config: &EngagementConfig) -> App {
    let engagement = Engagement::new(database.clone(), config);

    App {
        database,
        engagement: Arc::new(engagement),
        initial_views: config.initial_views,
    }
}
