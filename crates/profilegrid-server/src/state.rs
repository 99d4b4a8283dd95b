use std::sync::Arc;

use chrono::NaiveDate;

use profilegrid_core::{AnalyticsClient, ReportConfigurator};

use crate::config::Config;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// Everything here is read-only after startup.
pub struct AppState {
    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// Resolved request sets of every configured property.
    pub configurator: Arc<ReportConfigurator>,

    /// Reporting API client. One call per resolved request per render.
    pub client: Arc<dyn AnalyticsClient>,
}

impl AppState {
    pub fn new(
        config: Config,
        configurator: ReportConfigurator,
        client: Arc<dyn AnalyticsClient>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            configurator: Arc::new(configurator),
            client,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.config.today()
    }
}
