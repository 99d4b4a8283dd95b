//! Analytics reporting client abstraction.

use serde::Serialize;

use crate::request::ReportQuery;

/// One row of a report: dimension values followed by metric values, both in
/// the order the query listed them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub dimensions: Vec<String>,
    pub metrics: Vec<f64>,
}

impl ResultRow {
    /// Dimension values joined by a space, the form formatters and view
    /// filters work on.
    pub fn label(&self) -> String {
        self.dimensions.join(" ")
    }

    pub fn metric(&self, index: usize) -> Option<f64> {
        self.metrics.get(index).copied()
    }
}

/// Executes report queries against an analytics provider.
///
/// Authentication, transport and rate limiting belong to the implementation.
/// Errors are returned as-is; callers do not retry.
#[async_trait::async_trait]
pub trait AnalyticsClient: Send + Sync + 'static {
    async fn fetch(&self, query: &ReportQuery<'_>) -> anyhow::Result<Vec<ResultRow>>;
}
