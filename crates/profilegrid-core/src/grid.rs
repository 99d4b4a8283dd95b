//! One render cycle: fetch every report of every property and format the
//! results into grid columns.

use serde::Serialize;
use tracing::{error, info};

use crate::catalog::PAGES;
use crate::client::{AnalyticsClient, ResultRow};
use crate::error::PeriodError;
use crate::format::{format_dimension, format_metric, DimensionDisplay, MetricDisplay};
use crate::period::{DateRange, Period};
use crate::request::ReportRequest;
use crate::resolver::{ReportConfigurator, ResolvedProperty};

/// Width of one property column.
pub const COLUMN_WIDTH_PX: u32 = 312;

pub fn grid_width_px(columns: usize) -> u32 {
    columns as u32 * COLUMN_WIDTH_PX
}

#[derive(Debug, Clone, Serialize)]
pub struct FormattedRow {
    pub label: DimensionDisplay,
    pub metrics: Vec<MetricDisplay>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportBlock {
    pub key: String,
    pub name: String,
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    pub rows: Vec<FormattedRow>,
    /// Rows dropped by the report's view filter.
    pub hidden_rows: usize,
}

/// Sums over the `pages` report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub visits: f64,
    pub pageviews: f64,
    pub unique_pageviews: f64,
}

impl Totals {
    pub fn from_rows(request: &ReportRequest, rows: &[ResultRow]) -> Self {
        let position = |name: &str| request.metrics.iter().position(|m| m == name);
        let sum = |index: Option<usize>| {
            index.map_or(0.0, |i| rows.iter().filter_map(|r| r.metric(i)).sum())
        };
        Self {
            visits: sum(position("visits")),
            pageviews: sum(position("pageviews")),
            unique_pageviews: sum(position("uniquePageviews")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyColumn {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<Totals>,
    pub reports: Vec<ReportBlock>,
    /// Set when a client call failed; `reports` then holds what was fetched
    /// before the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Grid {
    pub period: Period,
    pub range: DateRange,
    pub width_px: u32,
    pub columns: Vec<PropertyColumn>,
}

/// Format fetched rows for display, applying the request's view filter.
pub fn format_report(request: &ReportRequest, rows: &[ResultRow]) -> ReportBlock {
    let mut hidden_rows = 0;
    let mut formatted = Vec::with_capacity(rows.len());
    for row in rows {
        let label = row.label();
        if request
            .view_filter
            .as_ref()
            .is_some_and(|filter| filter.hides(&label))
        {
            hidden_rows += 1;
            continue;
        }
        formatted.push(FormattedRow {
            label: format_dimension(request.kind, &label),
            metrics: request
                .metrics
                .iter()
                .zip(&row.metrics)
                .map(|(name, value)| format_metric(name, *value))
                .collect(),
        });
    }
    ReportBlock {
        key: request.key.clone(),
        name: request.name.clone(),
        dimensions: request.dimensions.clone(),
        metrics: request.metrics.clone(),
        rows: formatted,
        hidden_rows,
    }
}

/// Fetch and format every report of one property, one call at a time. The
/// first failed call ends the pass and is recorded on the column.
pub async fn render_property(
    client: &dyn AnalyticsClient,
    property: &ResolvedProperty,
    range: DateRange,
) -> PropertyColumn {
    let mut column = PropertyColumn {
        id: property.id.clone(),
        label: property.label.clone(),
        totals: None,
        reports: Vec::with_capacity(property.requests.len()),
        error: None,
    };

    for request in &property.requests {
        let rows = match client.fetch(&request.query(&property.id, range)).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(property = %property.id, report = %request.key, error = %e, "report fetch failed");
                column.error = Some(format!("{}: {e}", request.key));
                break;
            }
        };
        if request.key == PAGES {
            column.totals = Some(Totals::from_rows(request, &rows));
        }
        column.reports.push(format_report(request, &rows));
    }

    info!(
        property = %property.id,
        reports = column.reports.len(),
        failed = column.error.is_some(),
        "property rendered"
    );
    column
}

/// Render every configured property for `period`, ending on `today`. A
/// period that cannot be resolved fails before any client call.
pub async fn build_grid(
    configurator: &ReportConfigurator,
    client: &dyn AnalyticsClient,
    period: Period,
    today: chrono::NaiveDate,
) -> Result<Grid, PeriodError> {
    let range = period.resolve(today)?;
    let mut columns = Vec::with_capacity(configurator.properties().len());
    for property in configurator.properties() {
        columns.push(render_property(client, property, range).await);
    }
    Ok(Grid {
        period,
        range,
        width_px: grid_width_px(columns.len()),
        columns,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::NaiveDate;

    use super::*;
    use crate::catalog::TemplateCatalog;
    use crate::config::PropertyConfig;
    use crate::request::ReportQuery;

    /// Returns canned rows per report key and records every call.
    struct CannedClient {
        calls: Mutex<Vec<String>>,
        fail_on: Option<(&'static str, &'static str)>,
    }

    impl CannedClient {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }
    }

    #[async_trait::async_trait]
    impl AnalyticsClient for CannedClient {
        async fn fetch(&self, query: &ReportQuery<'_>) -> anyhow::Result<Vec<ResultRow>> {
            let key = query.request.key.clone();
            self.calls
                .lock()
                .map_err(|_| anyhow::anyhow!("poisoned"))?
                .push(format!("{}:{key}", query.property_id));
            if self
                .fail_on
                .is_some_and(|(property, report)| property == query.property_id && report == key)
            {
                anyhow::bail!("rate limit exceeded");
            }
            let rows = match key.as_str() {
                "pages" => vec![
                    row(&["example.com", "/"], &[10.0, 25.0, 20.0, 2.5, 1200.0, 120.0]),
                    row(&["example.com", "/blog"], &[5.0, 7.0, 6.0, 1.4, 300.0, 60.0]),
                ],
                "cities" => vec![
                    row(&["Vienna"], &[8.0, 20.0, 18.0, 2.5, 900.0, 112.5]),
                    row(&["(not set)"], &[7.0, 12.0, 8.0, 1.7, 600.0, 85.7]),
                ],
                _ => Vec::new(),
            };
            Ok(rows)
        }
    }

    fn row(dimensions: &[&str], metrics: &[f64]) -> ResultRow {
        ResultRow {
            dimensions: dimensions.iter().map(|s| s.to_string()).collect(),
            metrics: metrics.to_vec(),
        }
    }

    fn configurator() -> ReportConfigurator {
        let properties = vec![
            PropertyConfig {
                id: "111".to_string(),
                label: Some("example.com".to_string()),
                predefined_requests: vec!["pages".to_string(), "cities".to_string()],
                ..Default::default()
            },
            PropertyConfig {
                id: "222".to_string(),
                predefined_requests: vec!["pages".to_string()],
                ..Default::default()
            },
        ];
        ReportConfigurator::new(TemplateCatalog::builtin(), &properties).expect("configurator")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).expect("date")
    }

    #[tokio::test]
    async fn grid_has_one_column_per_property_in_order() {
        let client = CannedClient::new();
        let grid = build_grid(&configurator(), &client, Period { days: 7 }, today())
            .await
            .expect("grid");

        assert_eq!(grid.width_px, 624);
        assert_eq!(grid.range.start, NaiveDate::from_ymd_opt(2024, 1, 3).expect("date"));
        let ids: Vec<&str> = grid.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["111", "222"]);

        let calls = client.calls.lock().expect("lock").clone();
        assert_eq!(calls, vec!["111:pages", "111:cities", "222:pages"]);
    }

    #[tokio::test]
    async fn pages_rows_add_up_to_totals() {
        let client = CannedClient::new();
        let grid = build_grid(&configurator(), &client, Period { days: 0 }, today())
            .await
            .expect("grid");
        assert_eq!(
            grid.columns[0].totals,
            Some(Totals {
                visits: 15.0,
                pageviews: 32.0,
                unique_pageviews: 26.0,
            })
        );
    }

    #[tokio::test]
    async fn rows_are_formatted_and_view_filtered() {
        let client = CannedClient::new();
        let grid = build_grid(&configurator(), &client, Period { days: 1 }, today())
            .await
            .expect("grid");
        let column = &grid.columns[0];

        let pages = &column.reports[0];
        assert_eq!(
            pages.rows[1].label,
            DimensionDisplay::Link {
                href: "http://example.com/blog".to_string(),
                label: "/blog".to_string(),
            }
        );
        assert_eq!(pages.rows[0].metrics[0].value, "10");
        assert_eq!(pages.rows[0].metrics[5].value, "120,0");
        assert_eq!(pages.rows[0].metrics[5].minutes.as_deref(), Some("2,0"));

        let cities = &column.reports[1];
        assert_eq!(cities.rows.len(), 1);
        assert_eq!(cities.hidden_rows, 1);
        assert_eq!(cities.rows[0].label.label(), "Vienna");
    }

    #[tokio::test]
    async fn unresolvable_period_fails_before_fetching() {
        let client = CannedClient::new();
        let result = build_grid(
            &configurator(),
            &client,
            Period { days: 100_000_000 },
            today(),
        )
        .await;
        assert!(result.is_err());
        assert!(client.calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_only_marks_its_property() {
        let client = CannedClient {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(("111", "pages")),
        };
        let grid = build_grid(&configurator(), &client, Period { days: 7 }, today())
            .await
            .expect("grid");

        let failed = &grid.columns[0];
        assert!(failed.reports.is_empty());
        assert!(failed.totals.is_none());
        assert!(failed
            .error
            .as_deref()
            .is_some_and(|e| e.contains("rate limit")));

        let healthy = &grid.columns[1];
        assert!(healthy.error.is_none());
        assert_eq!(healthy.reports.len(), 1);

        let calls = client.calls.lock().expect("lock").clone();
        assert_eq!(calls, vec!["111:pages", "222:pages"]);
    }
}
