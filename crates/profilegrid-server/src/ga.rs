use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use profilegrid_core::{AnalyticsClient, ReportQuery, ResultRow};

/// HTTP client for the Google Analytics Core Reporting API (v3).
///
/// Dimension and metric names are configured without the `ga:` prefix and get
/// it added here. The access token is obtained out of band and sent as a
/// bearer token; token refresh is not handled.
#[derive(Clone)]
pub struct GoogleAnalyticsClient {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataResponse {
    #[serde(default)]
    rows: Vec<Vec<String>>,
}

impl GoogleAnalyticsClient {
    pub fn new(endpoint: &str, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            token,
        }
    }

    fn query_url(&self, query: &ReportQuery<'_>) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint).context("Invalid reporting API endpoint")?;
        {
            let mut qs = url.query_pairs_mut();
            qs.append_pair("ids", &format!("ga:{}", query.property_id));
            qs.append_pair("start-date", &query.start_date.to_string());
            qs.append_pair("end-date", &query.end_date.to_string());
            qs.append_pair("metrics", &prefixed(query.metrics()));
            if !query.dimensions().is_empty() {
                qs.append_pair("dimensions", &prefixed(query.dimensions()));
            }
            if let Some(sort) = query.sort() {
                let direction = if sort.descending { "-" } else { "" };
                qs.append_pair("sort", &format!("{direction}ga:{}", sort.metric));
            }
            if let Some(filter) = query.filter().filter(|f| !f.is_empty()) {
                qs.append_pair("filters", filter);
            }
            qs.append_pair("start-index", &query.page_index.to_string());
            qs.append_pair("max-results", &query.page_size.to_string());
        }
        Ok(url)
    }
}

fn prefixed(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("ga:{n}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Split raw string rows into dimension and metric values. The API returns
/// dimension columns first, in request order, then metric columns.
fn parse_rows(raw: Vec<Vec<String>>, dimension_count: usize) -> Result<Vec<ResultRow>> {
    raw.into_iter()
        .map(|mut cells| {
            if cells.len() < dimension_count {
                anyhow::bail!(
                    "row has {} columns, expected at least {dimension_count}",
                    cells.len()
                );
            }
            let metrics = cells
                .split_off(dimension_count)
                .iter()
                .map(|v| {
                    v.parse::<f64>()
                        .with_context(|| format!("non-numeric metric value '{v}'"))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ResultRow {
                dimensions: cells,
                metrics,
            })
        })
        .collect()
}

#[async_trait::async_trait]
impl AnalyticsClient for GoogleAnalyticsClient {
    async fn fetch(&self, query: &ReportQuery<'_>) -> Result<Vec<ResultRow>> {
        let url = self.query_url(query)?;
        debug!(property = query.property_id, report = %query.request.key, "querying reporting API");

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let resp = request
            .send()
            .await
            .context("Reporting API request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Reporting API error {status}: {body}");
        }

        let data: DataResponse = resp
            .json()
            .await
            .context("Reporting API response parse failed")?;
        parse_rows(data.rows, query.dimensions().len())
    }
}
