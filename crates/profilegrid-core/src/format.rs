//! Display formatting for fetched metric and dimension values.

use serde::Serialize;
use tracing::debug;

use crate::error::FormatError;
use crate::request::ReportKind;

const MAP_SEARCH: &str = "http://maps.google.at/maps?q=";
const WEB_SEARCH: &str = "http://www.google.at/search?q=";

/// Metrics measured in seconds (or close enough to be shown like them).
const DURATION_METRICS: [&str; 3] = ["avgTimeOnSite", "timeOnSite", "pageviewsPerVisit"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricDisplay {
    pub value: String,
    /// Same value in minutes, shown as a tooltip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<String>,
}

pub fn format_metric(metric: &str, value: f64) -> MetricDisplay {
    if DURATION_METRICS.contains(&metric) {
        MetricDisplay {
            value: format_decimal(value, 1),
            minutes: Some(format_decimal(value / 60.0, 1)),
        }
    } else {
        MetricDisplay {
            value: value.to_string(),
            minutes: None,
        }
    }
}

/// Fixed-point formatting with `,` as decimal separator and `.` between
/// thousands. Halves round away from zero.
pub fn format_decimal(value: f64, decimals: u32) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let scale = 10u64.pow(decimals);
    let scaled = (value.abs() * scale as f64).round() as u64;
    let whole = scaled / scale;
    let fraction = scaled % scale;

    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    if value < 0.0 && scaled != 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    if decimals > 0 {
        out.push(',');
        out.push_str(&format!("{:0width$}", fraction, width = decimals as usize));
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DimensionDisplay {
    Text { value: String },
    Link { href: String, label: String },
}

impl DimensionDisplay {
    fn text(value: &str) -> Self {
        Self::Text {
            value: value.to_string(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Text { value } => value,
            Self::Link { label, .. } => label,
        }
    }
}

/// Format a row label (dimension values joined by a space) for the report it
/// belongs to.
pub fn format_dimension(kind: ReportKind, raw: &str) -> DimensionDisplay {
    let formatted = match kind {
        ReportKind::Referer => split_host_path(raw).map(|(host, path)| {
            let href = format!("http://{host}{path}");
            DimensionDisplay::Link {
                label: href.clone(),
                href,
            }
        }),
        ReportKind::Pages => split_host_path(raw).map(|(host, path)| DimensionDisplay::Link {
            href: format!("http://{host}{path}"),
            label: path.to_string(),
        }),
        ReportKind::Cities => Ok(search_link(MAP_SEARCH, raw)),
        ReportKind::Keywords => Ok(search_link(WEB_SEARCH, raw)),
        ReportKind::Plain => Ok(DimensionDisplay::text(raw)),
    };

    formatted.unwrap_or_else(|err| {
        debug!(?kind, error = %err, "falling back to raw dimension value");
        DimensionDisplay::text(raw)
    })
}

fn split_host_path(raw: &str) -> Result<(&str, &str), FormatError> {
    raw.split_once(' ')
        .ok_or_else(|| FormatError(raw.to_string()))
}

fn search_link(base: &str, raw: &str) -> DimensionDisplay {
    let query: String = url::form_urlencoded::byte_serialize(raw.as_bytes()).collect();
    DimensionDisplay::Link {
        href: format!("{base}{query}"),
        label: raw.to_string(),
    }
}
