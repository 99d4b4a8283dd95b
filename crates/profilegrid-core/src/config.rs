use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_GA_ENDPOINT: &str = "https://www.googleapis.com/analytics/v3/data/ga";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub properties_path: String,
    /// Decides which calendar day "today" is. UTC when unset.
    pub timezone: Option<Tz>,
    /// Bearer token for the reporting API, obtained out of band.
    pub ga_token: Option<String>,
    pub ga_endpoint: String,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("PROFILEGRID_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            properties_path: std::env::var("PROFILEGRID_PROPERTIES_PATH")
                .unwrap_or_else(|_| "./properties.json".to_string()),
            timezone: match std::env::var("PROFILEGRID_TIMEZONE") {
                Ok(raw) if !raw.trim().is_empty() => Some(
                    raw.trim()
                        .parse::<Tz>()
                        .map_err(|_| format!("invalid timezone: {raw}"))?,
                ),
                _ => None,
            },
            ga_token: std::env::var("PROFILEGRID_GA_TOKEN")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            ga_endpoint: std::env::var("PROFILEGRID_GA_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_GA_ENDPOINT.to_string()),
            cors_origins: std::env::var("PROFILEGRID_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Current calendar date in the configured timezone.
    pub fn today(&self) -> chrono::NaiveDate {
        let now = chrono::Utc::now();
        match self.timezone {
            Some(tz) => now.with_timezone(&tz).date_naive(),
            None => now.date_naive(),
        }
    }
}

/// A report shape as written in the property file. Every field is optional so
/// the same record can express both partial event-report overrides and fully
/// custom definitions; the resolver decides which fields are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReportDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_filter: Option<String>,
}

/// One tracked property (an analytics profile) and the reports to show for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PropertyConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub predefined_requests: Vec<String>,
    #[serde(default)]
    pub custom_event_requests: Vec<ReportDefinition>,
    #[serde(default)]
    pub custom_requests: Vec<ReportDefinition>,
}

impl PropertyConfig {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// Read the ordered property list from a JSON file.
pub fn load_properties(path: impl AsRef<Path>) -> Result<Vec<PropertyConfig>, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    parse_properties(&raw)
}

pub fn parse_properties(raw: &str) -> Result<Vec<PropertyConfig>, ConfigError> {
    Ok(serde_json::from_str(raw)?)
}
