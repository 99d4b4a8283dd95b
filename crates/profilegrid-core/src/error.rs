use thiserror::Error;

/// Problems found while turning property configuration into report requests.
///
/// All of these are fatal for the property they name and are raised before
/// any analytics client call is issued.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("property {property}: pages must be configured in order to add up total pageviews, visits and unique pageviews")]
    MissingPages { property: String },

    #[error("property {property}: unknown predefined request '{template}'")]
    UnknownTemplate { property: String, template: String },

    #[error("property {property}: {key} is missing required field '{field}'")]
    IncompleteRequest {
        property: String,
        key: String,
        field: &'static str,
    },

    #[error("property {property}: {key} has an invalid sort '{sort}'")]
    InvalidSort {
        property: String,
        key: String,
        sort: String,
    },

    #[error("property {property}: {key} has an invalid view filter: {source}")]
    InvalidViewFilter {
        property: String,
        key: String,
        #[source]
        source: regex::Error,
    },

    #[error("property {0} is configured more than once")]
    DuplicateProperty(String),

    #[error("failed to read property configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse property configuration: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A period selector that is not of the form `last-<days>`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid period '{0}': expected last-<days>, e.g. last-7")]
pub struct PeriodError(pub String);

/// A dimension value that does not have the shape a link formatter expects.
/// Always recovered from by showing the raw value.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("expected '<host> <path>', got '{0}'")]
pub struct FormatError(pub String);
