//! Built-in report templates that properties can reference by id.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Metrics every predefined template fetches unless it says otherwise.
pub const DEFAULT_METRICS: [&str; 6] = [
    "visits",
    "pageviews",
    "uniquePageviews",
    "pageviewsPerVisit",
    "timeOnSite",
    "avgTimeOnSite",
];

/// Metric predefined templates sort on, descending, unless they say otherwise.
pub const DEFAULT_SORT_METRIC: &str = "visits";

/// Template id every property must include.
pub const PAGES: &str = "pages";

/// Sort order on a single metric. Written as `visits` (ascending) or
/// `-visits` (descending), the notation the reporting API accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub metric: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn descending(metric: &str) -> Self {
        Self {
            metric: metric.to_string(),
            descending: true,
        }
    }
}

impl FromStr for SortSpec {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (metric, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        if metric.is_empty() || !metric.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(raw.to_string());
        }
        Ok(Self {
            metric: metric.to_string(),
            descending,
        })
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.metric)
        } else {
            f.write_str(&self.metric)
        }
    }
}

impl Serialize for SortSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A named report shape: what to group by, what to count, how to order it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTemplate {
    pub id: String,
    pub name: String,
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    pub sort: SortSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Regex matched against row labels after fetching. Never sent upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_filter: Option<String>,
}

impl ReportTemplate {
    fn standard(id: &str, name: &str, dimensions: &[&str], view_filter: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            dimensions: to_strings(dimensions),
            metrics: to_strings(&DEFAULT_METRICS),
            sort: SortSpec::descending(DEFAULT_SORT_METRIC),
            filter: None,
            view_filter: view_filter.map(str::to_string),
        }
    }
}

/// Lookup table of the predefined templates, in declaration order.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<ReportTemplate>,
}

impl TemplateCatalog {
    pub fn builtin() -> Self {
        let templates = vec![
            ReportTemplate::standard(
                "keywords",
                "Keyword",
                &["keyword"],
                Some("(not set|not provided)"),
            ),
            ReportTemplate::standard(
                "referer",
                "Referer",
                &["source", "referralPath"],
                Some(r"(not set|google|bing|suche\.t\-online\.de|direct)"),
            ),
            ReportTemplate::standard(PAGES, "Pages", &["hostname", "pagePath"], None),
            ReportTemplate {
                id: "events".to_string(),
                name: "Events".to_string(),
                dimensions: to_strings(&["eventCategory", "eventAction", "eventLabel"]),
                metrics: to_strings(&["totalEvents", "uniqueEvents"]),
                sort: SortSpec::descending("totalEvents"),
                filter: None,
                view_filter: Some("not set".to_string()),
            },
            ReportTemplate::standard("cities", "City", &["city"], Some("not set")),
            ReportTemplate::standard("countries", "Country", &["country"], Some("not set")),
            ReportTemplate::standard("languages", "Language", &["language"], None),
            ReportTemplate::standard(
                "screenResolutions",
                "Resolution",
                &["screenResolution"],
                None,
            ),
            ReportTemplate::standard("browsers", "Browser", &["browser"], None),
            ReportTemplate::standard("landingPages", "Landing Page", &["landingPagePath"], None),
            ReportTemplate::standard("exitPages", "Exit Page", &["exitPagePath"], None),
        ];
        Self { templates }
    }

    /// Returns `None` for ids that are not in the catalog.
    pub fn get(&self, id: &str) -> Option<&ReportTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

pub(crate) fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
