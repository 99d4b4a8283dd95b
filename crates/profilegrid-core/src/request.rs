//! Resolved report requests and the queries built from them.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::catalog::{to_strings, ReportTemplate, SortSpec};
use crate::config::ReportDefinition;
use crate::period::DateRange;

/// Every query asks for the first page only.
pub const FIRST_PAGE: u32 = 1;
/// Large enough to return a full result set in one page under normal volumes.
pub const PAGE_SIZE: u32 = 10_000;

/// Reports whose dimension values get special display treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Referer,
    Cities,
    Keywords,
    Pages,
    Plain,
}

impl ReportKind {
    pub fn from_key(key: &str) -> Self {
        match key {
            "referer" => Self::Referer,
            "cities" => Self::Cities,
            "keywords" => Self::Keywords,
            "pages" => Self::Pages,
            _ => Self::Plain,
        }
    }
}

/// Compiled view-filter regex. Serializes as its pattern.
#[derive(Debug, Clone)]
pub struct ViewFilter(Regex);

impl ViewFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    /// `true` when a row with this label should be hidden.
    pub fn hides(&self, label: &str) -> bool {
        self.0.is_match(label)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for ViewFilter {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for ViewFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A report ready to run against one property, minus the date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRequest {
    pub key: String,
    pub name: String,
    pub kind: ReportKind,
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_filter: Option<ViewFilter>,
}

impl ReportRequest {
    pub(crate) fn from_template(template: &ReportTemplate) -> Result<Self, regex::Error> {
        Ok(Self {
            key: template.id.clone(),
            name: template.name.clone(),
            kind: ReportKind::from_key(&template.id),
            dimensions: template.dimensions.clone(),
            metrics: template.metrics.clone(),
            sort: Some(template.sort.clone()),
            filter: template.filter.clone(),
            view_filter: template
                .view_filter
                .as_deref()
                .map(ViewFilter::new)
                .transpose()?,
        })
    }

    pub fn query<'a>(&'a self, property_id: &'a str, range: DateRange) -> ReportQuery<'a> {
        ReportQuery {
            property_id,
            request: self,
            start_date: range.start,
            end_date: range.end,
            page_index: FIRST_PAGE,
            page_size: PAGE_SIZE,
        }
    }
}

/// Everything the analytics client needs for one call.
#[derive(Debug, Clone, Copy)]
pub struct ReportQuery<'a> {
    pub property_id: &'a str,
    pub request: &'a ReportRequest,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub page_index: u32,
    pub page_size: u32,
}

impl ReportQuery<'_> {
    pub fn dimensions(&self) -> &[String] {
        &self.request.dimensions
    }

    pub fn metrics(&self) -> &[String] {
        &self.request.metrics
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.request.sort.as_ref()
    }

    pub fn filter(&self) -> Option<&str> {
        self.request.filter.as_deref()
    }
}

/// The fixed shape custom event reports start from.
pub fn event_report_default() -> ReportDefinition {
    ReportDefinition {
        name: None,
        dimensions: Some(to_strings(&["eventCategory", "eventAction", "eventLabel"])),
        metrics: Some(to_strings(&["totalEvents", "uniqueEvents"])),
        sort: Some("-totalEvents".to_string()),
        filter: None,
        view_filter: Some("not set".to_string()),
    }
}

impl ReportDefinition {
    /// Field-level merge: each field set on `self` wins, every other field is
    /// taken from `defaults`.
    pub fn merged_over(&self, defaults: &ReportDefinition) -> ReportDefinition {
        ReportDefinition {
            name: self.name.clone().or_else(|| defaults.name.clone()),
            dimensions: self
                .dimensions
                .clone()
                .or_else(|| defaults.dimensions.clone()),
            metrics: self.metrics.clone().or_else(|| defaults.metrics.clone()),
            sort: self.sort.clone().or_else(|| defaults.sort.clone()),
            filter: self.filter.clone().or_else(|| defaults.filter.clone()),
            view_filter: self
                .view_filter
                .clone()
                .or_else(|| defaults.view_filter.clone()),
        }
    }
}

/// Requests of one property keyed by request key, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RequestSet {
    entries: Vec<ReportRequest>,
}

impl RequestSet {
    /// Adds `request` unless its key is already present. Returns whether it
    /// was inserted.
    pub fn insert(&mut self, request: ReportRequest) -> bool {
        if self.contains_key(&request.key) {
            return false;
        }
        self.entries.push(request);
        true
    }

    pub fn get(&self, key: &str) -> Option<&ReportRequest> {
        self.entries.iter().find(|r| r.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|r| r.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a RequestSet {
    type Item = &'a ReportRequest;
    type IntoIter = std::slice::Iter<'a, ReportRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
