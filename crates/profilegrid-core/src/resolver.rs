//! Turns property configuration into ordered request sets.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::{TemplateCatalog, PAGES};
use crate::config::{PropertyConfig, ReportDefinition};
use crate::error::ConfigError;
use crate::request::{event_report_default, ReportKind, ReportRequest, RequestSet, ViewFilter};

/// Build the request set of one property.
///
/// Predefined templates come first, in the order they are listed, followed by
/// `custom-event-request-N` entries and then `custom-request-N` entries. Both
/// counters start at 1 and are independent.
pub fn resolve_requests(
    catalog: &TemplateCatalog,
    property: &PropertyConfig,
) -> Result<RequestSet, ConfigError> {
    let mut requests = RequestSet::default();

    for id in &property.predefined_requests {
        let template = catalog
            .get(id)
            .ok_or_else(|| ConfigError::UnknownTemplate {
                property: property.id.clone(),
                template: id.clone(),
            })?;
        let request = ReportRequest::from_template(template).map_err(|source| {
            ConfigError::InvalidViewFilter {
                property: property.id.clone(),
                key: id.clone(),
                source,
            }
        })?;
        if !requests.insert(request) {
            warn!(property = %property.id, template = %id, "predefined request listed twice, ignoring");
        }
    }

    let has_pages = requests
        .get(PAGES)
        .is_some_and(|pages| !pages.dimensions.is_empty());
    if !has_pages {
        return Err(ConfigError::MissingPages {
            property: property.id.clone(),
        });
    }

    let event_default = event_report_default();
    for (i, partial) in property.custom_event_requests.iter().enumerate() {
        let key = format!("custom-event-request-{}", i + 1);
        let merged = partial.merged_over(&event_default);
        requests.insert(request_from_definition(&property.id, key, &merged)?);
    }

    for (i, definition) in property.custom_requests.iter().enumerate() {
        let key = format!("custom-request-{}", i + 1);
        requests.insert(request_from_definition(&property.id, key, definition)?);
    }

    debug!(property = %property.id, count = requests.len(), "requests resolved");
    Ok(requests)
}

fn request_from_definition(
    property: &str,
    key: String,
    definition: &ReportDefinition,
) -> Result<ReportRequest, ConfigError> {
    let required = |field: &'static str, value: &Option<Vec<String>>| {
        value
            .clone()
            .filter(|items| !items.is_empty())
            .ok_or_else(|| ConfigError::IncompleteRequest {
                property: property.to_string(),
                key: key.clone(),
                field,
            })
    };
    let dimensions = required("dimensions", &definition.dimensions)?;
    let metrics = required("metrics", &definition.metrics)?;

    let sort = definition
        .sort
        .as_deref()
        .map(|raw| {
            raw.parse().map_err(|_| ConfigError::InvalidSort {
                property: property.to_string(),
                key: key.clone(),
                sort: raw.to_string(),
            })
        })
        .transpose()?;
    let view_filter = definition
        .view_filter
        .as_deref()
        .map(|pattern| {
            ViewFilter::new(pattern).map_err(|source| ConfigError::InvalidViewFilter {
                property: property.to_string(),
                key: key.clone(),
                source,
            })
        })
        .transpose()?;

    Ok(ReportRequest {
        name: definition.name.clone().unwrap_or_else(|| key.clone()),
        kind: ReportKind::Plain,
        key,
        dimensions,
        metrics,
        sort,
        filter: definition.filter.clone(),
        view_filter,
    })
}

/// A property together with its resolved requests.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedProperty {
    pub id: String,
    pub label: String,
    pub requests: RequestSet,
}

/// Property configuration accepted once and resolved up front. Immutable
/// after construction.
#[derive(Debug, Clone)]
pub struct ReportConfigurator {
    catalog: TemplateCatalog,
    properties: Vec<ResolvedProperty>,
}

impl ReportConfigurator {
    /// Resolve every property. The first configuration error aborts the
    /// whole setup.
    pub fn new(
        catalog: TemplateCatalog,
        properties: &[PropertyConfig],
    ) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(properties.len());
        for property in properties {
            if !seen.insert(property.id.as_str()) {
                return Err(ConfigError::DuplicateProperty(property.id.clone()));
            }
            resolved.push(ResolvedProperty {
                id: property.id.clone(),
                label: property.display_label().to_string(),
                requests: resolve_requests(&catalog, property)?,
            });
        }
        Ok(Self {
            catalog,
            properties: resolved,
        })
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn properties(&self) -> &[ResolvedProperty] {
        &self.properties
    }

    pub fn property(&self, id: &str) -> Option<&ResolvedProperty> {
        self.properties.iter().find(|p| p.id == id)
    }

    pub fn requests(&self, property_id: &str) -> Option<&RequestSet> {
        self.property(property_id).map(|p| &p.requests)
    }

    /// Number of client calls one full render cycle issues.
    pub fn total_requests(&self) -> usize {
        self.properties.iter().map(|p| p.requests.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(predefined: &[&str]) -> PropertyConfig {
        PropertyConfig {
            id: "12345".to_string(),
            predefined_requests: predefined.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn custom(dimensions: &[&str], metrics: &[&str]) -> ReportDefinition {
        ReportDefinition {
            dimensions: Some(dimensions.iter().map(|s| s.to_string()).collect()),
            metrics: Some(metrics.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn predefined_requests_keep_listed_order() {
        let catalog = TemplateCatalog::builtin();
        let requests =
            resolve_requests(&catalog, &property(&["referer", "pages", "cities"])).expect("ok");
        let keys: Vec<&str> = requests.keys().collect();
        assert_eq!(keys, vec!["referer", "pages", "cities"]);
        assert_eq!(
            requests.get("cities").map(|r| r.kind),
            Some(ReportKind::Cities)
        );
    }

    #[test]
    fn missing_pages_is_a_configuration_error() {
        let catalog = TemplateCatalog::builtin();
        let mut config = property(&["referer", "keywords"]);
        config.custom_requests = vec![custom(&["hostname", "pagePath"], &["visits"])];
        let err = resolve_requests(&catalog, &config).expect_err("must fail");
        assert!(matches!(err, ConfigError::MissingPages { ref property } if property == "12345"));
    }

    #[test]
    fn no_predefined_requests_at_all_is_missing_pages() {
        let catalog = TemplateCatalog::builtin();
        let err = resolve_requests(&catalog, &property(&[])).expect_err("must fail");
        assert!(matches!(err, ConfigError::MissingPages { .. }));
    }

    #[test]
    fn unknown_template_is_a_configuration_error() {
        let catalog = TemplateCatalog::builtin();
        let err = resolve_requests(&catalog, &property(&["pages", "bounces"])).expect_err("fail");
        assert!(
            matches!(err, ConfigError::UnknownTemplate { ref template, .. } if template == "bounces")
        );
    }

    #[test]
    fn event_override_keeps_default_dimensions_and_sort() {
        let catalog = TemplateCatalog::builtin();
        let mut config = property(&["pages"]);
        config.custom_event_requests = vec![ReportDefinition {
            metrics: Some(vec!["totalEvents".to_string()]),
            ..Default::default()
        }];
        let requests = resolve_requests(&catalog, &config).expect("ok");
        let event = requests.get("custom-event-request-1").expect("event request");
        assert_eq!(event.metrics, vec!["totalEvents"]);
        assert_eq!(
            event.dimensions,
            vec!["eventCategory", "eventAction", "eventLabel"]
        );
        assert_eq!(event.sort.as_ref().map(ToString::to_string).as_deref(), Some("-totalEvents"));
        assert_eq!(event.view_filter.as_ref().map(ViewFilter::as_str), Some("not set"));
    }

    #[test]
    fn custom_keys_are_numbered_per_category() {
        let catalog = TemplateCatalog::builtin();
        let mut config = property(&["pages"]);
        config.custom_event_requests = vec![ReportDefinition::default(), ReportDefinition::default()];
        config.custom_requests = vec![
            custom(&["deviceCategory"], &["visits"]),
            custom(&["operatingSystem"], &["visits"]),
            custom(&["source"], &["visits"]),
        ];
        let requests = resolve_requests(&catalog, &config).expect("ok");
        let keys: Vec<&str> = requests.keys().collect();
        assert_eq!(
            keys,
            vec![
                "pages",
                "custom-event-request-1",
                "custom-event-request-2",
                "custom-request-1",
                "custom-request-2",
                "custom-request-3",
            ]
        );
        assert_eq!(
            requests.get("custom-request-2").map(|r| r.dimensions.clone()),
            Some(vec!["operatingSystem".to_string()])
        );
    }

    #[test]
    fn custom_requests_get_no_defaults() {
        let catalog = TemplateCatalog::builtin();
        let mut config = property(&["pages"]);
        config.custom_requests = vec![custom(&["deviceCategory"], &["visits"])];
        let requests = resolve_requests(&catalog, &config).expect("ok");
        let request = requests.get("custom-request-1").expect("custom");
        assert!(request.sort.is_none());
        assert!(request.view_filter.is_none());
        assert!(request.filter.is_none());
        assert_eq!(request.name, "custom-request-1");
    }

    #[test]
    fn custom_request_without_metrics_is_rejected() {
        let catalog = TemplateCatalog::builtin();
        let mut config = property(&["pages"]);
        config.custom_requests = vec![ReportDefinition {
            dimensions: Some(vec!["deviceCategory".to_string()]),
            ..Default::default()
        }];
        let err = resolve_requests(&catalog, &config).expect_err("fail");
        assert!(matches!(
            err,
            ConfigError::IncompleteRequest { ref key, field: "metrics", .. } if key == "custom-request-1"
        ));
    }

    #[test]
    fn custom_request_with_empty_dimensions_is_rejected() {
        let catalog = TemplateCatalog::builtin();
        let mut config = property(&["pages"]);
        config.custom_requests = vec![custom(&[], &["visits"])];
        let err = resolve_requests(&catalog, &config).expect_err("fail");
        assert!(matches!(
            err,
            ConfigError::IncompleteRequest {
                field: "dimensions",
                ..
            }
        ));
    }

    #[test]
    fn invalid_sort_is_rejected() {
        let catalog = TemplateCatalog::builtin();
        let mut config = property(&["pages"]);
        let mut definition = custom(&["source"], &["visits"]);
        definition.sort = Some("visits desc".to_string());
        config.custom_requests = vec![definition];
        let err = resolve_requests(&catalog, &config).expect_err("fail");
        assert!(matches!(
            err,
            ConfigError::InvalidSort { ref key, ref sort, .. }
                if key == "custom-request-1" && sort == "visits desc"
        ));
    }

    #[test]
    fn invalid_event_override_sort_is_rejected() {
        let catalog = TemplateCatalog::builtin();
        let mut config = property(&["pages"]);
        config.custom_event_requests = vec![ReportDefinition {
            sort: Some("-".to_string()),
            ..Default::default()
        }];
        let err = resolve_requests(&catalog, &config).expect_err("fail");
        assert!(matches!(
            err,
            ConfigError::InvalidSort { ref key, .. } if key == "custom-event-request-1"
        ));
    }

    #[test]
    fn invalid_view_filter_is_rejected() {
        let catalog = TemplateCatalog::builtin();
        let mut config = property(&["pages"]);
        let mut definition = custom(&["source"], &["visits"]);
        definition.view_filter = Some("(unclosed".to_string());
        config.custom_requests = vec![definition];
        let err = resolve_requests(&catalog, &config).expect_err("fail");
        assert!(matches!(err, ConfigError::InvalidViewFilter { .. }));
    }

    #[test]
    fn configurator_rejects_duplicate_properties() {
        let config = property(&["pages"]);
        let err = ReportConfigurator::new(TemplateCatalog::builtin(), &[config.clone(), config])
            .expect_err("fail");
        assert!(matches!(err, ConfigError::DuplicateProperty(ref id) if id == "12345"));
    }

    #[test]
    fn example_property_file_resolves() {
        let raw = include_str!("../../../properties.example.json");
        let properties = crate::config::parse_properties(raw).expect("parse");
        let configurator =
            ReportConfigurator::new(TemplateCatalog::builtin(), &properties).expect("resolve");
        let downloads = configurator
            .requests("12345678")
            .and_then(|r| r.get("custom-event-request-1"))
            .expect("event request");
        assert_eq!(downloads.name, "Downloads");
        assert_eq!(downloads.metrics, vec!["totalEvents", "uniqueEvents"]);
        assert_eq!(downloads.filter.as_deref(), Some("ga:eventCategory==download"));
    }

    #[test]
    fn configurator_resolves_every_property() {
        let mut second = property(&["pages", "browsers"]);
        second.id = "67890".to_string();
        second.label = Some("shop.example.com".to_string());
        let configurator =
            ReportConfigurator::new(TemplateCatalog::builtin(), &[property(&["pages"]), second])
                .expect("ok");
        assert_eq!(configurator.properties().len(), 2);
        assert_eq!(configurator.total_requests(), 3);
        assert_eq!(
            configurator.property("67890").map(|p| p.label.as_str()),
            Some("shop.example.com")
        );
        assert!(configurator.requests("missing").is_none());
    }
}
