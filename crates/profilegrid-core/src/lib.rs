//! Report configuration, period handling and result formatting for a
//! side-by-side analytics grid over several tracked properties.

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod grid;
pub mod period;
pub mod request;
pub mod resolver;

pub use catalog::{ReportTemplate, TemplateCatalog};
pub use client::{AnalyticsClient, ResultRow};
pub use config::{Config, PropertyConfig, ReportDefinition};
pub use error::{ConfigError, PeriodError};
pub use period::{resolve_period, DateRange, Period};
pub use request::{ReportQuery, ReportRequest, RequestSet};
pub use resolver::{resolve_requests, ReportConfigurator, ResolvedProperty};
