//! Audit Report Module
//!
//! Turns the CloudTrail event history of a region into two CSV reports:
//!
//! - `resources-<region>.csv`: anonymized identity × monitored action counts of
//!   events that referenced at least one resource
//! - `user-agents-<region>.csv`: how many of those events each user agent produced
//!
//! ## Pipeline
//!
//! ```text
//! RegionSelector → EventCollector → normalize_pages → IdentityAggregator → ReportEmitter
//!                  (per action,      (EventRecord)     (anonymize, count,
//!                   paginated)                          pivot)
//! ```
//!
//! [`RegionDriver`] runs the pipeline per region and isolates failures, so one
//! region's error never stops the others in `all` mode.

#![warn(clippy::all, rust_2018_idioms)]

pub mod aggregator;
pub mod anonymizer;
pub mod catalog;
pub mod driver;
pub mod emitter;

pub use aggregator::{AggregationReport, CountTable, IdentityAggregator, UserAgentStats};
pub use anonymizer::Anonymizer;
pub use catalog::{ActionCatalog, RegionCatalog, RegionSelector};
pub use driver::{RegionDriver, RegionOutcome, RegionReport, RunSummary};
pub use emitter::{ReportEmitter, ReportPaths};
