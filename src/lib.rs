//! trailaudit - CloudTrail audit reports for security-sensitive actions
//!
//! trailaudit queries the CloudTrail event history of one region, or of every
//! supported region, for a fixed catalog of security-sensitive management
//! actions (`CreateBucket`, `CreateRole`, `UpdateSecret`, ...) and writes two
//! reports per region:
//!
//! - which anonymized identities performed which actions on resources
//! - which user agents (CLI, SDKs, console, IaC tooling) generated that traffic
//!
//! # Architecture Overview
//!
//! - **Data plane** ([`app::data_plane`]): CloudTrail SDK client, paginated
//!   collection and normalization into [`app::data_plane::cloudtrail_events::EventRecord`]
//! - **Audit report** ([`app::audit_report`]): catalogs, anonymization,
//!   aggregation, CSV emission and the per-region driver
//! - **Configuration** ([`app::config`]) and **errors** ([`app::error`],
//!   [`app::sdk_errors`])
//!
//! Every region is processed with its own aggregation state; nothing is kept
//! between regions or runs.

#![warn(clippy::all, rust_2018_idioms)]

pub mod app;

pub use app::audit_report::{RegionDriver, RegionOutcome, RegionSelector, RunSummary};
pub use app::config::ReportConfig;
pub use app::error::{ReportError, Result};
