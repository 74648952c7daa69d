//! Data Plane Services Module
//!
//! AWS data plane integrations: services queried for data recorded about an
//! account rather than for resource management.
//!
//! ## Available Services
//!
//! - **CloudTrail Events**: API call history used by the audit reports

pub mod cloudtrail_events;
