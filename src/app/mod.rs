//! Application modules: CloudTrail access, report generation and their
//! configuration and error types.

pub mod audit_report;
pub mod config;
pub mod data_plane;
pub mod error;
pub mod sdk_errors;
