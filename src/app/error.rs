//! Error types for report generation.

#![warn(clippy::all, rust_2018_idioms)]

use std::path::PathBuf;
use thiserror::Error;

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can stop a run or a single region's report.
///
/// Regions without data are not errors; see
/// [`RegionOutcome`](crate::app::audit_report::RegionOutcome).
#[derive(Error, Debug)]
pub enum ReportError {
    /// The region selector is neither a supported region nor `all`.
    #[error("invalid region '{selector}'")]
    InvalidRegion {
        /// The rejected selector.
        selector: String,
    },

    /// An event history lookup failed.
    #[error("failed to look up '{action}' events in {region}")]
    QueryFailure {
        /// Region being queried.
        region: String,
        /// Action name of the failing lookup stream.
        action: String,
        /// Underlying SDK or transport error.
        #[source]
        source: anyhow::Error,
    },

    /// The raw event payload does not carry the expected fields.
    #[error("malformed payload for event '{event_id}': {reason}")]
    MalformedPayload {
        /// Provider event id.
        event_id: String,
        /// Parser message.
        reason: String,
    },

    /// More distinct actors than there are identity labels.
    #[error("no free identity label left ({capacity} labels in use)")]
    LabelSpaceExhausted { capacity: usize },

    /// Writing a CSV report failed.
    #[error("failed to write report {path}")]
    Emit {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Filesystem error outside of CSV serialization.
    #[error("i/o error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be read or holds invalid values.
    #[error("configuration error in {path}: {message}")]
    Config { path: PathBuf, message: String },
}
