//! CloudTrail Events Integration Module
//!
//! Queries the CloudTrail event history of a region and turns the returned
//! events into [`EventRecord`]s.
//!
//! ## Architecture
//!
//! ```text
//! EventCollector → EventLookup (trait) → CloudTrailEventsClient → AWS SDK → CloudTrail
//!       ↓
//! LookupPage (provider-native events) → normalizer → EventRecord
//! ```
//!
//! ## Pagination
//!
//! LookupEvents returns at most 50 events per call. Each monitored action is
//! paged independently: the first request has no token, and paging stops at the
//! first page without a `NextToken`.
//!
//! ## Lookup Attributes
//!
//! LookupEvents accepts a single lookup attribute per request, so every action
//! name is its own query stream filtered by `EventName`.

#![warn(clippy::all, rust_2018_idioms)]

pub mod client;
pub mod collector;
pub mod normalizer;
pub mod types;

// Re-export commonly used types
pub use client::{AwsLookupProvider, CloudTrailEventsClient, EventLookup, LookupProvider};
pub use collector::EventCollector;
pub use normalizer::{normalize_event, normalize_pages, EventRecord, ResourceRef};
pub use types::{LookupPage, LookupQuery, LookupWindow};
