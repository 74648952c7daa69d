//! Conversion of provider-native events into [`EventRecord`]s.
//!
//! Extraction is defensive: a missing field becomes the zero value of its type
//! (empty string, empty list, `false`, Unix epoch) and normalization never fails.

#![warn(clippy::all, rust_2018_idioms)]

use aws_sdk_cloudtrail::types::Event;
use chrono::{DateTime, NaiveDate, Utc};

use super::types::LookupPage;

/// Resource referenced by an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// Resource type (e.g., "AWS::S3::Bucket")
    pub resource_type: String,

    /// Resource name/identifier
    pub resource_name: Option<String>,
}

/// Normalized audit event. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    id: String,
    read_only: bool,
    access_key_id: String,
    event_time: DateTime<Utc>,
    event_source: String,
    actor: String,
    event_name: String,
    resources: Vec<ResourceRef>,
    raw_payload: String,
}

impl EventRecord {
    /// Event ID (unique identifier)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True if the call did not modify anything
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn event_time(&self) -> DateTime<Utc> {
        self.event_time
    }

    /// Calendar date of the event in UTC
    pub fn event_date(&self) -> NaiveDate {
        self.event_time.date_naive()
    }

    /// AWS service (e.g., "s3.amazonaws.com")
    pub fn event_source(&self) -> &str {
        &self.event_source
    }

    /// Username or principal that made the call
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// API operation (e.g., "CreateBucket")
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Every referenced resource, in provider order
    pub fn resources(&self) -> &[ResourceRef] {
        &self.resources
    }

    pub fn has_resources(&self) -> bool {
        !self.resources.is_empty()
    }

    /// Full CloudTrail event JSON, verbatim
    pub fn raw_payload(&self) -> &str {
        &self.raw_payload
    }
}

/// Normalize a single provider event.
pub fn normalize_event(event: &Event) -> EventRecord {
    let event_time = event
        .event_time()
        .and_then(|dt| dt.to_millis().ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default();

    let resources = event
        .resources()
        .iter()
        .map(|res| ResourceRef {
            resource_type: res.resource_type().unwrap_or_default().to_string(),
            resource_name: res.resource_name().map(|s| s.to_string()),
        })
        .collect();

    EventRecord {
        id: event.event_id().unwrap_or_default().to_string(),
        read_only: event
            .read_only()
            .map(|s| s.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false),
        access_key_id: event.access_key_id().unwrap_or_default().to_string(),
        event_time,
        event_source: event.event_source().unwrap_or_default().to_string(),
        actor: event.username().unwrap_or_default().to_string(),
        event_name: event.event_name().unwrap_or_default().to_string(),
        resources,
        raw_payload: event.cloud_trail_event().unwrap_or_default().to_string(),
    }
}

/// Flatten pages into records, keeping page order and event order.
pub fn normalize_pages(pages: &[LookupPage]) -> Vec<EventRecord> {
    pages
        .iter()
        .flat_map(|page| page.events.iter())
        .map(normalize_event)
        .collect()
}
