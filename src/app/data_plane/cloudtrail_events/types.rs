//! Data types for CloudTrail event history lookups

#![warn(clippy::all, rust_2018_idioms)]

use aws_sdk_cloudtrail::types::Event;
use chrono::{DateTime, Duration, Utc};

use crate::app::config::MAX_PAGE_SIZE;

/// Time range covered by every lookup of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl LookupWindow {
    /// Window of `days` days ending now
    pub fn ending_now(days: u32) -> Self {
        Self::ending_at(Utc::now(), days)
    }

    /// Window of `days` days ending at `end`
    pub fn ending_at(end: DateTime<Utc>, days: u32) -> Self {
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }
}

/// One LookupEvents request, filtered to a single event name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    /// Event name (the `EventName` lookup attribute)
    pub action: String,

    /// Time range
    pub window: LookupWindow,

    /// Maximum number of results per request (max 50)
    pub max_results: i32,

    /// Continuation token from the previous page; `None` on the first page
    pub next_token: Option<String>,
}

impl LookupQuery {
    /// First page query for an action
    pub fn new(action: impl Into<String>, window: LookupWindow) -> Self {
        Self {
            action: action.into(),
            window,
            max_results: MAX_PAGE_SIZE,
            next_token: None,
        }
    }

    /// Builder pattern: set max results (clamped to 1..=50)
    pub fn with_max_results(mut self, max_results: i32) -> Self {
        self.max_results = max_results.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Builder pattern: set pagination token
    pub fn with_next_token(mut self, token: Option<String>) -> Self {
        self.next_token = token;
        self
    }
}

/// One page of LookupEvents results, in provider-native form
#[derive(Debug, Clone, Default)]
pub struct LookupPage {
    /// Events returned from the lookup
    pub events: Vec<Event>,

    /// Token for fetching the next page; `None` on the last page
    pub next_token: Option<String>,
}

impl LookupPage {
    pub fn new(events: Vec<Event>, next_token: Option<String>) -> Self {
        // An empty token is the same as no token
        let next_token = next_token.filter(|t| !t.is_empty());
        Self { events, next_token }
    }

    pub fn has_more(&self) -> bool {
        self.next_token.is_some()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
