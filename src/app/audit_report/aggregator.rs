//! Identity grouping, anonymization and count/pivot aggregation.
//!
//! Only resource-bearing events for catalog actions are aggregated. Each one contributes exactly
//! one occurrence to one `(identity, action)` cell and one hit to one
//! user-agent bucket. An event referencing several resources is attributed to
//! its first resource and still counts once.

#![warn(clippy::all, rust_2018_idioms)]

use rand::Rng;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::anonymizer::Anonymizer;
use super::catalog::ActionCatalog;
use crate::app::data_plane::cloudtrail_events::EventRecord;
use crate::app::error::{ReportError, Result};

/// Fields read from the raw CloudTrail event JSON
#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(rename = "userAgent")]
    user_agent: String,
}

impl EventPayload {
    fn parse(record: &EventRecord) -> Result<Self> {
        serde_json::from_str(record.raw_payload()).map_err(|e| ReportError::MalformedPayload {
            event_id: record.id().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Identity × action count matrix, sparse and restricted to the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    /// Surviving action columns, in catalog order
    columns: Vec<String>,
    /// Identity label -> action -> count; zero cells are absent
    rows: BTreeMap<String, HashMap<String, u64>>,
}

impl CountTable {
    /// Pivot occurrence lists into counts.
    ///
    /// Columns follow the catalog; actions never observed for any identity
    /// are dropped.
    fn pivot(
        occurrences: BTreeMap<String, HashMap<String, Vec<Option<String>>>>,
        catalog: &ActionCatalog,
    ) -> Self {
        let rows: BTreeMap<String, HashMap<String, u64>> = occurrences
            .into_iter()
            .map(|(identity, actions)| {
                let counts = actions
                    .into_iter()
                    .map(|(action, resources)| (action, resources.len() as u64))
                    .collect();
                (identity, counts)
            })
            .collect();

        let columns = catalog
            .actions()
            .iter()
            .filter(|action| rows.values().any(|counts| counts.contains_key(*action)))
            .cloned()
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Identity labels in sorted order
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Count for a cell; absent cells are zero
    pub fn get(&self, identity: &str, action: &str) -> u64 {
        self.rows
            .get(identity)
            .and_then(|counts| counts.get(action))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of all cells
    pub fn total(&self) -> u64 {
        self.rows.values().flat_map(|counts| counts.values()).sum()
    }

    pub fn identity_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Number of resource-bearing events per user agent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAgentStats {
    counts: HashMap<String, u64>,
}

impl UserAgentStats {
    fn record(&mut self, user_agent: String) {
        *self.counts.entry(user_agent).or_insert(0) += 1;
    }

    pub fn get(&self, user_agent: &str) -> u64 {
        self.counts.get(user_agent).copied().unwrap_or(0)
    }

    /// Rows ordered by descending count, ties broken by user agent
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut rows: Vec<(&str, u64)> = self
            .counts
            .iter()
            .map(|(agent, count)| (agent.as_str(), *count))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Both tables of one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationReport {
    pub counts: CountTable,
    pub user_agents: UserAgentStats,
    /// Resource-bearing records that were aggregated
    pub retained: usize,
    /// Records skipped for lack of resources or an action outside the catalog
    pub skipped: usize,
}

/// Aggregation state for one region. Never shared between regions.
pub struct IdentityAggregator<'a, R: Rng> {
    catalog: &'a ActionCatalog,
    anonymizer: Anonymizer<R>,
    /// Identity label -> action -> first resource name of each event
    occurrences: BTreeMap<String, HashMap<String, Vec<Option<String>>>>,
    user_agents: UserAgentStats,
    retained: usize,
    skipped: usize,
}

impl<'a> IdentityAggregator<'a, rand::rngs::StdRng> {
    pub fn new(catalog: &'a ActionCatalog) -> Self {
        Self::with_anonymizer(catalog, Anonymizer::new())
    }
}

impl<'a, R: Rng> IdentityAggregator<'a, R> {
    pub fn with_anonymizer(catalog: &'a ActionCatalog, anonymizer: Anonymizer<R>) -> Self {
        Self {
            catalog,
            anonymizer,
            occurrences: BTreeMap::new(),
            user_agents: UserAgentStats::default(),
            retained: 0,
            skipped: 0,
        }
    }

    /// Add one record. Returns whether it was retained.
    ///
    /// Records without resources, or whose action has no catalog column, are
    /// skipped before the payload is read. A retained record whose payload
    /// lacks `userAgent` is a [`ReportError::MalformedPayload`] and leaves the
    /// state untouched.
    pub fn ingest(&mut self, record: &EventRecord) -> Result<bool> {
        let Some(first_resource) = record.resources().first() else {
            self.skipped += 1;
            return Ok(false);
        };
        if !self.catalog.contains(record.event_name()) {
            debug!("Skipping event {} for '{}', not in the catalog", record.id(), record.event_name());
            self.skipped += 1;
            return Ok(false);
        }

        let payload = EventPayload::parse(record)?;
        let label = self.anonymizer.label_for(record.actor())?.to_string();
        self.user_agents.record(payload.user_agent);

        self.occurrences
            .entry(label)
            .or_default()
            .entry(record.event_name().to_string())
            .or_default()
            .push(first_resource.resource_name.clone());

        self.retained += 1;
        Ok(true)
    }

    /// Ingest every record, stopping at the first malformed payload
    pub fn ingest_all<'r, I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'r EventRecord>,
    {
        for record in records {
            self.ingest(record)?;
        }
        Ok(())
    }

    /// Pivot into the final tables.
    ///
    /// Returns `None` when no record was retained, meaning there is nothing
    /// to report for the region.
    pub fn finish(self) -> Option<AggregationReport> {
        if self.occurrences.is_empty() {
            debug!("No resource-bearing events ({} skipped)", self.skipped);
            return None;
        }

        let counts = CountTable::pivot(self.occurrences, self.catalog);
        debug!(
            "Aggregated {} events for {} identities into {} columns ({} skipped)",
            self.retained,
            counts.identity_count(),
            counts.columns().len(),
            self.skipped
        );

        Some(AggregationReport {
            counts,
            user_agents: self.user_agents,
            retained: self.retained,
            skipped: self.skipped,
        })
    }
}
