//! Per-region pipeline and multi-region fan-out.

#![warn(clippy::all, rust_2018_idioms)]

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use super::aggregator::IdentityAggregator;
use super::catalog::{ActionCatalog, RegionCatalog, RegionSelector};
use super::emitter::{ReportEmitter, ReportPaths};
use crate::app::config::ReportConfig;
use crate::app::data_plane::cloudtrail_events::{
    normalize_pages, EventCollector, LookupProvider, LookupWindow,
};
use crate::app::error::{ReportError, Result};
use crate::app::sdk_errors::{categorize_error, ErrorCategory};

/// How a region's run ended when nothing failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionOutcome {
    /// Both reports were written
    Reported(ReportPaths),
    /// The event history returned no events for any catalog action
    NoEventsFound,
    /// Events exist but none references a resource
    NoRelevantEvents,
}

/// Result of one region
#[derive(Debug)]
pub struct RegionReport {
    pub region: String,
    pub result: Result<RegionOutcome>,
}

impl RegionReport {
    pub fn is_reported(&self) -> bool {
        matches!(self.result, Ok(RegionOutcome::Reported(_)))
    }
}

/// Results of every region processed by a run, in region catalog order
#[derive(Debug)]
pub struct RunSummary {
    pub selector: RegionSelector,
    pub regions: Vec<RegionReport>,
}

impl RunSummary {
    /// Overall success flag.
    ///
    /// A single-region run succeeds when its report was written. An `all`
    /// run succeeds when at least one region was reported; failures of other
    /// regions are logged, not escalated.
    pub fn succeeded(&self) -> bool {
        self.regions.iter().any(RegionReport::is_reported)
    }

    pub fn reported(&self) -> usize {
        self.regions.iter().filter(|r| r.is_reported()).count()
    }

    pub fn failed(&self) -> usize {
        self.regions.iter().filter(|r| r.result.is_err()).count()
    }

    pub fn without_data(&self) -> usize {
        self.regions.len() - self.reported() - self.failed()
    }

    /// The failure of a single-region run, which is fatal to that run
    pub fn into_single_error(self) -> Option<ReportError> {
        if self.selector.is_all() {
            return None;
        }
        self.regions.into_iter().find_map(|r| r.result.err())
    }
}

/// Runs collect → normalize → aggregate → emit for each selected region
pub struct RegionDriver<P: LookupProvider> {
    provider: P,
    catalog: ActionCatalog,
    regions: RegionCatalog,
    config: ReportConfig,
    emitter: ReportEmitter,
}

impl<P: LookupProvider> RegionDriver<P> {
    pub fn new(provider: P, config: ReportConfig) -> Self {
        Self {
            provider,
            catalog: config.action_catalog(),
            regions: RegionCatalog::default(),
            emitter: ReportEmitter::new(config.output_dir.clone()),
            config,
        }
    }

    /// Builder pattern: replace the supported region list
    pub fn with_region_catalog(mut self, regions: RegionCatalog) -> Self {
        self.regions = regions;
        self
    }

    pub fn region_catalog(&self) -> &RegionCatalog {
        &self.regions
    }

    /// Process one region end to end.
    pub async fn run_region(&self, region: &str) -> Result<RegionOutcome> {
        info!("Looking up events in {}", region);

        let lookup = self
            .provider
            .lookup_for_region(region)
            .await
            .map_err(|source| ReportError::QueryFailure {
                region: region.to_string(),
                action: "<client setup>".to_string(),
                source,
            })?;

        let window = LookupWindow::ending_now(self.config.lookback_days);
        let pages = EventCollector::new(lookup.as_ref(), &self.catalog, region, window)
            .with_page_size(self.config.page_size)
            .with_action_concurrency(self.config.action_concurrency)
            .collect()
            .await?;

        let records = normalize_pages(&pages);
        if records.is_empty() {
            return Ok(RegionOutcome::NoEventsFound);
        }

        let mut aggregator = IdentityAggregator::new(&self.catalog);
        aggregator.ingest_all(&records)?;
        let Some(report) = aggregator.finish() else {
            return Ok(RegionOutcome::NoRelevantEvents);
        };

        let paths = self.emitter.write(region, &report)?;
        Ok(RegionOutcome::Reported(paths))
    }

    /// Process every region of the selector.
    ///
    /// Regions run concurrently up to `region_concurrency`; each owns its own
    /// aggregation state, and a failing region never affects the others.
    pub async fn run(&self, selector: &RegionSelector) -> RunSummary {
        let regions = selector.regions(&self.regions);
        let concurrency = self.config.region_concurrency.max(1);

        let mut reports: Vec<RegionReport> = stream::iter(regions)
            .map(|region| async move {
                let result = self.run_region(&region).await;
                log_region_result(&region, &result);
                RegionReport { region, result }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        reports.sort_by_key(|r| {
            self.regions
                .regions()
                .iter()
                .position(|known| *known == r.region)
                .unwrap_or(usize::MAX)
        });

        let summary = RunSummary {
            selector: selector.clone(),
            regions: reports,
        };
        info!(
            "Run finished for {}: {} reported, {} without data, {} failed",
            summary.selector,
            summary.reported(),
            summary.without_data(),
            summary.failed()
        );
        summary
    }
}

fn log_region_result(region: &str, result: &Result<RegionOutcome>) {
    match result {
        Ok(RegionOutcome::Reported(paths)) => {
            info!("Reports for {} written to {:?}", region, paths.resources.parent());
        }
        Ok(RegionOutcome::NoEventsFound) => {
            info!("No event history found for {}", region);
        }
        Ok(RegionOutcome::NoRelevantEvents) => {
            warn!("No relevant events found in {}", region);
        }
        Err(ReportError::QueryFailure { action, source, .. }) => {
            let category = categorize_error(source);
            match &category {
                ErrorCategory::RegionNotEnabled { code } => {
                    warn!(
                        "Region {} is not enabled for these credentials ({}), skipped",
                        region, code
                    );
                }
                _ => {
                    error!(
                        "Error getting '{}' events in region {} [{} {}]: {:#}",
                        action,
                        region,
                        category.short_label(),
                        category.code().unwrap_or("-"),
                        source
                    );
                }
            }
        }
        Err(e) => {
            error!("Error processing region {}: {}", region, e);
        }
    }
}
