//! Paginated collection of event history pages for an action catalog.

#![warn(clippy::all, rust_2018_idioms)]

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use super::client::EventLookup;
use super::types::{LookupPage, LookupQuery, LookupWindow};
use crate::app::audit_report::catalog::ActionCatalog;
use crate::app::error::{ReportError, Result};

/// Issues one paginated lookup stream per catalog action.
pub struct EventCollector<'a> {
    lookup: &'a dyn EventLookup,
    catalog: &'a ActionCatalog,
    region: &'a str,
    window: LookupWindow,
    page_size: i32,
    action_concurrency: usize,
}

impl<'a> EventCollector<'a> {
    pub fn new(
        lookup: &'a dyn EventLookup,
        catalog: &'a ActionCatalog,
        region: &'a str,
        window: LookupWindow,
    ) -> Self {
        Self {
            lookup,
            catalog,
            region,
            window,
            page_size: crate::app::config::MAX_PAGE_SIZE,
            action_concurrency: 1,
        }
    }

    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Number of action streams in flight at once (at least one)
    pub fn with_action_concurrency(mut self, action_concurrency: usize) -> Self {
        self.action_concurrency = action_concurrency.max(1);
        self
    }

    /// Collect every page of every catalog action.
    ///
    /// Pages come back in catalog order, then page order, whatever the
    /// concurrency. Pages are concatenated, never deduplicated. The first
    /// failing lookup fails the whole collection.
    pub async fn collect(&self) -> Result<Vec<LookupPage>> {
        let per_action: Vec<Vec<LookupPage>> = stream::iter(self.catalog.actions())
            .map(|action| self.collect_action(action))
            .buffered(self.action_concurrency)
            .try_collect()
            .await?;

        let pages: Vec<LookupPage> = per_action.into_iter().flatten().collect();
        let events: usize = pages.iter().map(LookupPage::len).sum();
        info!(
            "Collected {} events in {} pages for {} actions in {}",
            events,
            pages.len(),
            self.catalog.len(),
            self.region
        );
        Ok(pages)
    }

    /// Page through the lookup stream of a single action.
    ///
    /// The first request never carries a token, so an action without events
    /// costs exactly one request. The stream ends on the first page without a
    /// continuation token.
    pub async fn collect_action(&self, action: &str) -> Result<Vec<LookupPage>> {
        let mut pages = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let query = LookupQuery::new(action, self.window)
                .with_max_results(self.page_size)
                .with_next_token(next_token.take());

            let page = self
                .lookup
                .lookup_page(&query)
                .await
                .map_err(|source| ReportError::QueryFailure {
                    region: self.region.to_string(),
                    action: action.to_string(),
                    source,
                })?;

            let more = page.has_more();
            next_token = page.next_token.clone();
            pages.push(page);

            if !more {
                break;
            }
        }

        debug!(
            "{}: {} pages, {} events in {}",
            action,
            pages.len(),
            pages.iter().map(LookupPage::len).sum::<usize>(),
            self.region
        );
        Ok(pages)
    }
}
