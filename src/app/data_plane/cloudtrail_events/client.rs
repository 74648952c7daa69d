//! AWS SDK client wrapper for CloudTrail event history lookups

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudtrail as cloudtrail_sdk;
use aws_smithy_types::DateTime;
use aws_types::region::Region;

use super::types::{LookupPage, LookupQuery};

/// Paginated event history query service.
///
/// Production lookups go to CloudTrail; tests script the pages.
#[async_trait]
pub trait EventLookup: Send + Sync {
    /// Fetch one page of events for the query
    async fn lookup_page(&self, query: &LookupQuery) -> Result<LookupPage>;
}

/// Creates an [`EventLookup`] bound to one region.
#[async_trait]
pub trait LookupProvider: Send + Sync {
    async fn lookup_for_region(&self, region: &str) -> Result<Box<dyn EventLookup>>;
}

/// Client for querying the CloudTrail event history of one region
#[derive(Clone)]
pub struct CloudTrailEventsClient {
    client: cloudtrail_sdk::Client,
    region: String,
}

impl CloudTrailEventsClient {
    /// Create a client from an already loaded SDK config
    pub fn new(aws_config: &aws_config::SdkConfig, region: &str) -> Self {
        Self {
            client: cloudtrail_sdk::Client::new(aws_config),
            region: region.to_string(),
        }
    }

    /// Resolve credentials through the default provider chain and create a client
    ///
    /// # Arguments
    /// * `region` - AWS region (e.g., "us-east-1")
    /// * `profile` - Named profile from the shared config files, if any
    pub async fn for_region(region: &str, profile: Option<&str>) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }

        let aws_config = loader.load().await;
        log::debug!(
            "CloudTrail: created client for region {} (profile: {})",
            region,
            profile.unwrap_or("default chain")
        );

        Self::new(&aws_config, region)
    }
}

#[async_trait]
impl EventLookup for CloudTrailEventsClient {
    async fn lookup_page(&self, query: &LookupQuery) -> Result<LookupPage> {
        let attribute = cloudtrail_sdk::types::LookupAttribute::builder()
            .attribute_key(cloudtrail_sdk::types::LookupAttributeKey::EventName)
            .attribute_value(&query.action)
            .build()
            .with_context(|| "Failed to build lookup attribute")?;

        let request = self
            .client
            .lookup_events()
            .lookup_attributes(attribute)
            .start_time(DateTime::from_millis(query.window.start.timestamp_millis()))
            .end_time(DateTime::from_millis(query.window.end.timestamp_millis()))
            .max_results(query.max_results)
            .set_next_token(query.next_token.clone());

        let response = request.send().await.with_context(|| {
            format!(
                "Failed to lookup CloudTrail events for {} in {}",
                query.action, self.region
            )
        })?;

        log::trace!(
            "CloudTrail: {} returned {} events in {} (more: {})",
            query.action,
            response.events().len(),
            self.region,
            response.next_token().is_some()
        );

        Ok(LookupPage::new(
            response.events().to_vec(),
            response.next_token().map(|t| t.to_string()),
        ))
    }
}

/// Builds real CloudTrail clients, optionally from a named profile
#[derive(Debug, Clone, Default)]
pub struct AwsLookupProvider {
    profile: Option<String>,
}

impl AwsLookupProvider {
    pub fn new(profile: Option<String>) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl LookupProvider for AwsLookupProvider {
    async fn lookup_for_region(&self, region: &str) -> Result<Box<dyn EventLookup>> {
        let client = CloudTrailEventsClient::for_region(region, self.profile.as_deref()).await;
        Ok(Box::new(client))
    }
}
