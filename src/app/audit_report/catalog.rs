//! Monitored action names and supported regions.
//!
//! Both lists are plain data. They are wrapped in [`ActionCatalog`] and
//! [`RegionCatalog`] values so the collector, aggregator and driver receive them
//! as injected configuration instead of reaching for globals.

#![warn(clippy::all, rust_2018_idioms)]

use std::fmt;

use crate::app::error::{ReportError, Result};

/// Region selector that expands to every entry of the region catalog.
pub const ALL_REGIONS: &str = "all";

/// Security-sensitive management actions queried from the event history.
pub static MONITORED_ACTIONS: &[&str] = &[
    "CreateApi",
    "UpdateApi",
    "CreateBucket",
    "UpdateBucket",
    "CreateCertificate",
    "UpdateCertificate",
    "CreateCluster",
    "UpdateCluster",
    "CreateClusterV2",
    "CreateDeployment",
    "UpdateDeployment",
    "CreateDomain",
    "UpdateDomain",
    "CreateDomainName",
    "UpdateDomainName",
    "CreateFargateProfile",
    "CreateFirewall",
    "UpdateFirewallConfig",
    "CreateGateway",
    "UpdateGateway",
    "CreateHsm",
    "CreateImage",
    "UpdateImage",
    "CreateInstance",
    "UpdateInstance",
    "CreateLoadBalancer",
    "UpdateLoadBalancer",
    "CreateNetwork",
    "UpdateNetwork",
    "CreateRegistry",
    "UpdateRegistry",
    "CreateDataSourceFromRDS",
    "CreateLogStream",
    "CreateRestApi",
    "UpdateRestApi",
    "CreateRole",
    "UpdateRole",
    "CreateSecurityGroup",
    "CreateSnapshot",
    "UpdateSnapshot",
    "CreateSubnetGroup",
    "UpdateSubnetGroup",
    "CreateSubnet",
    "CreateUserPool",
    "CreateVpc",
    "CreateVolume",
    "UpdateVolume",
    "CreateVpcLink",
    "UpdateVpcLink",
    "CreateVpcPeeringConnection",
    "CreateFunction",
    "UpdateFunction",
    "CreateQueue",
    "UpdateQueue",
    "CreateTopic",
    "CreateTrail",
    "UpdateTrail",
    "CreateUserPoolClient",
    "UpdateUserPoolClient",
    "CreateApiMapping",
    "UpdateApiMapping",
    "CreateAuthorizer",
    "UpdateAuthorizer",
    "CreateDBInstance",
    "CreateDBCluster",
    "CreateEmailIdentity",
    "CreateIdentityProvider",
    "UpdateIdentityProvider",
    "CreateInternetGateway",
    "CreateKey",
    "CreateNatGateway",
    "CreateSecret",
    "UpdateSecret",
];

/// Regions whose event history can be queried.
pub static SUPPORTED_REGIONS: &[&str] = &[
    "af-south-1",     // Africa (Cape Town)
    "ap-east-1",      // Asia Pacific (Hong Kong)
    "ap-northeast-1", // Asia Pacific (Tokyo)
    "ap-northeast-2", // Asia Pacific (Seoul)
    "ap-northeast-3", // Asia Pacific (Osaka)
    "ap-south-1",     // Asia Pacific (Mumbai)
    "ap-southeast-2", // Asia Pacific (Sydney)
    "ap-southeast-1", // Asia Pacific (Singapore)
    "ca-central-1",   // Canada (Central)
    "cn-north-1",     // China (Beijing)
    "cn-northwest-1", // China (Ningxia)
    "eu-central-1",   // Europe (Frankfurt)
    "eu-north-1",     // Europe (Stockholm)
    "eu-west-1",      // Europe (Ireland)
    "eu-west-2",      // Europe (London)
    "eu-west-3",      // Europe (Paris)
    "eu-south-1",     // Europe (Milan)
    "me-south-1",     // Middle East (Bahrain)
    "sa-east-1",      // South America (São Paulo)
    "us-gov-east-1",  // AWS GovCloud (US-East)
    "us-gov-west-1",  // AWS GovCloud (US-West)
    "us-east-1",      // US East (N. Virginia)
    "us-east-2",      // US East (Ohio)
    "us-west-1",      // US West (N. California)
    "us-west-2",      // US West (Oregon)
];

/// Ordered set of action names the report is restricted to.
///
/// The order is significant: it is the column order of the resources report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCatalog {
    actions: Vec<String>,
}

impl ActionCatalog {
    /// Build a catalog from explicit action names, dropping duplicates while
    /// keeping first-seen order.
    pub fn new<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut deduped: Vec<String> = Vec::new();
        for action in actions {
            let action = action.into();
            if !deduped.contains(&action) {
                deduped.push(action);
            }
        }
        Self { actions: deduped }
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn contains(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::new(MONITORED_ACTIONS.iter().copied())
    }
}

/// Set of region identifiers accepted by the region selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionCatalog {
    regions: Vec<String>,
}

impl RegionCatalog {
    pub fn new<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn contains(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
    }
}

impl Default for RegionCatalog {
    fn default() -> Self {
        Self::new(SUPPORTED_REGIONS.iter().copied())
    }
}

/// Parsed `--region` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSelector {
    /// One region from the catalog
    Single(String),
    /// Every region in the catalog
    All,
}

impl RegionSelector {
    /// Validate a raw selector against the region catalog.
    ///
    /// Unknown values are rejected with [`ReportError::InvalidRegion`] so nothing
    /// is queried for a typo.
    pub fn parse(raw: &str, catalog: &RegionCatalog) -> Result<Self> {
        let raw = raw.trim();
        if raw == ALL_REGIONS {
            return Ok(RegionSelector::All);
        }
        if catalog.contains(raw) {
            Ok(RegionSelector::Single(raw.to_string()))
        } else {
            Err(ReportError::InvalidRegion {
                selector: raw.to_string(),
            })
        }
    }

    /// Regions to process, in catalog order.
    pub fn regions(&self, catalog: &RegionCatalog) -> Vec<String> {
        match self {
            RegionSelector::Single(region) => vec![region.clone()],
            RegionSelector::All => catalog.regions().to_vec(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, RegionSelector::All)
    }
}

impl fmt::Display for RegionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionSelector::Single(region) => f.write_str(region),
            RegionSelector::All => f.write_str(ALL_REGIONS),
        }
    }
}
