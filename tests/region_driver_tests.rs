use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use aws_sdk_cloudtrail::types::{Event, Resource};
use pretty_assertions::assert_eq;

use trailaudit::app::audit_report::{RegionCatalog, RegionOutcome};
use trailaudit::app::data_plane::cloudtrail_events::{
    EventLookup, LookupPage, LookupProvider, LookupQuery,
};
use trailaudit::{RegionDriver, RegionSelector, ReportConfig, ReportError};

type Script = HashMap<String, Vec<LookupPage>>;

/// Region -> action -> pages, plus a log of every query issued
#[derive(Clone, Default)]
struct ScriptedProvider {
    regions: HashMap<String, Script>,
    failing: Vec<String>,
    queries: Arc<Mutex<Vec<(String, LookupQuery)>>>,
}

impl ScriptedProvider {
    fn region(mut self, region: &str, action: &str, pages: Vec<LookupPage>) -> Self {
        self.regions
            .entry(region.to_string())
            .or_default()
            .insert(action.to_string(), pages);
        self
    }

    fn failing(mut self, region: &str) -> Self {
        self.failing.push(region.to_string());
        self
    }

    fn query_count(&self, region: &str) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == region)
            .count()
    }
}

struct ScriptedLookup {
    region: String,
    script: Script,
    fail: bool,
    queries: Arc<Mutex<Vec<(String, LookupQuery)>>>,
}

#[async_trait]
impl EventLookup for ScriptedLookup {
    async fn lookup_page(&self, query: &LookupQuery) -> anyhow::Result<LookupPage> {
        let index = {
            let mut queries = self.queries.lock().unwrap();
            let index = queries
                .iter()
                .filter(|(r, q)| *r == self.region && q.action == query.action)
                .count();
            queries.push((self.region.clone(), query.clone()));
            index
        };
        if self.fail {
            return Err(anyhow!("AccessDeniedException: not authorized to perform cloudtrail:LookupEvents"));
        }
        Ok(self
            .script
            .get(&query.action)
            .and_then(|pages| pages.get(index))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl LookupProvider for ScriptedProvider {
    async fn lookup_for_region(&self, region: &str) -> anyhow::Result<Box<dyn EventLookup>> {
        Ok(Box::new(ScriptedLookup {
            region: region.to_string(),
            script: self.regions.get(region).cloned().unwrap_or_default(),
            fail: self.failing.iter().any(|r| r == region),
            queries: Arc::clone(&self.queries),
        }))
    }
}

fn event(id: &str, actor: &str, action: &str, resources: &[&str], user_agent: &str) -> Event {
    let mut builder = Event::builder()
        .event_id(id)
        .username(actor)
        .event_name(action)
        .cloud_trail_event(format!(r#"{{"userAgent":"{}"}}"#, user_agent));
    for name in resources {
        builder = builder.resources(
            Resource::builder()
                .resource_type("AWS::S3::Bucket")
                .resource_name(*name)
                .build(),
        );
    }
    builder.build()
}

fn config(output_dir: &Path, actions: &[&str]) -> ReportConfig {
    ReportConfig {
        output_dir: output_dir.to_path_buf(),
        actions: Some(actions.iter().map(|a| a.to_string()).collect()),
        ..ReportConfig::default()
    }
}

fn regions(names: &[&str]) -> RegionCatalog {
    RegionCatalog::new(names.iter().copied())
}

fn csv_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_single_identity_report() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::default().region(
        "us-west-2",
        "CreateBucket",
        vec![LookupPage::new(
            vec![
                event("1", "a@x.com", "CreateBucket", &["bucket-1"], "aws-cli/2.15"),
                event("2", "a@x.com", "CreateBucket", &[], "aws-cli/2.15"),
            ],
            None,
        )],
    );
    let driver = RegionDriver::new(provider, config(dir.path(), &["CreateApi", "CreateBucket"]));

    let paths = match driver.run_region("us-west-2").await.unwrap() {
        RegionOutcome::Reported(paths) => paths,
        other => panic!("expected a report, got {:?}", other),
    };

    let resources = std::fs::read_to_string(&paths.resources).unwrap();
    let lines: Vec<&str> = resources.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], ",CreateBucket");
    let (label, count) = lines[1].split_once(',').unwrap();
    assert_eq!(label.len(), 5);
    assert!(label.chars().all(|c| c.is_ascii_lowercase()));
    assert_eq!(count, "1");

    let user_agents = std::fs::read_to_string(&paths.user_agents).unwrap();
    assert_eq!(user_agents, "user_agent,num_resources\naws-cli/2.15,1\n");
}

#[tokio::test]
async fn test_no_events_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::default();
    let driver = RegionDriver::new(provider.clone(), config(dir.path(), &["CreateBucket", "CreateRole"]));

    let outcome = driver.run_region("eu-west-1").await.unwrap();

    assert_eq!(outcome, RegionOutcome::NoEventsFound);
    assert!(csv_files(dir.path()).is_empty());
    // One query per action even without events
    assert_eq!(provider.query_count("eu-west-1"), 2);
}

#[tokio::test]
async fn test_no_resources_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::default().region(
        "us-east-1",
        "CreateRole",
        vec![LookupPage::new(
            vec![
                event("1", "a@x.com", "CreateRole", &[], "console.amazonaws.com"),
                event("2", "b@x.com", "CreateRole", &[], "terraform/1.6"),
            ],
            None,
        )],
    );
    let driver = RegionDriver::new(provider, config(dir.path(), &["CreateRole"]));

    let outcome = driver.run_region("us-east-1").await.unwrap();

    assert_eq!(outcome, RegionOutcome::NoRelevantEvents);
    assert!(csv_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_pagination_across_pages() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::default().region(
        "us-east-2",
        "CreateBucket",
        vec![
            LookupPage::new(vec![event("1", "a@x.com", "CreateBucket", &["b1"], "ua")], Some("t1".into())),
            LookupPage::new(vec![event("2", "a@x.com", "CreateBucket", &["b2"], "ua")], Some("t2".into())),
            LookupPage::new(vec![event("3", "b@x.com", "CreateBucket", &["b3"], "ua")], None),
        ],
    );
    let driver = RegionDriver::new(provider.clone(), config(dir.path(), &["CreateBucket"]));

    let outcome = driver.run_region("us-east-2").await.unwrap();

    assert!(matches!(outcome, RegionOutcome::Reported(_)));
    assert_eq!(provider.query_count("us-east-2"), 3);
    let user_agents = std::fs::read_to_string(dir.path().join("user-agents-us-east-2.csv")).unwrap();
    assert_eq!(user_agents, "user_agent,num_resources\nua,3\n");
}

#[tokio::test]
async fn test_malformed_payload_fails_region() {
    let dir = tempfile::tempdir().unwrap();
    let bad = Event::builder()
        .event_id("evt-bad")
        .username("a@x.com")
        .event_name("CreateBucket")
        .resources(Resource::builder().resource_type("AWS::S3::Bucket").resource_name("b").build())
        .cloud_trail_event(r#"{"eventName":"CreateBucket"}"#)
        .build();
    let provider = ScriptedProvider::default().region(
        "us-west-1",
        "CreateBucket",
        vec![LookupPage::new(vec![bad], None)],
    );
    let driver = RegionDriver::new(provider, config(dir.path(), &["CreateBucket"]))
        .with_region_catalog(regions(&["us-west-1"]));

    let selector = RegionSelector::parse("us-west-1", driver.region_catalog()).unwrap();
    let summary = driver.run(&selector).await;

    assert!(!summary.succeeded());
    assert_eq!(summary.failed(), 1);
    let err = summary.into_single_error().unwrap();
    assert!(matches!(err, ReportError::MalformedPayload { ref event_id, .. } if event_id == "evt-bad"));
    assert!(csv_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_all_mode_isolates_region_failures() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::default()
        .region(
            "us-east-1",
            "CreateKey",
            vec![LookupPage::new(vec![event("1", "ops@x.com", "CreateKey", &["key-1"], "Boto3/1.34")], None)],
        )
        .failing("ap-east-1");
    let driver = RegionDriver::new(provider, config(dir.path(), &["CreateKey"]))
        .with_region_catalog(regions(&["ap-east-1", "eu-north-1", "us-east-1"]));

    let selector = RegionSelector::parse("all", driver.region_catalog()).unwrap();
    let summary = driver.run(&selector).await;

    let order: Vec<&str> = summary.regions.iter().map(|r| r.region.as_str()).collect();
    assert_eq!(order, vec!["ap-east-1", "eu-north-1", "us-east-1"]);

    assert!(matches!(
        summary.regions[0].result,
        Err(ReportError::QueryFailure { ref action, .. }) if action == "CreateKey"
    ));
    assert!(matches!(summary.regions[1].result, Ok(RegionOutcome::NoEventsFound)));
    assert!(summary.regions[2].is_reported());

    assert!(summary.succeeded());
    assert_eq!(summary.reported(), 1);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.without_data(), 1);
    // Failures in all mode are not escalated
    assert!(summary.into_single_error().is_none());

    assert_eq!(
        csv_files(dir.path()),
        vec!["resources-us-east-1.csv", "user-agents-us-east-1.csv"]
    );
}

#[tokio::test]
async fn test_invalid_selector_rejected_before_queries() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::default();
    let driver = RegionDriver::new(provider.clone(), config(dir.path(), &["CreateBucket"]));

    let err = RegionSelector::parse("moon-1", driver.region_catalog()).unwrap_err();

    assert!(matches!(err, ReportError::InvalidRegion { .. }));
    assert!(provider.queries.lock().unwrap().is_empty());
}
