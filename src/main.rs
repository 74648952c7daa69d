#![warn(clippy::all, rust_2018_idioms)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::prelude::*;

use trailaudit::app::data_plane::cloudtrail_events::AwsLookupProvider;
use trailaudit::{RegionDriver, RegionSelector, ReportConfig};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_BRANCH"),
    "@",
    env!("GIT_COMMIT"),
    ")"
);

const DEFAULT_LOG_FILTER: &str = "trailaudit=info,aws_config=warn,aws_sigv4=warn,aws_smithy_runtime=warn,aws_smithy_runtime_api=warn,aws_smithy_http=warn,hyper=warn";

#[derive(Parser)]
#[command(name = "trailaudit")]
#[command(about = "Report who performed security-sensitive AWS actions, from CloudTrail event history.")]
#[command(version = VERSION)]
struct Cli {
    /// AWS region to process, or "all" for every supported region
    #[arg(short = 'r', long = "region", value_name = "REGION")]
    region: String,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory the CSV reports are written to
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Days of event history to query (1-90)
    #[arg(long)]
    lookback_days: Option<u32>,

    /// Named AWS profile for credentials
    #[arg(long)]
    profile: Option<String>,

    /// Regions processed at once with --region all
    #[arg(long)]
    region_concurrency: Option<usize>,

    /// Action lookups issued at once within a region
    #[arg(long)]
    action_concurrency: Option<usize>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut ReportConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(days) = self.lookback_days {
            config.lookback_days = days;
        }
        if let Some(profile) = &self.profile {
            config.profile = Some(profile.clone());
        }
        if let Some(n) = self.region_concurrency {
            config.region_concurrency = n;
        }
        if let Some(n) = self.action_concurrency {
            config.action_concurrency = n;
        }
    }
}

fn init_logging() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::builder().parse(DEFAULT_LOG_FILTER))
        .context("Failed to parse env filter")?;

    // Also log to a file when a data directory is available
    let file_layer = directories::ProjectDirs::from("com", "", "trailaudit").and_then(|proj_dirs| {
        let log_dir = proj_dirs.data_dir().join("logs");
        let _ = std::fs::create_dir_all(&log_dir);
        let log_path = log_dir.join("trailaudit.log");

        let file = match std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&log_path)
        {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Failed to open log file {:?}: {}", log_path, e);
                return None;
            }
        };

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(metadata) = file.metadata() {
                let mut perms = metadata.permissions();
                perms.set_mode(0o600);
                if let Err(e) = std::fs::set_permissions(&log_path, perms) {
                    eprintln!("[SECURITY] Failed to set log file permissions: {}", e);
                }
            }
        }

        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false),
        )
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    // Bridge log crate events (SDK client layer) to tracing
    tracing_log::LogTracer::init().context("Failed to initialize log-to-tracing bridge")?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging()?;

    tracing::info!("trailaudit {} starting", VERSION);

    let mut config = match &cli.config {
        Some(path) => ReportConfig::load_from_path(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => ReportConfig::default(),
    };
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    let provider = AwsLookupProvider::new(config.profile.clone());
    let driver = RegionDriver::new(provider, config);

    // Validate before any query is issued
    let selector = match RegionSelector::parse(&cli.region, driver.region_catalog()) {
        Ok(selector) => selector,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("invalid region! expected 'all' or one of: {}", driver.region_catalog().regions().join(", "));
            return Ok(ExitCode::from(2));
        }
    };

    let summary = driver.run(&selector).await;
    let succeeded = summary.succeeded();

    if let Some(err) = summary.into_single_error() {
        tracing::error!("Run failed: {:#}", anyhow::Error::new(err));
        return Ok(ExitCode::FAILURE);
    }

    tracing::info!("Done (success: {})", succeeded);
    Ok(ExitCode::SUCCESS)
}
