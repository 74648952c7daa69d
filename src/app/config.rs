//! Report configuration.
//!
//! Settings come from built-in defaults, an optional TOML file and command
//! line overrides, in that order of precedence (lowest first).
//!
//! # Config file format
//!
//! ```toml
//! lookback_days = 30
//! page_size = 50
//! output_dir = "reports"
//! region_concurrency = 4
//! action_concurrency = 1
//! profile = "audit"
//! actions = ["CreateBucket", "CreateRole"]
//! ```
//!
//! Every key is optional.

#![warn(clippy::all, rust_2018_idioms)]

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::audit_report::catalog::ActionCatalog;
use super::error::{ReportError, Result};

/// Longest window the CloudTrail event history can serve
pub const MAX_LOOKBACK_DAYS: u32 = 90;

/// Largest page LookupEvents will return
pub const MAX_PAGE_SIZE: i32 = 50;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Days of event history to query, ending now
    pub lookback_days: u32,

    /// Events per LookupEvents page
    pub page_size: i32,

    /// Directory the CSV reports are written to
    pub output_dir: PathBuf,

    /// Regions processed at once in `all` mode
    pub region_concurrency: usize,

    /// Action lookup streams issued at once within a region
    pub action_concurrency: usize,

    /// Named AWS profile used for credential resolution
    pub profile: Option<String>,

    /// Replacement for the built-in action catalog
    pub actions: Option<Vec<String>>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            lookback_days: MAX_LOOKBACK_DAYS,
            page_size: MAX_PAGE_SIZE,
            output_dir: PathBuf::from("."),
            region_concurrency: 4,
            action_concurrency: 1,
            profile: None,
            actions: None,
        }
    }
}

impl ReportConfig {
    /// Load a configuration file. The result is validated.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let contents = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: ReportConfig =
            toml::from_str(&contents).map_err(|e| ReportError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        debug!(
            "Loaded report config from {:?}: lookback_days={}, page_size={}, output_dir={:?}",
            path, config.lookback_days, config.page_size, config.output_dir
        );

        config.validate_at(path)?;
        Ok(config)
    }

    /// Reject values CloudTrail or the scheduler cannot honour.
    pub fn validate(&self) -> Result<()> {
        self.validate_at(Path::new("<command line>"))
    }

    fn validate_at(&self, origin: &Path) -> Result<()> {
        let invalid = |message: String| ReportError::Config {
            path: origin.to_path_buf(),
            message,
        };

        if self.lookback_days == 0 || self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(invalid(format!(
                "lookback_days must be between 1 and {}, got {}",
                MAX_LOOKBACK_DAYS, self.lookback_days
            )));
        }
        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            return Err(invalid(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if self.region_concurrency == 0 {
            return Err(invalid("region_concurrency must be at least 1".to_string()));
        }
        if self.action_concurrency == 0 {
            return Err(invalid("action_concurrency must be at least 1".to_string()));
        }
        if let Some(actions) = &self.actions {
            if actions.is_empty() || actions.iter().any(|a| a.trim().is_empty()) {
                return Err(invalid(
                    "actions must list at least one non-empty action name".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Action catalog for this run: the configured override or the built-in list.
    pub fn action_catalog(&self) -> ActionCatalog {
        match &self.actions {
            Some(actions) => ActionCatalog::new(actions.iter().map(|a| a.trim().to_string())),
            None => ActionCatalog::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ReportConfig::default();
        assert_eq!(config.lookback_days, 90);
        assert_eq!(config.page_size, 50);
        assert!(config.validate().is_ok());
        assert_eq!(config.action_catalog(), ActionCatalog::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config("lookback_days = 7\noutput_dir = \"reports\"\n");
        let config = ReportConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.lookback_days, 7);
        assert_eq!(config.output_dir, PathBuf::from("reports"));
        assert_eq!(config.page_size, 50);
        assert_eq!(config.region_concurrency, 4);
    }

    #[test]
    fn test_actions_override_catalog() {
        let file = write_config("actions = [\"CreateRole\", \"CreateBucket\"]\n");
        let config = ReportConfig::load_from_path(file.path()).unwrap();
        let catalog = config.action_catalog();
        assert_eq!(catalog.actions(), &["CreateRole", "CreateBucket"]);
    }

    #[test]
    fn test_out_of_range_lookback_rejected() {
        let file = write_config("lookback_days = 120\n");
        let err = ReportConfig::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ReportError::Config { .. }));
        assert!(format!("{}", err).contains("lookback_days"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let file = write_config("page_sise = 10\n");
        let err = ReportConfig::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ReportError::Config { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ReportConfig::load_from_path("/nonexistent/trailaudit.toml").unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = ReportConfig {
            region_concurrency: 0,
            ..ReportConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
