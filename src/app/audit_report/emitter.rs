//! CSV output for one region's tables.

#![warn(clippy::all, rust_2018_idioms)]

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use super::aggregator::{AggregationReport, CountTable, UserAgentStats};
use crate::app::error::{ReportError, Result};

/// Paths of the two files written for a region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub resources: PathBuf,
    pub user_agents: PathBuf,
}

impl ReportPaths {
    /// `resources-<region>.csv` and `user-agents-<region>.csv` under `dir`
    pub fn for_region(dir: &Path, region: &str) -> Self {
        Self {
            resources: dir.join(format!("resources-{}.csv", region)),
            user_agents: dir.join(format!("user-agents-{}.csv", region)),
        }
    }
}

/// Writes report CSVs into an output directory
#[derive(Debug, Clone)]
pub struct ReportEmitter {
    output_dir: PathBuf,
}

impl ReportEmitter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write both tables for `region`, creating the output directory if needed.
    ///
    /// Both files are staged next to their targets and only moved into place
    /// once both are complete. If the second move fails the first file is
    /// removed again, so a failed region leaves neither file behind.
    pub fn write(&self, region: &str, report: &AggregationReport) -> Result<ReportPaths> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| ReportError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let paths = ReportPaths::for_region(&self.output_dir, region);

        let mut resources = self.stage(&paths.resources)?;
        write_count_table(resources.as_file_mut(), &paths.resources, &report.counts)?;
        let mut user_agents = self.stage(&paths.user_agents)?;
        write_user_agents(user_agents.as_file_mut(), &paths.user_agents, &report.user_agents)?;

        persist(resources, &paths.resources)?;
        if let Err(e) = persist(user_agents, &paths.user_agents) {
            if let Err(remove_err) = std::fs::remove_file(&paths.resources) {
                warn!("Could not remove {:?}: {}", paths.resources, remove_err);
            }
            return Err(e);
        }

        info!(
            "Wrote {} identities to {:?} and {} user agents to {:?}",
            report.counts.identity_count(),
            paths.resources,
            report.user_agents.len(),
            paths.user_agents
        );
        Ok(paths)
    }

    /// Temporary file in the output directory for `target`
    fn stage(&self, target: &Path) -> Result<NamedTempFile> {
        tempfile::Builder::new()
            .prefix(".trailaudit-")
            .suffix(".csv.tmp")
            .tempfile_in(&self.output_dir)
            .map_err(|source| ReportError::Io {
                path: target.to_path_buf(),
                source,
            })
    }
}

fn persist(staged: NamedTempFile, target: &Path) -> Result<()> {
    staged
        .persist(target)
        .map(|_| ())
        .map_err(|e| ReportError::Io {
            path: target.to_path_buf(),
            source: e.error,
        })
}

/// Index column (unnamed) plus one column per surviving action; zero cells are blank
fn write_count_table<W: Write>(out: W, path: &Path, table: &CountTable) -> Result<()> {
    let emit_err = |source: csv::Error| ReportError::Emit {
        path: path.to_path_buf(),
        source,
    };

    let mut wtr = csv::Writer::from_writer(out);

    let mut header = Vec::with_capacity(table.columns().len() + 1);
    header.push(String::new());
    header.extend(table.columns().iter().cloned());
    wtr.write_record(&header).map_err(emit_err)?;

    for identity in table.identities() {
        let mut row = Vec::with_capacity(header.len());
        row.push(identity.to_string());
        for action in table.columns() {
            let count = table.get(identity, action);
            row.push(if count == 0 { String::new() } else { count.to_string() });
        }
        wtr.write_record(&row).map_err(emit_err)?;
    }

    wtr.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_user_agents<W: Write>(out: W, path: &Path, stats: &UserAgentStats) -> Result<()> {
    let emit_err = |source: csv::Error| ReportError::Emit {
        path: path.to_path_buf(),
        source,
    };

    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["user_agent", "num_resources"])
        .map_err(emit_err)?;

    for (user_agent, count) in stats.sorted() {
        wtr.write_record([user_agent, count.to_string().as_str()])
            .map_err(emit_err)?;
    }

    wtr.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
