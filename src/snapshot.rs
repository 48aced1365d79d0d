use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::graph::WebSnapshot;
use crate::session::SessionReport;

/// Writes web snapshots under `<dir>/<scenario>/step_NNNN.json`, one file
/// every `every` steps. An interval of 0 disables writing entirely.
pub struct SnapshotWriter {
    dir: PathBuf,
    every: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, every: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            every,
        }
    }

    pub fn maybe_write(&self, snapshot: &WebSnapshot) -> Result<Option<PathBuf>> {
        if self.every == 0 || snapshot.step % self.every != 0 {
            return Ok(None);
        }
        let dir = self.scenario_dir(&snapshot.scenario)?;
        let path = dir.join(format!("step_{:04}.json", snapshot.step));
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        Ok(Some(path))
    }

    pub fn write_report(&self, report: &SessionReport) -> Result<PathBuf> {
        let dir = self.scenario_dir(&report.scenario)?;
        let path = dir.join("report.json");
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(path)
    }

    fn scenario_dir(&self, scenario: &str) -> Result<PathBuf> {
        let dir = self.dir.join(scenario);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        Ok(dir)
    }
}
