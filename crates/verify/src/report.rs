//! Outcomes, artifacts, and the run report
//!
//! Screenshots are the durable evidence trail: every checkpoint and every
//! failure writes a PNG under one directory with a name that is fixed per
//! scenario, so repeated runs overwrite instead of accumulating stale
//! artifacts. Failure diagnostics get their own name and never clobber a
//! checkpoint. The run report aggregates per-step records into JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::VerifyResult;

/// Writes PNG artifacts under a fixed directory.
#[derive(Debug, Clone)]
pub struct ArtifactSink {
    dir: PathBuf,
}

impl ArtifactSink {
    /// Creates the directory up front so a bad path fails before any
    /// scenario runs.
    pub fn new(dir: impl Into<PathBuf>) -> VerifyResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `<dir>/<name>.png`, replacing any previous run's file.
    pub fn save(&self, name: &str, png: &[u8]) -> VerifyResult<PathBuf> {
        let path = self.dir.join(format!("{}.png", slug(name)));
        std::fs::write(&path, png)?;
        info!("screenshot saved: {}", path.display());
        Ok(path)
    }

    /// Artifact name for a scenario's failure diagnostic, distinct from
    /// every checkpoint name.
    pub fn failure_name(scenario: &str) -> String {
        format!("{}_failure", slug(scenario))
    }
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Record of one executed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: String,
    pub success: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

/// Result of one scenario run. Produced once; scenarios are never retried.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub scenario: String,
    pub passed: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_screenshot: Option<PathBuf>,
    /// Error-level messages the page itself logged during the run.
    pub console_errors: usize,
}

/// Aggregate of a whole invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub base_url: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl RunReport {
    pub fn new(base_url: impl Into<String>, outcomes: Vec<ScenarioOutcome>) -> Self {
        let passed = outcomes.iter().filter(|o| o.passed).count();
        Self {
            started_at: Utc::now(),
            base_url: base_url.into(),
            total: outcomes.len(),
            passed,
            failed: outcomes.len() - passed,
            outcomes,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Writes `<dir>/report.json`.
    pub fn write(&self, dir: &Path) -> VerifyResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("report.json");
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        info!("report written: {}", path.display());
        Ok(path)
    }
}
