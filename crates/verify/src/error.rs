//! Error types for verification runs

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Target unreachable at {url}: {reason}")]
    TargetUnreachable { url: String, reason: String },

    #[error("Navigation to '{url}' failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Timed out after {timeout:?} waiting for {condition}")]
    WaitTimeout { condition: String, timeout: Duration },

    #[error("No element matched {0}")]
    ElementNotFound(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("JavaScript evaluation failed: {0}")]
    Script(String),

    #[error("CDP error: {0}")]
    Cdp(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl VerifyError {
    /// Environment errors abort the whole run; everything else is a
    /// verification failure reported against the current scenario.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VerifyError::Launch(_)
                | VerifyError::TargetUnreachable { .. }
                | VerifyError::Io(_)
                | VerifyError::ScenarioParse(_)
                | VerifyError::Yaml(_)
        )
    }
}

pub type VerifyResult<T> = Result<T, VerifyError>;
