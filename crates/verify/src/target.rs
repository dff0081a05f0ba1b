//! Target application boundary
//!
//! The application under test is an external collaborator: an HTTP server
//! assumed to be running already. Scenarios never start or stop it; they
//! only need its base URL and a fail-fast reachability probe before any
//! browser work begins.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{VerifyError, VerifyResult};

/// A running instance of the application under test.
#[async_trait]
pub trait Target: Send + Sync {
    /// Base URL without a trailing slash.
    fn base_url(&self) -> &str;

    /// Fails when the target is unreachable. Called once per run, before
    /// launching a browser, so an absent server aborts immediately.
    async fn health_check(&self) -> VerifyResult<()>;

    /// Joins a path onto the base URL.
    fn url(&self, path: &str) -> String {
        let base = self.base_url().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }
}

/// A target at a fixed, externally managed address.
#[derive(Debug, Clone)]
pub struct StaticTarget {
    base_url: String,
    probe_timeout: Duration,
}

impl StaticTarget {
    pub fn new(base_url: impl Into<String>) -> VerifyResult<Self> {
        let base_url = base_url.into();
        url::Url::parse(&base_url).map_err(|e| VerifyError::TargetUnreachable {
            url: base_url.clone(),
            reason: format!("invalid base URL: {e}"),
        })?;

        Ok(Self {
            base_url,
            probe_timeout: Duration::from_secs(5),
        })
    }
}

#[async_trait]
impl Target for StaticTarget {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn health_check(&self) -> VerifyResult<()> {
        let client = reqwest::Client::builder()
            .timeout(self.probe_timeout)
            .build()?;

        let response = client.get(&self.base_url).send().await.map_err(|e| {
            VerifyError::TargetUnreachable {
                url: self.base_url.clone(),
                reason: e.to_string(),
            }
        })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(VerifyError::TargetUnreachable {
                url: self.base_url.clone(),
                reason: format!("HTTP {}", response.status()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joining() {
        let target = StaticTarget::new("http://localhost:4321").unwrap();
        assert_eq!(target.url("/categories"), "http://localhost:4321/categories");
        assert_eq!(target.url("categories"), "http://localhost:4321/categories");
        assert_eq!(
            target.url("/paper/2106.09685"),
            "http://localhost:4321/paper/2106.09685"
        );
        assert_eq!(target.url("/"), "http://localhost:4321");
        assert_eq!(target.url(""), "http://localhost:4321");

        let with_slash = StaticTarget::new("http://localhost:4321/").unwrap();
        assert_eq!(with_slash.url("/categories"), "http://localhost:4321/categories");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(StaticTarget::new("not a url").is_err());
        assert!(StaticTarget::new("").is_err());
    }

    #[tokio::test]
    async fn health_check_fails_on_unreachable_port() {
        // Nothing listens on this port in the test environment.
        let target = StaticTarget::new("http://127.0.0.1:9").unwrap();
        let err = target.health_check().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
