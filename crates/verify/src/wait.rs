//! Condition polling with timeouts
//!
//! Every wait in a scenario is an observable condition checked on an
//! interval, never a bare sleep. Transient evaluation errors (a page
//! mid-navigation, a detached node) count as "not yet" and the poll
//! continues until the deadline.

use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::error::{VerifyError, VerifyResult};

/// Default timeout for condition waits (10 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How often conditions are re-checked (100ms).
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Timeout and poll interval for one wait.
#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: POLL_INTERVAL,
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }
}

/// Polls `condition` until it reports true or the timeout expires.
///
/// The condition may fail transiently; errors are treated the same as a
/// false result and the deadline is what terminates the loop.
pub async fn wait_until<F, Fut>(
    condition: F,
    config: WaitConfig,
    description: &str,
) -> VerifyResult<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = VerifyResult<bool>>,
{
    let start = Instant::now();

    loop {
        if matches!(condition().await, Ok(true)) {
            return Ok(());
        }

        if start.elapsed() >= config.timeout {
            return Err(VerifyError::WaitTimeout {
                condition: description.to_string(),
                timeout: config.timeout,
            });
        }

        sleep(config.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn succeeds_immediately() {
        let result = wait_until(|| async { Ok(true) }, WaitConfig::default(), "always true").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn succeeds_after_a_few_polls() {
        let tries = Arc::new(AtomicU32::new(0));
        let tries_clone = tries.clone();

        let result = wait_until(
            move || {
                let t = tries_clone.clone();
                async move { Ok(t.fetch_add(1, Ordering::SeqCst) >= 3) }
            },
            WaitConfig {
                timeout: Duration::from_secs(5),
                poll_interval: Duration::from_millis(10),
            },
            "counter reaches 3",
        )
        .await;

        assert!(result.is_ok());
        assert!(tries.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn times_out_with_description() {
        let result = wait_until(
            || async { Ok(false) },
            WaitConfig {
                timeout: Duration::from_millis(80),
                poll_interval: Duration::from_millis(10),
            },
            "element 'h1'",
        )
        .await;

        match result {
            Err(VerifyError::WaitTimeout { condition, .. }) => {
                assert_eq!(condition, "element 'h1'");
            }
            other => panic!("expected WaitTimeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transient_errors_keep_polling() {
        let tries = Arc::new(AtomicU32::new(0));
        let tries_clone = tries.clone();

        let result = wait_until(
            move || {
                let t = tries_clone.clone();
                async move {
                    if t.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(VerifyError::Script("context destroyed".into()))
                    } else {
                        Ok(true)
                    }
                }
            },
            WaitConfig {
                timeout: Duration::from_secs(5),
                poll_interval: Duration::from_millis(10),
            },
            "survives transient errors",
        )
        .await;

        assert!(result.is_ok());
    }
}
