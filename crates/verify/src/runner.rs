//! Scenario runner
//!
//! Executes a scenario's steps strictly in order against one session.
//! The first failing step stops the scenario: a diagnostic screenshot is
//! written, the failure is narrated, and a `fail` outcome is returned.
//! There are no retries — these are one-shot verification runs, and an
//! immediate, loud failure with a screenshot beats a masked regression.
//!
//! Environment errors (unreachable target, broken browser, artifact I/O)
//! propagate as `Err` and abort the whole invocation; timing and
//! assertion errors become `fail` outcomes for the scenario at hand.

use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::error::{VerifyError, VerifyResult};
use crate::report::{ArtifactSink, ScenarioOutcome, StepRecord};
use crate::scenario::{AttributeCheck, ElementState, Locator, Scenario, Step};
use crate::session::Session;
use crate::target::Target;
use crate::wait::{wait_until, WaitConfig};

/// Tunables shared by every step.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Default timeout for waits, asserts, and element actionability.
    pub step_timeout: Duration,
    /// Pause between keystrokes when typing.
    pub type_delay: Duration,
    /// Intermediate pointer positions in a drag.
    pub drag_steps: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(10),
            type_delay: Duration::from_millis(100),
            drag_steps: 8,
        }
    }
}

/// Runs scenarios and records their outcomes.
pub struct Runner {
    artifacts: ArtifactSink,
    config: RunnerConfig,
}

impl Runner {
    pub fn new(artifacts: ArtifactSink) -> Self {
        Self::with_config(artifacts, RunnerConfig::default())
    }

    pub fn with_config(artifacts: ArtifactSink, config: RunnerConfig) -> Self {
        Self { artifacts, config }
    }

    /// Executes one scenario. The caller owns the session and must
    /// release it on every path; `run` never consumes it.
    pub async fn run(
        &self,
        session: &Session,
        target: &dyn Target,
        scenario: &Scenario,
    ) -> VerifyResult<ScenarioOutcome> {
        let start = Instant::now();
        info!(scenario = %scenario.name, "running scenario");

        let mut records = Vec::with_capacity(scenario.steps.len());

        for step in &scenario.steps {
            let label = step.label();
            info!("  step: {label}");
            let step_start = Instant::now();

            match self.execute_step(session, target, step).await {
                Ok(screenshot) => {
                    records.push(StepRecord {
                        step: label,
                        success: true,
                        duration_ms: step_start.elapsed().as_millis() as u64,
                        error: None,
                        screenshot,
                    });
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let reason = format!("{label}: {e}");
                    error!(scenario = %scenario.name, "step failed: {reason}");

                    let diagnostic = self.capture_failure(session, &scenario.name).await?;
                    records.push(StepRecord {
                        step: label,
                        success: false,
                        duration_ms: step_start.elapsed().as_millis() as u64,
                        error: Some(e.to_string()),
                        screenshot: None,
                    });

                    return Ok(ScenarioOutcome {
                        scenario: scenario.name.clone(),
                        passed: false,
                        duration_ms: start.elapsed().as_millis() as u64,
                        steps: records,
                        failure: Some(reason),
                        failure_screenshot: diagnostic,
                        console_errors: session.console().error_count(),
                    });
                }
            }
        }

        info!(
            scenario = %scenario.name,
            duration_ms = start.elapsed().as_millis() as u64,
            "scenario passed"
        );

        Ok(ScenarioOutcome {
            scenario: scenario.name.clone(),
            passed: true,
            duration_ms: start.elapsed().as_millis() as u64,
            steps: records,
            failure: None,
            failure_screenshot: None,
            console_errors: session.console().error_count(),
        })
    }

    /// Best-effort diagnostic screenshot at the point of failure. Only an
    /// artifact-write error is fatal; a broken page that cannot be
    /// screenshotted must not mask the original failure.
    async fn capture_failure(
        &self,
        session: &Session,
        scenario: &str,
    ) -> VerifyResult<Option<std::path::PathBuf>> {
        match session.screenshot(false).await {
            Ok(png) => {
                let path = self.artifacts.save(&ArtifactSink::failure_name(scenario), &png)?;
                Ok(Some(path))
            }
            Err(e) => {
                error!("diagnostic screenshot failed: {e}");
                Ok(None)
            }
        }
    }

    async fn execute_step(
        &self,
        session: &Session,
        target: &dyn Target,
        step: &Step,
    ) -> VerifyResult<Option<std::path::PathBuf>> {
        match step {
            Step::Navigate { path, wait_for } => {
                session.navigate(&target.url(path)).await?;
                if let Some(locator) = wait_for {
                    self.await_state(session, locator, ElementState::Visible, None)
                        .await?;
                }
                Ok(None)
            }

            Step::WaitFor {
                locator,
                state,
                timeout_ms,
            } => {
                self.await_state(session, locator, *state, *timeout_ms)
                    .await?;
                Ok(None)
            }

            Step::Click { locator } => {
                let (x, y) = self.actionable_center(session, locator).await?;
                session.click_at(x, y).await?;
                Ok(None)
            }

            Step::TypeText {
                locator,
                text,
                delay_ms,
            } => {
                let (x, y) = self.actionable_center(session, locator).await?;
                session.click_at(x, y).await?;
                let delay = delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(self.config.type_delay);
                session.type_chars(text, delay).await?;
                Ok(None)
            }

            Step::Press { key } => {
                session.press_key(key).await?;
                Ok(None)
            }

            Step::Hover { locator } => {
                let (x, y) = self.actionable_center(session, locator).await?;
                session.move_mouse(x, y).await?;
                Ok(None)
            }

            Step::ScrollBy { x, y } => {
                session.scroll_by(*x, *y).await?;
                Ok(None)
            }

            Step::Drag { source, target } => {
                let from = self.actionable_center(session, source).await?;
                let to = self.actionable_center(session, target).await?;
                session.drag(from, to, self.config.drag_steps).await?;
                Ok(None)
            }

            Step::Assert {
                locator,
                visible,
                text_equals,
                text_contains,
                attribute,
            } => {
                self.assert_element(
                    session,
                    locator,
                    *visible,
                    text_equals.as_deref(),
                    text_contains.as_deref(),
                    attribute.as_ref(),
                )
                .await?;
                Ok(None)
            }

            Step::Capture { name, full_page } => {
                let png = session.screenshot(*full_page).await?;
                let path = self.artifacts.save(name, &png)?;
                Ok(Some(path))
            }
        }
    }

    /// Waits until the locator reaches the requested state.
    async fn await_state(
        &self,
        session: &Session,
        locator: &Locator,
        state: ElementState,
        timeout_ms: Option<u64>,
    ) -> VerifyResult<()> {
        let timeout = timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.config.step_timeout);
        let description = match state {
            ElementState::Visible => format!("{locator} to be visible"),
            ElementState::Hidden => format!("{locator} to be hidden"),
        };

        wait_until(
            move || async move {
                let resolved = session.resolve(locator).await?;
                Ok(match state {
                    ElementState::Visible => resolved.is_some_and(|r| r.visible),
                    ElementState::Hidden => !resolved.is_some_and(|r| r.visible),
                })
            },
            WaitConfig::with_timeout(timeout),
            &description,
        )
        .await
    }

    /// Waits for the element to be visible and returns its center, so
    /// pointer actions land on something that is actually on screen.
    async fn actionable_center(
        &self,
        session: &Session,
        locator: &Locator,
    ) -> VerifyResult<(f64, f64)> {
        self.await_state(session, locator, ElementState::Visible, None)
            .await?;
        let resolved = session.resolve_required(locator).await?;
        Ok((resolved.center_x, resolved.center_y))
    }

    /// Polls the assertion conditions; a timeout becomes an assertion
    /// failure with a description of what was expected.
    async fn assert_element(
        &self,
        session: &Session,
        locator: &Locator,
        visible: Option<bool>,
        text_equals: Option<&str>,
        text_contains: Option<&str>,
        attribute: Option<&AttributeCheck>,
    ) -> VerifyResult<()> {
        let mut expectations = Vec::new();
        match visible {
            Some(true) => expectations.push("visible".to_string()),
            Some(false) => expectations.push("not visible".to_string()),
            None => {}
        }
        if let Some(text) = text_equals {
            expectations.push(format!("text '{text}'"));
        }
        if let Some(text) = text_contains {
            expectations.push(format!("text containing '{text}'"));
        }
        if let Some(attr) = attribute {
            expectations.push(format!("{}='{}'", attr.name, attr.value));
        }
        let description = format!("{locator} to be {}", expectations.join(" and "));

        let result = wait_until(
            move || async move {
                let resolved = session.resolve(locator).await?;

                if let Some(expected) = visible {
                    let is_visible = resolved.as_ref().is_some_and(|r| r.visible);
                    if is_visible != expected {
                        return Ok(false);
                    }
                }

                if let Some(text) = text_equals {
                    match &resolved {
                        Some(r) if r.text == text => {}
                        _ => return Ok(false),
                    }
                }

                if let Some(text) = text_contains {
                    match &resolved {
                        Some(r) if r.text.contains(text) => {}
                        _ => return Ok(false),
                    }
                }

                if let Some(attr) = attribute {
                    let actual = session.attribute(locator, &attr.name).await?;
                    if actual.as_deref() != Some(attr.value.as_str()) {
                        return Ok(false);
                    }
                }

                Ok(true)
            },
            WaitConfig::with_timeout(self.config.step_timeout),
            &description,
        )
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(VerifyError::WaitTimeout { condition, .. }) => {
                Err(VerifyError::AssertionFailed(format!("expected {condition}")))
            }
            Err(e) => Err(e),
        }
    }
}
