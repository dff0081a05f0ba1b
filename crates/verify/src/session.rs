//! Browser session management
//!
//! A [`Session`] is one headless Chromium process plus one page context,
//! scoped to a single scenario run. `launch` returns only once the process
//! is up, the CDP event handler is running, and the page exists with the
//! requested viewport applied. `close` is idempotent; if it is never
//! called, dropping the session kills the process.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::console::{parse_console_event, ConsoleCapture};
use crate::error::{VerifyError, VerifyResult};
use crate::locate::{self, ResolvedElement};
use crate::scenario::{Locator, Viewport};
use crate::wait::{wait_until, WaitConfig};

/// How a session's browser is launched.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub headless: bool,
    pub viewport: Viewport,
    /// Chromium executable; auto-detected when unset.
    pub chrome_path: Option<String>,
    /// Extra Chromium arguments on top of the defaults.
    pub extra_args: Vec<String>,
    /// Timeout applied to individual CDP requests.
    pub request_timeout: Duration,
}

impl SessionConfig {
    pub fn with_viewport(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport {
                width: 1280,
                height: 720,
            },
            chrome_path: None,
            extra_args: Vec::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A launched browser with one page context.
pub struct Session {
    browser: Option<Browser>,
    page: Page,
    console: ConsoleCapture,
    _handler_task: JoinHandle<()>,
    _console_task: JoinHandle<()>,
}

impl Session {
    /// Launches Chromium and prepares the page context.
    ///
    /// A launch failure is fatal and not retried; no partially
    /// initialized session is ever returned.
    pub async fn launch(config: SessionConfig) -> VerifyResult<Self> {
        let mut builder = BrowserConfig::builder()
            .viewport(CdpViewport {
                width: config.viewport.width,
                height: config.viewport.height,
                device_scale_factor: Some(1.0),
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            })
            .request_timeout(config.request_timeout);

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        // A unique profile directory per launch avoids ProcessSingleton
        // conflicts when several verifications run on the same machine.
        let user_data_dir = std::env::temp_dir().join(format!("marxiv-verify-{}", uuid::Uuid::new_v4()));
        builder = builder
            .arg(format!("--user-data-dir={}", user_data_dir.display()))
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        for arg in &config.extra_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| VerifyError::Launch(format!("invalid browser configuration: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| VerifyError::Launch(format!("failed to start Chromium: {e}")))?;

        // Drive the CDP connection; chromiumoxide processes no events
        // without this loop.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler event error: {e}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| VerifyError::Launch(format!("failed to open page: {e}")))?;

        // Pin the viewport on the page itself; the browser-level setting
        // is not always applied to new targets.
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(config.viewport.width))
            .height(i64::from(config.viewport.height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(VerifyError::Cdp)?;
        page.execute(metrics)
            .await
            .map_err(|e| VerifyError::Cdp(e.to_string()))?;

        let console = ConsoleCapture::new();
        let console_sink = console.clone();
        let console_page = page.clone();
        let console_task = tokio::spawn(async move {
            if let Ok(mut events) = console_page.event_listener::<EventConsoleApiCalled>().await {
                while let Some(event) = events.next().await {
                    console_sink.push(parse_console_event(&event));
                }
            }
        });

        debug!(
            width = config.viewport.width,
            height = config.viewport.height,
            headless = config.headless,
            "browser session ready"
        );

        Ok(Self {
            browser: Some(browser),
            page,
            console,
            _handler_task: handler_task,
            _console_task: console_task,
        })
    }

    /// Captured page console output for this session.
    pub fn console(&self) -> &ConsoleCapture {
        &self.console
    }

    /// Navigates and waits for the document to be fully loaded.
    pub async fn navigate(&self, url: &str) -> VerifyResult<()> {
        self.page.goto(url).await.map_err(|e| VerifyError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        // Network-idle wait first, then confirm readyState; hydration
        // beyond that is a scenario-level wait on a concrete element.
        let _ = self.page.wait_for_navigation().await;
        self.wait_for_ready(WaitConfig::default()).await
    }

    async fn wait_for_ready(&self, config: WaitConfig) -> VerifyResult<()> {
        wait_until(
            move || async move {
                let state: String = self.evaluate("document.readyState").await?;
                Ok(state == "complete")
            },
            config,
            "document ready",
        )
        .await
    }

    /// Evaluates JavaScript and deserializes the result.
    pub async fn evaluate<T>(&self, js: &str) -> VerifyResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.page
            .evaluate(js)
            .await
            .map_err(|e| VerifyError::Script(e.to_string()))?
            .into_value()
            .map_err(|e| VerifyError::Script(e.to_string()))
    }

    /// Resolves a locator against the current DOM. `None` when nothing
    /// matches.
    pub async fn resolve(&self, locator: &Locator) -> VerifyResult<Option<ResolvedElement>> {
        let value: Value = self.evaluate(&locate::resolution_js(locator)).await?;
        Ok(locate::parse_resolution(&value))
    }

    /// Resolves a locator, failing when it matches nothing.
    pub async fn resolve_required(&self, locator: &Locator) -> VerifyResult<ResolvedElement> {
        self.resolve(locator)
            .await?
            .ok_or_else(|| VerifyError::ElementNotFound(locator.to_string()))
    }

    /// Reads an attribute off the matched element.
    pub async fn attribute(&self, locator: &Locator, name: &str) -> VerifyResult<Option<String>> {
        let value: Value = self.evaluate(&locate::attribute_js(locator, name)).await?;
        Ok(value.as_str().map(str::to_string))
    }

    /// Clicks at page coordinates with trusted mouse events.
    pub async fn click_at(&self, x: f64, y: f64) -> VerifyResult<()> {
        self.dispatch_mouse(DispatchMouseEventType::MousePressed, x, y, true)
            .await?;
        self.dispatch_mouse(DispatchMouseEventType::MouseReleased, x, y, true)
            .await
    }

    /// Moves the pointer to page coordinates.
    pub async fn move_mouse(&self, x: f64, y: f64) -> VerifyResult<()> {
        self.dispatch_mouse(DispatchMouseEventType::MouseMoved, x, y, false)
            .await
    }

    /// Drags from one point to another as one grab/move/release unit.
    pub async fn drag(&self, from: (f64, f64), to: (f64, f64), steps: u32) -> VerifyResult<()> {
        self.dispatch_mouse(DispatchMouseEventType::MouseMoved, from.0, from.1, false)
            .await?;
        self.dispatch_mouse(DispatchMouseEventType::MousePressed, from.0, from.1, true)
            .await?;

        let steps = steps.max(1);
        for i in 1..=steps {
            let t = f64::from(i) / f64::from(steps);
            let x = from.0 + (to.0 - from.0) * t;
            let y = from.1 + (to.1 - from.1) * t;
            self.dispatch_mouse(DispatchMouseEventType::MouseMoved, x, y, true)
                .await?;
            tokio::time::sleep(Duration::from_millis(30)).await;
        }

        self.dispatch_mouse(DispatchMouseEventType::MouseReleased, to.0, to.1, true)
            .await
    }

    async fn dispatch_mouse(
        &self,
        kind: DispatchMouseEventType,
        x: f64,
        y: f64,
        left_button: bool,
    ) -> VerifyResult<()> {
        let mut builder = DispatchMouseEventParams::builder().r#type(kind).x(x).y(y);
        if left_button {
            builder = builder.button(MouseButton::Left).click_count(1);
        }
        let params = builder.build().map_err(VerifyError::Cdp)?;
        self.page
            .execute(params)
            .await
            .map_err(|e| VerifyError::Cdp(e.to_string()))?;
        Ok(())
    }

    /// Types text one character at a time so per-keystroke handlers fire.
    pub async fn type_chars(&self, text: &str, delay: Duration) -> VerifyResult<()> {
        for c in text.chars() {
            for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
                let params = DispatchKeyEventParams::builder()
                    .r#type(kind)
                    .text(c.to_string())
                    .build()
                    .map_err(VerifyError::Cdp)?;
                self.page
                    .execute(params)
                    .await
                    .map_err(|e| VerifyError::Cdp(e.to_string()))?;
            }
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    /// Presses a named key on the focused element.
    pub async fn press_key(&self, key: &str) -> VerifyResult<()> {
        let (code, vk, text) = match key {
            "Enter" => ("Enter", 13, Some("\r")),
            "Escape" => ("Escape", 27, None),
            "Tab" => ("Tab", 9, None),
            other => (other, 0, None),
        };

        for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            let is_down = matches!(&kind, DispatchKeyEventType::KeyDown);
            let mut builder = DispatchKeyEventParams::builder()
                .r#type(kind)
                .key(key)
                .code(code)
                .windows_virtual_key_code(vk);
            if is_down {
                if let Some(text) = text {
                    builder = builder.text(text);
                }
            }
            let params = builder.build().map_err(VerifyError::Cdp)?;
            self.page
                .execute(params)
                .await
                .map_err(|e| VerifyError::Cdp(e.to_string()))?;
        }
        Ok(())
    }

    /// Scrolls the window by a pixel offset.
    pub async fn scroll_by(&self, x: i64, y: i64) -> VerifyResult<()> {
        let _: Value = self
            .evaluate(&format!("(() => {{ window.scrollBy({x}, {y}); return true; }})()"))
            .await?;
        Ok(())
    }

    /// Takes a PNG screenshot of the viewport or the full page.
    pub async fn screenshot(&self, full_page: bool) -> VerifyResult<Vec<u8>> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(full_page)
                    .build(),
            )
            .await
            .map_err(|e| VerifyError::Cdp(format!("screenshot failed: {e}")))
    }

    /// Shuts the browser down gracefully. Safe to skip; `Drop` kills the
    /// process as a fallback.
    pub async fn close(mut self) -> VerifyResult<()> {
        if let Some(mut browser) = self.browser.take() {
            debug!("closing browser session");
            browser
                .close()
                .await
                .map_err(|e| VerifyError::Cdp(e.to_string()))?;
            let _ = browser.wait().await;
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Async close cannot run here; chromiumoxide's Browser::drop
        // kills the process, so nothing leaks even on panic.
        if self.browser.is_some() {
            warn!("session dropped without close(); Chromium will be killed");
        }
    }
}
