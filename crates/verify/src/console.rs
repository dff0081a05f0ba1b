//! Page console capture
//!
//! The original verification flow narrates the page's own console output
//! while it runs; keeping the messages around also lets a failure report
//! say whether the page itself logged errors. Messages arrive on the CDP
//! event stream and are accumulated in arrival order.

use chromiumoxide::cdp::js_protocol::runtime::{ConsoleApiCalledType, EventConsoleApiCalled};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Console message severity, mapped from the JavaScript console API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleLevel {
    Log,
    Info,
    Warning,
    Error,
    Debug,
    Other,
}

impl From<&EventConsoleApiCalled> for ConsoleLevel {
    fn from(event: &EventConsoleApiCalled) -> Self {
        match event.r#type {
            ConsoleApiCalledType::Log => ConsoleLevel::Log,
            ConsoleApiCalledType::Info => ConsoleLevel::Info,
            ConsoleApiCalledType::Warning => ConsoleLevel::Warning,
            ConsoleApiCalledType::Error => ConsoleLevel::Error,
            ConsoleApiCalledType::Debug => ConsoleLevel::Debug,
            _ => ConsoleLevel::Other,
        }
    }
}

/// One captured console message.
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub text: String,
}

/// Thread-safe console accumulator, cheaply cloneable into the CDP event
/// task.
#[derive(Debug, Clone, Default)]
pub struct ConsoleCapture {
    messages: Arc<Mutex<Vec<ConsoleMessage>>>,
}

impl ConsoleCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message and narrates it. A poisoned lock drops the
    /// message; the panic that poisoned it is the real failure.
    pub(crate) fn push(&self, message: ConsoleMessage) {
        debug!(level = ?message.level, "browser console: {}", message.text);
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message);
        }
    }

    /// Snapshot of all captured messages.
    pub fn messages(&self) -> Vec<ConsoleMessage> {
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of error-level messages seen so far.
    pub fn error_count(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|m| m.level == ConsoleLevel::Error)
            .count()
    }
}

/// Converts a CDP console event into a [`ConsoleMessage`]; the call's
/// arguments are joined with spaces.
pub(crate) fn parse_console_event(event: &EventConsoleApiCalled) -> ConsoleMessage {
    let text = event
        .args
        .iter()
        .map(|arg| {
            arg.value
                .as_ref()
                .and_then(|v| v.as_str())
                .unwrap_or("<object>")
                .to_string()
        })
        .collect::<Vec<_>>()
        .join(" ");

    ConsoleMessage {
        level: ConsoleLevel::from(event),
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_in_order() {
        let capture = ConsoleCapture::new();
        capture.push(ConsoleMessage {
            level: ConsoleLevel::Log,
            text: "hydrated".into(),
        });
        capture.push(ConsoleMessage {
            level: ConsoleLevel::Error,
            text: "failed to fetch".into(),
        });

        let messages = capture.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "hydrated");
        assert_eq!(capture.error_count(), 1);
    }

    #[test]
    fn error_count_ignores_other_levels() {
        let capture = ConsoleCapture::new();
        for level in [ConsoleLevel::Log, ConsoleLevel::Warning, ConsoleLevel::Debug] {
            capture.push(ConsoleMessage {
                level,
                text: "noise".into(),
            });
        }
        assert_eq!(capture.error_count(), 0);
    }
}
