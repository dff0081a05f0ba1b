//! marXiv UI verification harness
//!
//! Drives headless Chromium over CDP against a locally running marXiv
//! instance and checks a handful of UI behaviors: category filtering, the
//! mobile navigation drawer, note drag-and-drop reordering, and theme and
//! font switching. Screenshots land in a fixed directory as the evidence
//! trail; a JSON report aggregates the outcomes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Verification run                     │
//! ├──────────────────────────────────────────────────────────┤
//! │  Runner                                                  │
//! │    ├── Session (one Chromium process + one page)         │
//! │    ├── Target  (base URL + reachability probe)           │
//! │    ├── Scenario { name, viewport, steps: [Step] }        │
//! │    │     navigate / wait_for / click / type_text /       │
//! │    │     press / hover / scroll_by / drag / assert /     │
//! │    │     capture                                         │
//! │    └── ArtifactSink + RunReport                          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps execute strictly in order; the first failure stops the scenario,
//! writes a diagnostic screenshot, and is reported without retry. Every
//! wait is condition-based with an explicit timeout.

pub mod console;
pub mod error;
pub mod locate;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod scenarios;
pub mod session;
pub mod target;
pub mod wait;

pub use error::{VerifyError, VerifyResult};
pub use report::{ArtifactSink, RunReport, ScenarioOutcome};
pub use runner::{Runner, RunnerConfig};
pub use scenario::{Locator, Scenario, Step, Viewport};
pub use session::{Session, SessionConfig};
pub use target::{StaticTarget, Target};
