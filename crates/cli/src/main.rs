//! marXiv verification entry point
//!
//! Runs the built-in scenarios (or a YAML directory of scenarios) against
//! a marXiv instance that is already serving. Exit code 0 when every
//! scenario passes, 1 when any fails, 2 on an environment error.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use marxiv_verify::{
    scenarios, ArtifactSink, RunReport, Runner, RunnerConfig, Scenario, Session, SessionConfig,
    StaticTarget, Target, VerifyError, VerifyResult, Viewport,
};

#[derive(Parser, Debug)]
#[command(name = "marxiv-verify")]
#[command(about = "Browser verification for the marXiv UI")]
struct Args {
    /// Base URL of the running marXiv instance
    #[arg(long, default_value = "http://localhost:4321", env = "MARXIV_BASE_URL")]
    base_url: String,

    /// Run only the scenario with this name
    #[arg(short, long)]
    scenario: Option<String>,

    /// Load scenarios from a directory of YAML files instead of the
    /// built-ins
    #[arg(long)]
    scenarios_dir: Option<PathBuf>,

    /// Directory for screenshots and the JSON report
    #[arg(short, long, default_value = "verification")]
    output: PathBuf,

    /// Show the browser window instead of running headless
    #[arg(long)]
    headed: bool,

    /// Chromium executable (auto-detected when omitted)
    #[arg(long)]
    chrome: Option<String>,

    /// Default per-step timeout in seconds
    #[arg(long, default_value = "10")]
    step_timeout: u64,

    /// Override every scenario's viewport, as WIDTHxHEIGHT (e.g. 1920x1080)
    #[arg(long, value_name = "WxH", value_parser = parse_viewport)]
    viewport: Option<Viewport>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG still wins
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// List the selected scenarios and exit
    #[arg(long)]
    list: bool,
}

fn parse_viewport(value: &str) -> Result<Viewport, String> {
    let lowered = value.to_ascii_lowercase();
    let (width, height) = lowered
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{width}'"))?;
    let height = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{height}'"))?;
    Ok(Viewport { width, height })
}

fn main() {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    match rt.block_on(run(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}

async fn run(args: Args) -> VerifyResult<bool> {
    let mut selected = match &args.scenarios_dir {
        Some(dir) => Scenario::load_all(dir)?,
        None => scenarios::all(),
    };

    if let Some(name) = &args.scenario {
        selected.retain(|s| &s.name == name);
        if selected.is_empty() {
            return Err(VerifyError::ScenarioParse(format!(
                "no scenario named '{name}'"
            )));
        }
    }

    if args.list {
        for scenario in &selected {
            println!("{}  {}", scenario.name, scenario.description);
        }
        return Ok(true);
    }

    // Fail fast before any browser work if the app is not serving.
    let target = StaticTarget::new(args.base_url.clone())?;
    target.health_check().await?;
    info!("target reachable at {}", target.base_url());

    let artifacts = ArtifactSink::new(args.output.clone())?;
    let runner = Runner::with_config(
        artifacts,
        RunnerConfig {
            step_timeout: Duration::from_secs(args.step_timeout),
            ..RunnerConfig::default()
        },
    );

    let mut outcomes = Vec::with_capacity(selected.len());

    for scenario in &selected {
        let session = Session::launch(SessionConfig {
            headless: !args.headed,
            viewport: args.viewport.unwrap_or(scenario.viewport),
            chrome_path: args.chrome.clone(),
            ..SessionConfig::default()
        })
        .await?;

        // The session is released on every path: close runs before any
        // runner error propagates.
        let result = runner.run(&session, &target, scenario).await;
        session.close().await?;
        let outcome = result?;

        if outcome.passed {
            info!("✓ {} ({} ms)", outcome.scenario, outcome.duration_ms);
        } else {
            error!(
                "✗ {} - {}",
                outcome.scenario,
                outcome.failure.as_deref().unwrap_or("unknown failure")
            );
        }
        outcomes.push(outcome);
    }

    let report = RunReport::new(args.base_url, outcomes);
    report.write(&args.output)?;

    info!(
        "{} scenario(s): {} passed, {} failed",
        report.total, report.passed, report.failed
    );

    Ok(report.all_passed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_defaults() {
        let args = Args::parse_from(["marxiv-verify"]);
        assert_eq!(args.base_url, "http://localhost:4321");
        assert_eq!(args.output, PathBuf::from("verification"));
        assert_eq!(args.step_timeout, 10);
        assert!(!args.headed);
        assert!(args.scenario.is_none());
        assert!(args.viewport.is_none());
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn args_scenario_filter() {
        let args = Args::parse_from(["marxiv-verify", "--scenario", "mobile-menu", "--headed"]);
        assert_eq!(args.scenario.as_deref(), Some("mobile-menu"));
        assert!(args.headed);
    }

    #[test]
    fn args_viewport_and_verbosity() {
        let args = Args::parse_from(["marxiv-verify", "--viewport", "1920x1080", "-vv"]);
        let viewport = args.viewport.unwrap();
        assert_eq!(viewport.width, 1920);
        assert_eq!(viewport.height, 1080);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn viewport_parsing() {
        let viewport = parse_viewport("375X667").unwrap();
        assert_eq!(viewport.width, 375);
        assert_eq!(viewport.height, 667);

        assert!(parse_viewport("1920").is_err());
        assert!(parse_viewport("x1080").is_err());
        assert!(parse_viewport("1920xtall").is_err());
    }
}
