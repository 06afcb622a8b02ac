//! Pub/Sub engine binary entry point

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{bail, Context};
use clap::Parser;
use futures_util::future::join_all;

use pubsub_engine::{
    EngineSettings, ProcessorRegistry, PubSubEngine, RealHelpers, RealMetricsCollector,
    RestPubSubClient, ScenarioContext,
};
use shared::{logging, Script};

#[derive(Parser)]
#[command(name = "pubsub-engine")]
#[command(about = "Run declarative load-test scenarios against a Pub/Sub topic")]
struct Args {
    /// Script file (.yaml, .yml or .json)
    script: PathBuf,

    /// Render messages without publishing them
    #[arg(long)]
    dry_run: bool,

    /// Number of virtual users running each scenario
    #[arg(long, default_value_t = 1)]
    virtual_users: u32,

    /// Only run the scenario with this name
    #[arg(long)]
    scenario: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    logging::init_tracing_with_level(Some(&args.log_level));
    logging::log_startup(&format!("pubsub-engine with {}", args.script.display()));

    let script = Script::load(&args.script)
        .with_context(|| format!("loading {}", args.script.display()))?;

    let settings = EngineSettings::from_config(&script.config)?;
    let dry_run = settings.dry_run || args.dry_run;
    let settings = settings.with_dry_run(dry_run);

    let metrics = RealMetricsCollector::new();
    let engine = PubSubEngine::with_settings(
        settings,
        &script.config,
        Arc::new(metrics.clone()),
        Arc::new(RealHelpers::new()),
        Arc::new(RestPubSubClient::from_env()?),
        ProcessorRegistry::new(),
    );

    let selected: Vec<_> = script
        .scenarios
        .iter()
        .filter(|spec| spec.targets_engine())
        .filter(|spec| match &args.scenario {
            Some(name) => spec.name.as_deref() == Some(name.as_str()),
            None => true,
        })
        .collect();

    if selected.is_empty() {
        bail!("no scenarios to run in {}", args.script.display());
    }

    let mut failures = 0usize;
    for spec in selected {
        let scenario = engine.create_scenario(spec);
        tracing::info!(
            "Running scenario '{}' ({} steps) with {} virtual user(s){}",
            scenario.name(),
            scenario.len(),
            args.virtual_users,
            if engine.settings().dry_run { " [dry run]" } else { "" }
        );

        let runs = (0..args.virtual_users).map(|_| {
            let context = ScenarioContext::with_vars(script.config.variables.clone());
            scenario.run(context)
        });

        for outcome in join_all(runs).await {
            match &outcome.error {
                Some(e) => {
                    failures += 1;
                    logging::log_error(&outcome.context.vu, scenario.name(), e);
                }
                None => {
                    logging::log_success(
                        &outcome.context.vu,
                        &format!("Scenario '{}' completed", scenario.name()),
                    );
                }
            }
        }
    }

    metrics.log_report();
    logging::log_shutdown("all scenarios finished");

    if failures > 0 {
        bail!("{failures} scenario run(s) failed");
    }
    Ok(())
}
