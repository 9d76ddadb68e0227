//! CLI commands and the scenario registry.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::error;

use podcheck_converge::PollConfig;
use podcheck_harness::{
    run_lock_oracle, run_scenario, scenarios, ConfigStoreClient, HarnessConfig, ScenarioContext,
};

use crate::output::{print_summary, SummaryRow};

/// The scenario names `run` accepts, in suite order.
const SCENARIO_NAMES: &[(&str, &str)] = &[
    ("placement", "Anti-colocation check across all pod types"),
    ("pods-list", "Pod listing ordering and idempotence (needs --counts)"),
    ("pods-status", "Shape check of every pod's status entry, cross-checked for --pod"),
    ("pods-info", "Desired-vs-observed consistency for one pod"),
    ("scale-out", "Add one instance of a pod type; nothing may restart"),
    ("config-bump", "Bump a pod type's cpus; every task must be replaced"),
    ("restart", "Restart one pod in place; agent must not change"),
    ("replace", "Replace one pod; agent may change"),
    ("lock", "Competing scheduler must fail without touching the config store"),
];

/// podcheck - verify scheduler convergence behavior against a live cluster.
#[derive(Debug, Parser)]
#[command(name = "podcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List available scenarios.
    List,

    /// Run scenarios against the cluster, strictly one at a time.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Scenarios to run, in order. Defaults to the observation-only
    /// checks (placement, pods-status, pods-info).
    scenarios: Vec<String>,

    /// Service (package) name under test.
    #[arg(long, env = "PODCHECK_SERVICE")]
    service: Option<String>,

    /// Scheduler API base URL.
    #[arg(long, env = "PODCHECK_SCHEDULER_URL")]
    scheduler_url: Option<String>,

    /// Config-store base URL (lock scenario).
    #[arg(long, env = "PODCHECK_STORE_URL")]
    store_url: Option<String>,

    /// Config-store path holding the scheduler's config target.
    #[arg(long)]
    store_path: Option<String>,

    /// Poll deadline in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Poll interval in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Pod type for scale-out and config-bump.
    #[arg(long, default_value = "proxylite")]
    pod_type: String,

    /// Pod for restart, replace, pods-status, and pods-info.
    #[arg(long, default_value = "proxylite-0")]
    pod: String,

    /// Expected pod counts for pods-list, e.g. `proxylite=2,world=3`.
    #[arg(long)]
    counts: Option<String>,

    /// Pod types for the placement check.
    #[arg(long, default_value = "proxylite,world", value_delimiter = ',')]
    pod_types: Vec<String>,

    /// Keep running remaining scenarios after a failure.
    #[arg(long)]
    keep_going: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::List => {
                for (name, description) in SCENARIO_NAMES {
                    println!("{:<14} {}", name.bold(), description);
                }
                Ok(())
            }
            Commands::Run(args) => run_suite(args).await,
        }
    }
}

fn parse_counts(raw: &str) -> Result<BTreeMap<String, u32>> {
    let mut counts = BTreeMap::new();
    for part in raw.split(',') {
        let (pod_type, count) = part
            .split_once('=')
            .with_context(|| format!("expected 'type=count', got '{part}'"))?;
        counts.insert(
            pod_type.trim().to_string(),
            count
                .trim()
                .parse()
                .with_context(|| format!("'{count}' is not a count"))?,
        );
    }
    Ok(counts)
}

fn build_config(args: &RunArgs) -> Result<HarnessConfig> {
    let mut config = HarnessConfig::from_env()?;

    if let Some(service) = &args.service {
        config.service = service.clone();
    }
    if let Some(url) = &args.scheduler_url {
        config.scheduler_url = url.clone();
    }
    if let Some(url) = &args.store_url {
        config.store_url = url.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.poll = PollConfig::new(Duration::from_secs(secs), config.poll.interval);
    }
    if let Some(ms) = args.interval_ms {
        config.poll = PollConfig::new(config.poll.timeout, Duration::from_millis(ms));
    }

    Ok(config)
}

async fn run_suite(args: RunArgs) -> Result<()> {
    let config = build_config(&args)?;
    let ctx = ScenarioContext::new(&config);
    let store = ConfigStoreClient::new(&config);
    let store_path = args
        .store_path
        .clone()
        .unwrap_or_else(|| format!("{}/ConfigTarget", config.service));

    let selected: Vec<String> = if args.scenarios.is_empty() {
        vec![
            "placement".to_string(),
            "pods-status".to_string(),
            "pods-info".to_string(),
        ]
    } else {
        args.scenarios.clone()
    };

    let known: Vec<&str> = SCENARIO_NAMES.iter().map(|(n, _)| *n).collect();
    for name in &selected {
        if !known.contains(&name.as_str()) {
            bail!("unknown scenario '{name}', see `podcheck list`");
        }
    }

    let mut rows = Vec::with_capacity(selected.len());
    let mut failures = 0usize;
    let mut first_failure = None;

    for name in &selected {
        let outcome = match name.as_str() {
            "placement" => {
                let pod_types: Vec<&str> = args.pod_types.iter().map(String::as_str).collect();
                run_scenario(&ctx, scenarios::placement(&pod_types)).await
            }
            "pods-list" => {
                let raw = args
                    .counts
                    .as_deref()
                    .context("pods-list needs --counts, e.g. --counts proxylite=2,world=3")?;
                run_scenario(&ctx, scenarios::pod_listing(parse_counts(raw)?)).await
            }
            "pods-status" => scenarios::verify_pod_statuses(&ctx.client, &args.pod).await,
            "pods-info" => scenarios::verify_pod_info(&ctx.client, &args.pod).await,
            "scale-out" => {
                run_scenario(&ctx, scenarios::scale_out(&ctx.client, &args.pod_type)).await
            }
            "config-bump" => {
                run_scenario(&ctx, scenarios::config_bump(&ctx.client, &args.pod_type)).await
            }
            "restart" => run_scenario(&ctx, scenarios::restart_pod(&ctx.client, &args.pod)).await,
            "replace" => run_scenario(&ctx, scenarios::replace_pod(&ctx.client, &args.pod)).await,
            "lock" => {
                let trigger = scenarios::competing_scheduler_trigger(&ctx.client);
                run_lock_oracle(&ctx, &store, &store_path, trigger).await
            }
            _ => unreachable!("scenario names validated above"),
        };

        match outcome {
            Ok(report) => rows.push(SummaryRow::passed(&report)),
            Err(err) => {
                failures += 1;
                error!(scenario = %name, error = %err, "Scenario failed");
                rows.push(SummaryRow::failed(name, &err.to_string()));
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
                if !args.keep_going {
                    break;
                }
            }
        }
    }

    print_summary(&rows, failures);

    match first_failure {
        Some(err) if failures == 1 => Err(err.into()),
        Some(_) => bail!("{failures} scenarios failed"),
        None => Ok(()),
    }
}
