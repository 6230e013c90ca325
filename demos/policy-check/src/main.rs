//! Evaluates a fact snapshot against a policy document and prints the decision.
//!
//! ```text
//! policy-check --policy data/access_control.json --facts data/green_unit.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::de::DeserializeOwned;
use tracing::info;
use vehicle_gate::model::{Policy, PolicyDocument};
use vehicle_gate::prelude::{EngineConfig, FactContext, PolicyEngine, PolicyHandle};
use vehicle_gate::telemetry::{self, TelemetryConfig};

/// Ask the vehicle gate whether a scope may be granted.
#[derive(Parser, Debug)]
#[command(name = "policy-check", version, about, long_about = None)]
struct Cli {
    /// Policy document (JSON)
    #[arg(long)]
    policy: PathBuf,

    /// Fact snapshot (JSON object)
    #[arg(long)]
    facts: PathBuf,

    /// Deny instead of failing when a condition cannot be evaluated
    #[arg(long)]
    fail_closed: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_filter: String,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(&TelemetryConfig::new(&cli.log_filter))?;

    let document: PolicyDocument = read_json(&cli.policy)?;
    let policy = Policy::try_from(document)
        .with_context(|| format!("validating {}", cli.policy.display()))?;
    let config = if cli.fail_closed {
        EngineConfig::fail_closed()
    } else {
        EngineConfig::default()
    };
    let handle = PolicyHandle::with_config(policy, config);

    let facts = FactContext::try_from(read_json::<serde_json::Value>(&cli.facts)?)
        .with_context(|| format!("loading facts from {}", cli.facts.display()))?;

    let decision = handle.decide(&facts).await?;
    telemetry::forward_advisories(&decision);
    info!(
        decision = ?decision.kind(),
        matched = decision.matched_rules().len(),
        "{}",
        decision.reason()
    );

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
