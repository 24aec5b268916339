//! Thin driver: provision a pair, run transfers, print the report.

use std::sync::Arc;

use anyhow::Context;

use ledgerflow_store::InMemoryStore;
use ledgerflow_workflow::{LedgerWorkflow, WorkflowConfig};

fn env_i64(name: &str, default: i64) -> i64 {
    match std::env::var(name) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(name, value = %value, "unparsable value; using default");
            default
        }),
        Err(_) => default,
    }
}

fn main() -> anyhow::Result<()> {
    ledgerflow_observability::init();

    let count = env_i64("LEDGERFLOW_COUNT", 5).max(0) as u64;
    let amount = env_i64("LEDGERFLOW_AMOUNT", 1);

    let store = Arc::new(InMemoryStore::new());
    let workflow = LedgerWorkflow::new(Arc::clone(&store), WorkflowConfig::default());

    let pair = workflow
        .provision_account_pair()
        .context("provisioning account pair")?;
    workflow
        .transfer(&pair, amount, count)
        .context("running transfers")?;
    let report = workflow
        .check_consistency()
        .context("checking consistency")?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.passed() {
        anyhow::bail!("consistency check failed for {} account(s)", report.violations().len());
    }
    Ok(())
}
