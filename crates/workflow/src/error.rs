use thiserror::Error;

use ledgerflow_store::StoreError;

/// Workflow-level error.
///
/// Provisioning and transfer failures are fatal to the current run: they
/// propagate immediately, are never retried, and are never masked.
/// Consistency violations are **not** errors — the checker collects them into
/// the report and always runs to completion.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Account or customer creation failed (an insert affected no rows).
    #[error("provisioning failed: {0}")]
    Provisioning(String),

    /// A transfer step affected zero rows (lost account or journal row).
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// A data store call failed (includes timeouts).
    #[error(transparent)]
    Store(#[from] StoreError),
}
