use serde::{Deserialize, Serialize};

/// Workflow configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Starting balance for every provisioned account, in minor units.
    pub initial_balance: i64,
    /// Currency code for provisioned accounts.
    pub currency: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            initial_balance: 1_000_000,
            currency: "CNY".to_string(),
        }
    }
}
