//! `ledgerflow-workflow` — the transactional ledger workflow.
//!
//! Owns account/customer provisioning, paired debit/credit journal entries
//! with bill audit rows, balance mutation, and the post-hoc three-way
//! reconciliation between journal totals, bill totals, and live balances.
//! Persistence is reached only through the `DataStore` port.

pub mod config;
pub mod error;
pub mod report;
pub mod workflow;


pub use config::WorkflowConfig;
pub use error::WorkflowError;
pub use report::{AccountCheck, AccountSide, ConsistencyReport, ConsistencyViolation};
pub use workflow::{AccountPair, LedgerWorkflow};
