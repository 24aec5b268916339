//! `ledgerflow-core` — domain foundation for the ledger workflow.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed account/customer/journal identifiers and the four ledger
//! entities the transfer workflow manipulates.

pub mod account;
pub mod error;
pub mod id;
pub mod journal;

pub use account::{Account, AccountNature, Customer};
pub use error::{DomainError, DomainResult};
pub use id::{AccountNo, CustomerNo, FlowNo};
pub use journal::{BillEntry, JournalEntry, JournalState};
