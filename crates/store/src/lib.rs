//! `ledgerflow-store` — the DataStore port and its in-memory implementation.
//!
//! The ledger workflow talks to persistence exclusively through the
//! [`DataStore`] trait: typed statements and queries, explicit transaction
//! control, and 64-bit id generation. [`InMemoryStore`] is the shipped
//! implementation (tests/dev); a SQL-backed store would implement the same
//! trait against the documented four-table schema.

pub mod in_memory;
pub mod port;
pub mod snowflake;
pub mod tx;

pub use in_memory::{FaultPlan, InMemoryStore};
pub use port::{DataStore, Query, Row, Statement, StoreError, Table};
pub use snowflake::SnowflakeGenerator;
pub use tx::TxScope;
