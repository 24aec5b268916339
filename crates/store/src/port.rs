//! The DataStore port: typed statements, queries, and transaction control.
//!
//! This is the only external capability the workflow consumes. Statements are
//! a closed enum rather than SQL strings so implementations stay free to map
//! them onto whatever storage they sit on; the compatible SQL schema is:
//!
//! | Table | Columns |
//! |---|---|
//! | `customer` | `customer_no PK` |
//! | `account` | `account_no, customer_no, realtime_remain, currency, rate, nature` |
//! | `journal` | `flowno PK, debit_acc, credit_acc, amount, state` |
//! | `bill` | `flowno, account_no, debit_amount, credit_yield, customer_no` |

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ledgerflow_core::{Account, AccountNo, BillEntry, Customer, CustomerNo, FlowNo, JournalEntry};

/// The four tables of the ledger schema.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Customer,
    Account,
    Journal,
    Bill,
}

/// A write statement. `DataStore::execute` returns the affected-row count;
/// the workflow treats zero rows as a lost-row failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    InsertCustomer {
        customer: Customer,
    },
    InsertAccount {
        account: Account,
    },
    /// Insert a journal entry (created in the Pending state).
    InsertJournal {
        entry: JournalEntry,
    },
    /// Apply a signed delta to an account's running balance.
    ApplyBalanceDelta {
        account_no: AccountNo,
        customer_no: CustomerNo,
        delta: i64,
    },
    InsertBill {
        bill: BillEntry,
    },
    /// Transition a journal entry Pending → Completed. Both account numbers
    /// must match the stored entry.
    CompleteJournal {
        flow_no: FlowNo,
        debit_account: AccountNo,
        credit_account: AccountNo,
    },
    /// Remove every row from a table (per-run purge).
    Truncate {
        table: Table,
    },
}

/// A read query. Results come back as [`Row`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// `Σ journal.amount` grouped by debit account, ordered by account.
    JournalTotalsByDebitAccount,
    /// `Σ journal.amount` grouped by credit account, ordered by account.
    JournalTotalsByCreditAccount,
    /// `Σ bill.debit_amount` for one account (single row, zero if no bills).
    BillDebitSum { account_no: AccountNo },
    /// `Σ bill.credit_yield` for one account (single row, zero if no bills).
    BillCreditSum { account_no: AccountNo },
    /// Live balance of one account (single row, zero if the account is gone).
    AccountBalance { account_no: AccountNo },
}

/// One result row: an account number and an amount in minor units.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub account_no: AccountNo,
    pub amount: i64,
}

/// Data store operation error.
///
/// These are **infrastructure errors** (transport, transactions, budgets) as
/// opposed to domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The call exceeded its time budget.
    #[error("data store call timed out: {0}")]
    Timeout(String),

    /// The store could not service the call (connection lost, injected fault).
    #[error("data store unavailable: {0}")]
    Unavailable(String),

    /// Transaction misuse or a constraint violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Synchronous data store port.
///
/// Implementations must:
/// - report the exact affected-row count from `execute` (the workflow relies
///   on zero meaning a lost row, never an error)
/// - support one transaction at a time per store handle: `begin` while a
///   transaction is open is a [`StoreError::Conflict`], as are `commit` and
///   `rollback` without one
/// - bound every call by a time budget and surface [`StoreError::Timeout`]
///   when it is exceeded, rather than blocking indefinitely
pub trait DataStore: Send + Sync {
    /// Execute a write statement, returning the number of affected rows.
    fn execute(&self, statement: Statement) -> Result<u64, StoreError>;

    /// Run a read query.
    fn query(&self, query: Query) -> Result<Vec<Row>, StoreError>;

    /// Open a transaction on this handle.
    fn begin(&self) -> Result<(), StoreError>;

    /// Commit the open transaction.
    fn commit(&self) -> Result<(), StoreError>;

    /// Roll back the open transaction, restoring pre-`begin` state.
    fn rollback(&self) -> Result<(), StoreError>;

    /// Generate a collision-resistant 64-bit identifier.
    fn generate_id(&self) -> Result<i64, StoreError>;
}

impl<S> DataStore for Arc<S>
where
    S: DataStore + ?Sized,
{
    fn execute(&self, statement: Statement) -> Result<u64, StoreError> {
        (**self).execute(statement)
    }

    fn query(&self, query: Query) -> Result<Vec<Row>, StoreError> {
        (**self).query(query)
    }

    fn begin(&self) -> Result<(), StoreError> {
        (**self).begin()
    }

    fn commit(&self) -> Result<(), StoreError> {
        (**self).commit()
    }

    fn rollback(&self) -> Result<(), StoreError> {
        (**self).rollback()
    }

    fn generate_id(&self) -> Result<i64, StoreError> {
        (**self).generate_id()
    }
}
