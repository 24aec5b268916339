//! Journal entries and per-account bill audit rows.
//!
//! A journal entry records the intent to move value from a credit account to
//! a debit account; the paired bill rows are the denormalized audit trail the
//! consistency checker reconciles against account balances.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{AccountNo, CustomerNo, FlowNo};

/// Completion state of a journal entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalState {
    Pending,
    Completed,
}

/// One journal entry per transfer operation.
///
/// Immutable after creation except for the Pending → Completed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub flow_no: FlowNo,
    pub flow_date: NaiveDate,
    /// Amount moved, in minor units. Always positive.
    pub amount: i64,
    pub debit_account: AccountNo,
    pub credit_account: AccountNo,
    pub state: JournalState,
}

impl JournalEntry {
    pub fn pending(
        flow_no: FlowNo,
        flow_date: NaiveDate,
        amount: i64,
        debit_account: AccountNo,
        credit_account: AccountNo,
    ) -> DomainResult<Self> {
        if amount <= 0 {
            return Err(DomainError::validation("amount must be positive"));
        }
        Ok(Self {
            flow_no,
            flow_date,
            amount,
            debit_account,
            credit_account,
            state: JournalState::Pending,
        })
    }

    /// Transition Pending → Completed. Any other transition is rejected.
    pub fn complete(&mut self) -> DomainResult<()> {
        match self.state {
            JournalState::Pending => {
                self.state = JournalState::Completed;
                Ok(())
            }
            JournalState::Completed => Err(DomainError::invariant(format!(
                "journal {} already completed",
                self.flow_no
            ))),
        }
    }
}

/// Per-account audit record of an amount applied by one journal entry.
///
/// Exactly one of `debit_amount` / `credit_yield` is non-zero. Created once,
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillEntry {
    pub flow_no: FlowNo,
    pub flow_date: NaiveDate,
    pub account_no: AccountNo,
    pub customer_no: CustomerNo,
    pub debit_amount: i64,
    pub credit_yield: i64,
}

impl BillEntry {
    /// Bill row for the debit side of a journal entry.
    pub fn debit(
        flow_no: FlowNo,
        flow_date: NaiveDate,
        account_no: AccountNo,
        customer_no: CustomerNo,
        amount: i64,
    ) -> Self {
        Self {
            flow_no,
            flow_date,
            account_no,
            customer_no,
            debit_amount: amount,
            credit_yield: 0,
        }
    }

    /// Bill row for the credit side of a journal entry.
    pub fn credit(
        flow_no: FlowNo,
        flow_date: NaiveDate,
        account_no: AccountNo,
        customer_no: CustomerNo,
        amount: i64,
    ) -> Self {
        Self {
            flow_no,
            flow_date,
            account_no,
            customer_no,
            debit_amount: 0,
            credit_yield: amount,
        }
    }
}
