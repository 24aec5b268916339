use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{AccountNo, CustomerNo};

/// Which side of a transfer pair an account sits on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountNature {
    Debit,
    Credit,
}

/// Customer: identity only. Created once per account pair, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_no: CustomerNo,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(customer_no: CustomerNo, created_at: DateTime<Utc>) -> Self {
        Self {
            customer_no,
            created_at,
        }
    }
}

/// Account: belongs to exactly one customer, holds a running balance in
/// minor units.
///
/// Only the transfer workflow mutates the balance, through `apply_delta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_no: AccountNo,
    pub customer_no: CustomerNo,
    /// Running balance in minor units (e.g. cents).
    pub realtime_remain: i64,
    pub currency: String,
    pub rate: f64,
    pub nature: AccountNature,
}

impl Account {
    pub fn open(
        account_no: AccountNo,
        customer_no: CustomerNo,
        initial_balance: i64,
        currency: impl Into<String>,
        nature: AccountNature,
    ) -> Self {
        Self {
            account_no,
            customer_no,
            realtime_remain: initial_balance,
            currency: currency.into(),
            rate: 1.0,
            nature,
        }
    }

    /// Apply a signed balance delta.
    ///
    /// The balance must never go negative; a delta that would overdraw the
    /// account is rejected without mutating state.
    pub fn apply_delta(&mut self, delta: i64) -> DomainResult<()> {
        let next = self
            .realtime_remain
            .checked_add(delta)
            .ok_or_else(|| DomainError::invariant("balance overflow"))?;
        if next < 0 {
            return Err(DomainError::invariant(format!(
                "account {} balance would go negative ({next})",
                self.account_no
            )));
        }
        self.realtime_remain = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_account(balance: i64) -> Account {
        Account::open(
            AccountNo::new(1),
            CustomerNo::new(10),
            balance,
            "CNY",
            AccountNature::Debit,
        )
    }

    #[test]
    fn apply_delta_moves_balance_both_directions() {
        let mut account = test_account(100);
        account.apply_delta(5).unwrap();
        assert_eq!(account.realtime_remain, 105);
        account.apply_delta(-30).unwrap();
        assert_eq!(account.realtime_remain, 75);
    }

    #[test]
    fn overdraw_is_rejected_without_mutation() {
        let mut account = test_account(10);
        let err = account.apply_delta(-11).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(account.realtime_remain, 10);
    }
}
