//! Consistency report produced by the reconciliation checker.

use serde::{Deserialize, Serialize};

use ledgerflow_core::AccountNo;

/// Which role an account played in the journal entries being reconciled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountSide {
    Debit,
    Credit,
}

/// One per-account reconciliation record.
///
/// The three compared values: journal total (grouped by this account's side),
/// bill total for the account, and the live balance against its expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCheck {
    pub account_no: AccountNo,
    pub side: AccountSide,
    pub journal_total: i64,
    pub bill_total: i64,
    pub balance: i64,
    pub expected_balance: i64,
    pub passed: bool,
}

/// A reconciliation mismatch, carrying the offending account and the three
/// compared values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyViolation {
    pub account_no: AccountNo,
    pub side: AccountSide,
    pub journal_total: i64,
    pub bill_total: i64,
    pub balance: i64,
}

/// Complete reconciliation report.
///
/// Contains one check per account that appears in the journal. The report is
/// pure data: re-running the checker without intervening writes produces an
/// identical report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub checks: Vec<AccountCheck>,
}

impl ConsistencyReport {
    /// Overall result: the conjunction of all per-account checks.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Every failing check, as violations.
    pub fn violations(&self) -> Vec<ConsistencyViolation> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| ConsistencyViolation {
                account_no: c.account_no,
                side: c.side,
                journal_total: c.journal_total,
                bill_total: c.bill_total,
                balance: c.balance,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(account: i64, passed: bool) -> AccountCheck {
        AccountCheck {
            account_no: AccountNo::new(account),
            side: AccountSide::Debit,
            journal_total: 5,
            bill_total: if passed { 5 } else { 4 },
            balance: 1_000_005,
            expected_balance: 1_000_005,
            passed,
        }
    }

    #[test]
    fn overall_result_is_the_conjunction_of_checks() {
        let report = ConsistencyReport {
            checks: vec![check(1, true), check(2, true)],
        };
        assert!(report.passed());
        assert!(report.violations().is_empty());

        let report = ConsistencyReport {
            checks: vec![check(1, true), check(2, false)],
        };
        assert!(!report.passed());
        let violations = report.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].account_no, AccountNo::new(2));
        assert_eq!(violations[0].journal_total, 5);
        assert_eq!(violations[0].bill_total, 4);
    }

    #[test]
    fn empty_report_passes() {
        let report = ConsistencyReport { checks: vec![] };
        assert!(report.passed());
    }
}
