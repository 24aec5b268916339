//! The ledger workflow: provision, transfer, reconcile.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use ledgerflow_core::{
    Account, AccountNature, AccountNo, BillEntry, Customer, CustomerNo, FlowNo, JournalEntry,
};
use ledgerflow_store::{DataStore, Query, Statement, Table, TxScope};

use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::report::{AccountCheck, AccountSide, ConsistencyReport};

/// The two accounts a transfer run moves value between.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AccountPair {
    pub debit_account: AccountNo,
    pub debit_customer: CustomerNo,
    pub credit_account: AccountNo,
    pub credit_customer: CustomerNo,
}

/// Transactional ledger workflow over a [`DataStore`].
///
/// Single-threaded and synchronous: each transfer iteration runs to
/// completion (or failure) inside its own transaction scope before the next
/// begins. A failed iteration aborts the loop; prior committed iterations
/// stay intact and nothing is retried.
pub struct LedgerWorkflow<S: DataStore> {
    store: S,
    config: WorkflowConfig,
    /// Correlation id for this workflow instance's log records.
    run_id: Uuid,
    /// Customer numbering. Atomic so concurrent callers stay correct.
    customer_seq: AtomicI64,
}

impl<S: DataStore> LedgerWorkflow<S> {
    pub fn new(store: S, config: WorkflowConfig) -> Self {
        Self {
            store,
            config,
            run_id: Uuid::now_v7(),
            customer_seq: AtomicI64::new(1),
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Create two customers with one account each: one debit-natured, one
    /// credit-natured, both starting at the configured initial balance.
    /// Runs inside a single transaction scope.
    #[instrument(skip(self), fields(run_id = %self.run_id))]
    pub fn provision_account_pair(&self) -> Result<AccountPair, WorkflowError> {
        let scope = TxScope::begin(&self.store)?;
        let (debit_customer, debit_account) = self.provision_account(AccountNature::Debit)?;
        let (credit_customer, credit_account) = self.provision_account(AccountNature::Credit)?;
        scope.commit()?;

        info!(
            debit_account = %debit_account,
            credit_account = %credit_account,
            "provisioned account pair"
        );
        Ok(AccountPair {
            debit_account,
            debit_customer,
            credit_account,
            credit_customer,
        })
    }

    fn provision_account(
        &self,
        nature: AccountNature,
    ) -> Result<(CustomerNo, AccountNo), WorkflowError> {
        let customer_no = CustomerNo::new(self.customer_seq.fetch_add(1, Ordering::Relaxed));
        let rows = self.store.execute(Statement::InsertCustomer {
            customer: Customer::new(customer_no, Utc::now()),
        })?;
        if rows == 0 {
            return Err(WorkflowError::Provisioning(format!(
                "customer {customer_no} insert affected no rows"
            )));
        }

        let account_no = AccountNo::new(self.store.generate_id()?);
        let rows = self.store.execute(Statement::InsertAccount {
            account: Account::open(
                account_no,
                customer_no,
                self.config.initial_balance,
                self.config.currency.clone(),
                nature,
            ),
        })?;
        if rows == 0 {
            return Err(WorkflowError::Provisioning(format!(
                "account {account_no} insert affected no rows"
            )));
        }
        Ok((customer_no, account_no))
    }

    /// Repeat `count` times: move `amount` from the credit account to the
    /// debit account, committing once per iteration.
    ///
    /// Each iteration writes a Pending journal entry, applies the balance
    /// deltas, writes one bill row per account, and marks the journal entry
    /// Completed. A failure aborts the loop with the failing iteration rolled
    /// back; completed iterations stay committed.
    #[instrument(skip(self, pair), fields(run_id = %self.run_id))]
    pub fn transfer(
        &self,
        pair: &AccountPair,
        amount: i64,
        count: u64,
    ) -> Result<(), WorkflowError> {
        for iteration in 0..count {
            self.transfer_once(pair, amount).map_err(|e| {
                warn!(iteration, error = %e, "transfer aborted");
                e
            })?;
        }
        info!(count, "transfer run complete");
        Ok(())
    }

    fn transfer_once(&self, pair: &AccountPair, amount: i64) -> Result<(), WorkflowError> {
        let scope = TxScope::begin(&self.store)?;

        let flow_no = FlowNo::new(self.store.generate_id()?);
        let entry = JournalEntry::pending(
            flow_no,
            Utc::now().date_naive(),
            amount,
            pair.debit_account,
            pair.credit_account,
        )
        .map_err(|e| WorkflowError::Transfer(e.to_string()))?;
        let flow_date = entry.flow_date;

        let rows = self.store.execute(Statement::InsertJournal { entry })?;
        require_rows(rows, format!("journal {flow_no} insert"))?;

        let rows = self.store.execute(Statement::ApplyBalanceDelta {
            account_no: pair.debit_account,
            customer_no: pair.debit_customer,
            delta: amount,
        })?;
        require_rows(rows, format!("debit account {} update", pair.debit_account))?;

        let rows = self.store.execute(Statement::ApplyBalanceDelta {
            account_no: pair.credit_account,
            customer_no: pair.credit_customer,
            delta: -amount,
        })?;
        require_rows(rows, format!("credit account {} update", pair.credit_account))?;

        let rows = self.store.execute(Statement::InsertBill {
            bill: BillEntry::debit(
                flow_no,
                flow_date,
                pair.debit_account,
                pair.debit_customer,
                amount,
            ),
        })?;
        require_rows(rows, format!("debit bill for flow {flow_no}"))?;

        let rows = self.store.execute(Statement::InsertBill {
            bill: BillEntry::credit(
                flow_no,
                flow_date,
                pair.credit_account,
                pair.credit_customer,
                amount,
            ),
        })?;
        require_rows(rows, format!("credit bill for flow {flow_no}"))?;

        let rows = self.store.execute(Statement::CompleteJournal {
            flow_no,
            debit_account: pair.debit_account,
            credit_account: pair.credit_account,
        })?;
        require_rows(rows, format!("journal {flow_no} completion"))?;

        scope.commit()?;
        Ok(())
    }

    /// Three-way reconciliation: journal totals vs. bill totals vs. live
    /// balances, for every account that appears in the journal.
    ///
    /// Violations are collected, never fatal: every account is checked and a
    /// complete report is returned. Read-only, so re-running it without
    /// intervening writes yields an identical report.
    #[instrument(skip(self), fields(run_id = %self.run_id))]
    pub fn check_consistency(&self) -> Result<ConsistencyReport, WorkflowError> {
        let mut checks = Vec::new();
        for row in self.store.query(Query::JournalTotalsByDebitAccount)? {
            checks.push(self.check_account(row.account_no, row.amount, AccountSide::Debit)?);
        }
        for row in self.store.query(Query::JournalTotalsByCreditAccount)? {
            checks.push(self.check_account(row.account_no, row.amount, AccountSide::Credit)?);
        }

        let report = ConsistencyReport { checks };
        if report.passed() {
            info!(accounts = report.checks.len(), "consistency check passed");
        } else {
            warn!(
                accounts = report.checks.len(),
                violations = report.violations().len(),
                "consistency check failed"
            );
        }
        Ok(report)
    }

    fn check_account(
        &self,
        account_no: AccountNo,
        journal_total: i64,
        side: AccountSide,
    ) -> Result<AccountCheck, WorkflowError> {
        let bill_query = match side {
            AccountSide::Debit => Query::BillDebitSum { account_no },
            AccountSide::Credit => Query::BillCreditSum { account_no },
        };
        let bill_total = single_amount(self.store.query(bill_query)?);
        let balance = single_amount(self.store.query(Query::AccountBalance { account_no })?);

        let expected_balance = match side {
            AccountSide::Debit => self.config.initial_balance + bill_total,
            AccountSide::Credit => self.config.initial_balance - bill_total,
        };
        let passed = bill_total == journal_total && balance == expected_balance;

        Ok(AccountCheck {
            account_no,
            side,
            journal_total,
            bill_total,
            balance,
            expected_balance,
            passed,
        })
    }

    /// Truncate all four tables (the per-run purge).
    #[instrument(skip(self), fields(run_id = %self.run_id))]
    pub fn purge(&self) -> Result<(), WorkflowError> {
        for table in [Table::Bill, Table::Journal, Table::Account, Table::Customer] {
            self.store.execute(Statement::Truncate { table })?;
        }
        Ok(())
    }
}

fn require_rows(rows: u64, what: String) -> Result<(), WorkflowError> {
    if rows == 0 {
        return Err(WorkflowError::Transfer(format!("{what} affected no rows")));
    }
    Ok(())
}

fn single_amount(rows: Vec<ledgerflow_store::Row>) -> i64 {
    rows.first().map(|r| r.amount).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerflow_store::{Row, StoreError};

    /// Store whose writes always report zero affected rows.
    struct ZeroRowStore;

    impl DataStore for ZeroRowStore {
        fn execute(&self, _statement: Statement) -> Result<u64, StoreError> {
            Ok(0)
        }

        fn query(&self, _query: Query) -> Result<Vec<Row>, StoreError> {
            Ok(vec![])
        }

        fn begin(&self) -> Result<(), StoreError> {
            Ok(())
        }

        fn commit(&self) -> Result<(), StoreError> {
            Ok(())
        }

        fn rollback(&self) -> Result<(), StoreError> {
            Ok(())
        }

        fn generate_id(&self) -> Result<i64, StoreError> {
            Ok(42)
        }
    }

    fn test_pair() -> AccountPair {
        AccountPair {
            debit_account: AccountNo::new(1),
            debit_customer: CustomerNo::new(10),
            credit_account: AccountNo::new(2),
            credit_customer: CustomerNo::new(20),
        }
    }

    #[test]
    fn zero_row_insert_fails_provisioning() {
        let workflow = LedgerWorkflow::new(ZeroRowStore, WorkflowConfig::default());
        let err = workflow.provision_account_pair().unwrap_err();
        assert!(matches!(err, WorkflowError::Provisioning(_)));
    }

    #[test]
    fn zero_row_step_fails_transfer() {
        let workflow = LedgerWorkflow::new(ZeroRowStore, WorkflowConfig::default());
        let err = workflow.transfer(&test_pair(), 1, 1).unwrap_err();
        assert!(matches!(err, WorkflowError::Transfer(_)));
    }

    #[test]
    fn non_positive_amount_fails_transfer() {
        let workflow = LedgerWorkflow::new(ZeroRowStore, WorkflowConfig::default());
        let err = workflow.transfer(&test_pair(), 0, 1).unwrap_err();
        assert!(matches!(err, WorkflowError::Transfer(_)));
    }
}
