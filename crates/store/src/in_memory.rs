//! In-memory DataStore implementation.
//!
//! Intended for tests/dev. Transactions are snapshot-based: `begin` clones
//! the tables, `rollback` restores the clone, `commit` discards it. One
//! transaction at a time per store, which matches the workflow's
//! single-connection model.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use ledgerflow_core::{Account, AccountNo, BillEntry, Customer, CustomerNo, FlowNo, JournalEntry};

use crate::port::{DataStore, Query, Row, Statement, StoreError, Table};
use crate::snowflake::SnowflakeGenerator;

/// Default per-call time budget.
const DEFAULT_CALL_BUDGET: Duration = Duration::from_millis(500);

/// Injected fault, keyed on the number of `execute` calls already served.
///
/// Once armed, the fault fires on every `execute` from the trigger point on,
/// modelling a store that crashed or stalled mid-run.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FaultPlan {
    /// Fail with `Unavailable` after `after` successful execute calls.
    FailOnExecute { after: u64 },
    /// Exceed the call budget (surfaces as `Timeout`) after `after` calls.
    StallOnExecute { after: u64 },
}

#[derive(Debug, Clone, Default)]
struct Tables {
    customers: HashMap<CustomerNo, Customer>,
    accounts: HashMap<AccountNo, Account>,
    journal: HashMap<FlowNo, JournalEntry>,
    bills: Vec<BillEntry>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: Tables,
    /// Present while a transaction is open.
    snapshot: Option<Tables>,
    executed: u64,
    fault: Option<FaultPlan>,
}

/// In-memory ledger store.
#[derive(Debug)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    ids: SnowflakeGenerator,
    call_budget: Duration,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            ids: SnowflakeGenerator::default(),
            call_budget: DEFAULT_CALL_BUDGET,
        }
    }

    pub fn with_call_budget(mut self, budget: Duration) -> Self {
        self.call_budget = budget;
        self
    }

    /// Arm a fault for subsequent `execute` calls.
    pub fn inject_fault(&self, plan: FaultPlan) {
        if let Ok(mut inner) = self.inner.write() {
            inner.fault = Some(plan);
        }
    }

    /// Disarm any injected fault and reset the call counter.
    pub fn clear_fault(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.fault = None;
            inner.executed = 0;
        }
    }

    /// All journal entries, in flow-number order. Inspection helper for
    /// tests/dev; not part of the port.
    pub fn journal_entries(&self) -> Result<Vec<JournalEntry>, StoreError> {
        let inner = self.lock_read()?;
        let mut entries: Vec<_> = inner.tables.journal.values().cloned().collect();
        entries.sort_by_key(|e| e.flow_no);
        Ok(entries)
    }

    /// All bill rows, in insertion order. Inspection helper for tests/dev.
    pub fn bill_entries(&self) -> Result<Vec<BillEntry>, StoreError> {
        let inner = self.lock_read()?;
        Ok(inner.tables.bills.clone())
    }

    fn check_fault(&self, inner: &Inner) -> Result<(), StoreError> {
        match inner.fault {
            Some(FaultPlan::FailOnExecute { after }) if inner.executed >= after => Err(
                StoreError::Unavailable(format!("injected failure after {after} statements")),
            ),
            Some(FaultPlan::StallOnExecute { after }) if inner.executed >= after => {
                Err(StoreError::Timeout(format!(
                    "call exceeded {:?} budget (injected stall)",
                    self.call_budget
                )))
            }
            _ => Ok(()),
        }
    }

    fn check_budget(&self, started: Instant) -> Result<(), StoreError> {
        if started.elapsed() > self.call_budget {
            return Err(StoreError::Timeout(format!(
                "call exceeded {:?} budget",
                self.call_budget
            )));
        }
        Ok(())
    }

    fn apply(tables: &mut Tables, statement: Statement) -> Result<u64, StoreError> {
        match statement {
            Statement::InsertCustomer { customer } => {
                if tables.customers.contains_key(&customer.customer_no) {
                    return Err(StoreError::Conflict(format!(
                        "duplicate customer {}",
                        customer.customer_no
                    )));
                }
                tables.customers.insert(customer.customer_no, customer);
                Ok(1)
            }
            Statement::InsertAccount { account } => {
                if tables.accounts.contains_key(&account.account_no) {
                    return Err(StoreError::Conflict(format!(
                        "duplicate account {}",
                        account.account_no
                    )));
                }
                tables.accounts.insert(account.account_no, account);
                Ok(1)
            }
            Statement::InsertJournal { entry } => {
                if tables.journal.contains_key(&entry.flow_no) {
                    return Err(StoreError::Conflict(format!(
                        "duplicate journal flow {}",
                        entry.flow_no
                    )));
                }
                tables.journal.insert(entry.flow_no, entry);
                Ok(1)
            }
            Statement::ApplyBalanceDelta {
                account_no,
                customer_no,
                delta,
            } => match tables.accounts.get_mut(&account_no) {
                Some(account) if account.customer_no == customer_no => {
                    account
                        .apply_delta(delta)
                        .map_err(|e| StoreError::Conflict(e.to_string()))?;
                    Ok(1)
                }
                _ => Ok(0),
            },
            Statement::InsertBill { bill } => {
                let duplicate = tables.bills.iter().any(|b| {
                    b.account_no == bill.account_no
                        && b.flow_no == bill.flow_no
                        && b.customer_no == bill.customer_no
                });
                if duplicate {
                    return Err(StoreError::Conflict(format!(
                        "duplicate bill for account {} flow {}",
                        bill.account_no, bill.flow_no
                    )));
                }
                tables.bills.push(bill);
                Ok(1)
            }
            Statement::CompleteJournal {
                flow_no,
                debit_account,
                credit_account,
            } => match tables.journal.get_mut(&flow_no) {
                Some(entry)
                    if entry.debit_account == debit_account
                        && entry.credit_account == credit_account =>
                {
                    entry
                        .complete()
                        .map_err(|e| StoreError::Conflict(e.to_string()))?;
                    Ok(1)
                }
                _ => Ok(0),
            },
            Statement::Truncate { table } => {
                let removed = match table {
                    Table::Customer => {
                        let n = tables.customers.len();
                        tables.customers.clear();
                        n
                    }
                    Table::Account => {
                        let n = tables.accounts.len();
                        tables.accounts.clear();
                        n
                    }
                    Table::Journal => {
                        let n = tables.journal.len();
                        tables.journal.clear();
                        n
                    }
                    Table::Bill => {
                        let n = tables.bills.len();
                        tables.bills.clear();
                        n
                    }
                };
                Ok(removed as u64)
            }
        }
    }

    fn run_query(tables: &Tables, query: Query) -> Result<Vec<Row>, StoreError> {
        fn to_amount(total: i128) -> Result<i64, StoreError> {
            i64::try_from(total).map_err(|_| StoreError::Backend("sum overflow".to_string()))
        }

        match query {
            Query::JournalTotalsByDebitAccount => {
                let mut totals: BTreeMap<AccountNo, i128> = BTreeMap::new();
                for entry in tables.journal.values() {
                    *totals.entry(entry.debit_account).or_default() += entry.amount as i128;
                }
                totals
                    .into_iter()
                    .map(|(account_no, total)| {
                        Ok(Row {
                            account_no,
                            amount: to_amount(total)?,
                        })
                    })
                    .collect()
            }
            Query::JournalTotalsByCreditAccount => {
                let mut totals: BTreeMap<AccountNo, i128> = BTreeMap::new();
                for entry in tables.journal.values() {
                    *totals.entry(entry.credit_account).or_default() += entry.amount as i128;
                }
                totals
                    .into_iter()
                    .map(|(account_no, total)| {
                        Ok(Row {
                            account_no,
                            amount: to_amount(total)?,
                        })
                    })
                    .collect()
            }
            Query::BillDebitSum { account_no } => {
                let total: i128 = tables
                    .bills
                    .iter()
                    .filter(|b| b.account_no == account_no)
                    .map(|b| b.debit_amount as i128)
                    .sum();
                Ok(vec![Row {
                    account_no,
                    amount: to_amount(total)?,
                }])
            }
            Query::BillCreditSum { account_no } => {
                let total: i128 = tables
                    .bills
                    .iter()
                    .filter(|b| b.account_no == account_no)
                    .map(|b| b.credit_yield as i128)
                    .sum();
                Ok(vec![Row {
                    account_no,
                    amount: to_amount(total)?,
                }])
            }
            Query::AccountBalance { account_no } => {
                // A vanished account reads as zero, matching SQL's NULL sum.
                let amount = tables
                    .accounts
                    .get(&account_no)
                    .map(|a| a.realtime_remain)
                    .unwrap_or(0);
                Ok(vec![Row { account_no, amount }])
            }
        }
    }

    fn lock_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn lock_read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore for InMemoryStore {
    fn execute(&self, statement: Statement) -> Result<u64, StoreError> {
        let started = Instant::now();
        let mut inner = self.lock_write()?;
        self.check_fault(&inner)?;
        inner.executed += 1;
        let rows = Self::apply(&mut inner.tables, statement)?;
        drop(inner);
        self.check_budget(started)?;
        Ok(rows)
    }

    fn query(&self, query: Query) -> Result<Vec<Row>, StoreError> {
        let started = Instant::now();
        let inner = self.lock_read()?;
        let rows = Self::run_query(&inner.tables, query)?;
        drop(inner);
        self.check_budget(started)?;
        Ok(rows)
    }

    fn begin(&self) -> Result<(), StoreError> {
        let mut inner = self.lock_write()?;
        if inner.snapshot.is_some() {
            return Err(StoreError::Conflict(
                "transaction already active".to_string(),
            ));
        }
        inner.snapshot = Some(inner.tables.clone());
        Ok(())
    }

    fn commit(&self) -> Result<(), StoreError> {
        let mut inner = self.lock_write()?;
        if inner.snapshot.take().is_none() {
            return Err(StoreError::Conflict("no active transaction".to_string()));
        }
        Ok(())
    }

    fn rollback(&self) -> Result<(), StoreError> {
        let mut inner = self.lock_write()?;
        match inner.snapshot.take() {
            Some(snapshot) => {
                inner.tables = snapshot;
                Ok(())
            }
            None => Err(StoreError::Conflict("no active transaction".to_string())),
        }
    }

    fn generate_id(&self) -> Result<i64, StoreError> {
        self.ids.next_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use ledgerflow_core::AccountNature;

    fn insert_account(store: &InMemoryStore, account_no: i64, customer_no: i64, balance: i64) {
        store
            .execute(Statement::InsertAccount {
                account: Account::open(
                    AccountNo::new(account_no),
                    CustomerNo::new(customer_no),
                    balance,
                    "CNY",
                    AccountNature::Debit,
                ),
            })
            .unwrap();
    }

    #[test]
    fn balance_delta_reports_zero_rows_for_missing_account() {
        let store = InMemoryStore::new();
        insert_account(&store, 1, 10, 100);

        let rows = store
            .execute(Statement::ApplyBalanceDelta {
                account_no: AccountNo::new(2),
                customer_no: CustomerNo::new(10),
                delta: 1,
            })
            .unwrap();
        assert_eq!(rows, 0);

        // Customer mismatch also misses.
        let rows = store
            .execute(Statement::ApplyBalanceDelta {
                account_no: AccountNo::new(1),
                customer_no: CustomerNo::new(99),
                delta: 1,
            })
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn rollback_restores_pre_transaction_state() {
        let store = InMemoryStore::new();
        insert_account(&store, 1, 10, 100);

        store.begin().unwrap();
        store
            .execute(Statement::ApplyBalanceDelta {
                account_no: AccountNo::new(1),
                customer_no: CustomerNo::new(10),
                delta: 50,
            })
            .unwrap();
        store.rollback().unwrap();

        let rows = store
            .query(Query::AccountBalance {
                account_no: AccountNo::new(1),
            })
            .unwrap();
        assert_eq!(rows[0].amount, 100);
    }

    #[test]
    fn nested_begin_is_a_conflict() {
        let store = InMemoryStore::new();
        store.begin().unwrap();
        assert!(matches!(store.begin(), Err(StoreError::Conflict(_))));
        store.commit().unwrap();
        assert!(matches!(store.commit(), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn injected_failure_fires_after_threshold() {
        let store = InMemoryStore::new();
        store.inject_fault(FaultPlan::FailOnExecute { after: 1 });

        insert_account(&store, 1, 10, 100);
        let err = store
            .execute(Statement::ApplyBalanceDelta {
                account_no: AccountNo::new(1),
                customer_no: CustomerNo::new(10),
                delta: 1,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));

        store.clear_fault();
        let rows = store
            .execute(Statement::ApplyBalanceDelta {
                account_no: AccountNo::new(1),
                customer_no: CustomerNo::new(10),
                delta: 1,
            })
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn injected_stall_surfaces_as_timeout() {
        let store = InMemoryStore::new();
        store.inject_fault(FaultPlan::StallOnExecute { after: 0 });
        let err = store
            .execute(Statement::Truncate {
                table: Table::Journal,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout(_)));
    }

    #[test]
    fn truncate_empties_a_table_and_reports_row_count() {
        let store = InMemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for flow in 1..=3 {
            store
                .execute(Statement::InsertJournal {
                    entry: JournalEntry::pending(
                        FlowNo::new(flow),
                        date,
                        1,
                        AccountNo::new(1),
                        AccountNo::new(2),
                    )
                    .unwrap(),
                })
                .unwrap();
        }
        let removed = store
            .execute(Statement::Truncate {
                table: Table::Journal,
            })
            .unwrap();
        assert_eq!(removed, 3);
        let rows = store.query(Query::JournalTotalsByDebitAccount).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn duplicate_customer_insert_is_a_conflict() {
        let store = InMemoryStore::new();
        let customer = Customer::new(CustomerNo::new(7), Utc::now());
        store
            .execute(Statement::InsertCustomer {
                customer: customer.clone(),
            })
            .unwrap();
        let err = store
            .execute(Statement::InsertCustomer { customer })
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
