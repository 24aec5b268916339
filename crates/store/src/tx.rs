//! Scoped transaction guard.

use crate::port::{DataStore, StoreError};

/// RAII transaction scope over a [`DataStore`].
///
/// `begin` opens a transaction; dropping the scope without `commit` rolls it
/// back, so every exit path (including `?` propagation and panics) releases
/// the transaction.
#[must_use = "dropping a TxScope immediately rolls the transaction back"]
pub struct TxScope<'a> {
    store: &'a dyn DataStore,
    committed: bool,
}

impl<'a> TxScope<'a> {
    pub fn begin(store: &'a dyn DataStore) -> Result<Self, StoreError> {
        store.begin()?;
        Ok(Self {
            store,
            committed: false,
        })
    }

    pub fn commit(mut self) -> Result<(), StoreError> {
        self.store.commit()?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for TxScope<'_> {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = self.store.rollback() {
                tracing::error!(error = %e, "rollback on scope drop failed");
            }
        }
    }
}
