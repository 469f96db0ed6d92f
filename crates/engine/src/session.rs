//! Editing sessions
//!
//! A `Session` owns the explicitly constructed pieces every other component
//! borrows: the store context (shared cache + storage provider) and the
//! delivery queue. It is built once at session start and dropped at session
//! end; stores and transactions are handed out from here, so nothing in the
//! engine reaches for hidden global state.

use crate::queue::TransactionQueue;
use crate::transaction::Transaction;
use folio_core::{Pointer, Result};
use folio_store::{MemoryStorageProvider, RecordCache, RecordStore, StorageProvider, StoreContext};
use std::sync::Arc;

/// One editing session: shared cache, persistence, and delivery queue
#[derive(Clone)]
pub struct Session {
    context: StoreContext,
    queue: Arc<TransactionQueue>,
}

impl Session {
    /// Create a session with in-memory persistence
    pub fn new() -> Self {
        Session::with_provider(Arc::new(MemoryStorageProvider::new()))
    }

    /// Create a session over an explicit storage provider
    pub fn with_provider(provider: Arc<dyn StorageProvider>) -> Self {
        Session {
            context: StoreContext::new(Arc::new(RecordCache::new()), provider),
            queue: Arc::new(TransactionQueue::new()),
        }
    }

    /// The session's store context
    pub fn context(&self) -> &StoreContext {
        &self.context
    }

    /// The session's delivery queue
    pub fn queue(&self) -> &Arc<TransactionQueue> {
        &self.queue
    }

    /// A root record store for a user and pointer
    pub fn store_for(&self, user_id: impl Into<String>, pointer: Pointer) -> RecordStore {
        RecordStore::new(self.context.clone(), user_id, pointer)
    }

    /// Begin an open transaction for a user
    pub fn begin(&self, user_id: impl Into<String>) -> Transaction {
        Transaction::create(self.queue.clone(), user_id)
    }

    /// Run a closure inside a transaction and commit it
    ///
    /// The closure populates the transaction; an `Err` from it aborts:
    /// the transaction is dropped uncommitted and the error is returned.
    pub fn transact<R>(
        &self,
        user_id: impl Into<String>,
        f: impl FnOnce(&mut Transaction) -> Result<R>,
    ) -> Result<R> {
        let mut transaction = self.begin(user_id);
        let result = f(&mut transaction)?;
        transaction.commit()?;
        Ok(result)
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}
