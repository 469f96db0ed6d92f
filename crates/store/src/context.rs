//! Store context
//!
//! `StoreContext` bundles the session's constructed cache and storage
//! provider. It is created once at session start, handed to every store and
//! transaction factory, and dropped at session end: shared-cache semantics
//! without hidden global state.
//!
//! All mutation flows through [`StoreContext::update_cache`]: records are
//! never mutated in place by callers holding a previously-read snapshot.

use crate::cache::RecordCache;
use crate::provider::StorageProvider;
use folio_core::{Pointer, Record, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// The session's shared cache plus its persistence collaborator
#[derive(Clone)]
pub struct StoreContext {
    cache: Arc<RecordCache>,
    provider: Arc<dyn StorageProvider>,
}

impl StoreContext {
    /// Create a context from an explicitly constructed cache and provider
    pub fn new(cache: Arc<RecordCache>, provider: Arc<dyn StorageProvider>) -> Self {
        StoreContext { cache, provider }
    }

    /// The shared record cache
    pub fn cache(&self) -> &Arc<RecordCache> {
        &self.cache
    }

    /// The storage provider
    pub fn provider(&self) -> &Arc<dyn StorageProvider> {
        &self.provider
    }

    /// Read a record through the cache
    ///
    /// On a cache miss the provider is consulted and a hit is installed into
    /// the cache before returning, so subsequent reads stay in memory.
    pub fn read_through(&self, user_id: &str, pointer: &Pointer) -> Result<Option<Arc<Record>>> {
        if let Some(record) = self.cache.get(pointer) {
            return Ok(Some(record));
        }
        match self.provider.load(user_id, pointer)? {
            Some(record) => {
                self.cache.install(pointer.clone(), record);
                Ok(self.cache.get(pointer))
            }
            None => Ok(None),
        }
    }

    /// Write a mutated record back into the shared cache
    ///
    /// This is the single write-back path: it installs the new snapshot into
    /// the cache (immediately visible to every store on the pointer) and,
    /// when `persist` is set, writes through to the storage provider. A
    /// provider failure is logged and swallowed; the cache keeps the state
    /// readers already observed.
    pub fn update_cache(
        &self,
        user_id: &str,
        pointer: &Pointer,
        record: Record,
        persist: bool,
    ) -> u64 {
        if persist {
            if let Err(e) = self.provider.store(user_id, pointer, &record) {
                warn!(%pointer, user_id, error = %e, "record persistence failed");
            }
        }
        let generation = self.cache.install(pointer.clone(), record);
        debug!(%pointer, generation, "cache updated");
        generation
    }
}
