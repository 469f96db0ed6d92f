//! In-memory record cache
//!
//! The cache is the one shared mutable resource in the system: every
//! `RecordStore` bound to the same pointer reads and writes the same slot.
//! It is explicitly constructed and injected; there is no global instance.
//!
//! # Copy-on-write
//!
//! Slots hold `Arc<Record>` snapshots plus a generation counter. Readers take
//! a clone of the `Arc`; writers never mutate the stored record in place but
//! install a fresh `Arc` and bump the generation. A reader holding an older
//! snapshot therefore observes a stable value no matter how many writes land
//! after it.

use folio_core::{Pointer, Record};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// One cache slot: the current record snapshot and its generation
#[derive(Debug, Clone)]
struct CacheSlot {
    record: Arc<Record>,
    generation: u64,
}

/// Shared in-memory cache of record snapshots, keyed by pointer
#[derive(Debug, Default)]
pub struct RecordCache {
    slots: RwLock<HashMap<Pointer, CacheSlot>>,
}

impl RecordCache {
    /// Create an empty cache
    pub fn new() -> Self {
        RecordCache {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Get the current snapshot for a pointer, if cached
    pub fn get(&self, pointer: &Pointer) -> Option<Arc<Record>> {
        self.slots.read().get(pointer).map(|slot| slot.record.clone())
    }

    /// Current generation of a slot, if cached
    ///
    /// Generations start at 1 on first install and increase by 1 per write.
    pub fn generation(&self, pointer: &Pointer) -> Option<u64> {
        self.slots.read().get(pointer).map(|slot| slot.generation)
    }

    /// Install a new snapshot for a pointer, returning the new generation
    ///
    /// Replaces the whole `Arc`; existing readers keep their old snapshot.
    pub fn install(&self, pointer: Pointer, record: Record) -> u64 {
        let mut slots = self.slots.write();
        let generation = slots.get(&pointer).map(|slot| slot.generation + 1).unwrap_or(1);
        slots.insert(
            pointer,
            CacheSlot {
                record: Arc::new(record),
                generation,
            },
        );
        generation
    }

    /// Drop a pointer's slot, returning the evicted snapshot
    pub fn evict(&self, pointer: &Pointer) -> Option<Arc<Record>> {
        self.slots.write().remove(pointer).map(|slot| slot.record)
    }

    /// Number of cached records
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// True if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Drop every slot
    pub fn clear(&self) {
        self.slots.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{Role, Table, Value};

    fn pointer() -> Pointer {
        Pointer::new(Table::Page, "p-1")
    }

    #[test]
    fn test_miss_then_install() {
        let cache = RecordCache::new();
        assert!(cache.get(&pointer()).is_none());

        let generation = cache.install(pointer(), Record::default());
        assert_eq!(generation, 1);
        assert!(cache.get(&pointer()).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_generation_increments() {
        let cache = RecordCache::new();
        cache.install(pointer(), Record::default());
        let generation = cache.install(pointer(), Record::default());
        assert_eq!(generation, 2);
        assert_eq!(cache.generation(&pointer()), Some(2));
    }

    #[test]
    fn test_old_snapshot_survives_write() {
        let cache = RecordCache::new();
        cache.install(
            pointer(),
            Record::new(Value::from("before"), Role::Editor),
        );
        let snapshot = cache.get(&pointer()).unwrap();

        cache.install(pointer(), Record::new(Value::from("after"), Role::Editor));

        // The reader's snapshot is untouched by the later write.
        assert_eq!(snapshot.value, Value::from("before"));
        assert_eq!(
            cache.get(&pointer()).unwrap().value,
            Value::from("after")
        );
    }

    #[test]
    fn test_evict() {
        let cache = RecordCache::new();
        cache.install(pointer(), Record::default());
        assert!(cache.evict(&pointer()).is_some());
        assert!(cache.is_empty());
    }
}
