//! Transaction delivery queue
//!
//! The ordered outbox between committed transactions and the remote
//! authority. `commit()` pushes `{id, operations}` entries here for networked
//! users and returns without waiting; entries stay queued, in commit order,
//! until the transport collaborator drains and acknowledges them.
//!
//! Pushing returns a [`DeliveryTicket`], an observable handle onto the
//! entry's delivery status. Callers that do not care simply drop it;
//! fire-and-forget stays the default.

use chrono::{DateTime, Utc};
use folio_core::Operation;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// One queued transaction awaiting delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Id of the committed transaction
    pub id: Uuid,
    /// The transaction's operations, in the order they were added
    pub operations: Vec<Operation>,
    /// When the entry was enqueued
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    /// Create an entry stamped with the current time
    pub fn new(id: Uuid, operations: Vec<Operation>) -> Self {
        QueueEntry {
            id,
            operations,
            enqueued_at: Utc::now(),
        }
    }
}

/// Delivery state of one queued entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Still in the outbox (or in flight)
    Pending,
    /// The remote authority acknowledged the entry
    Delivered,
    /// Delivery failed terminally
    Failed(String),
}

/// How the transport reports one entry's outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Entry was accepted by the remote authority
    Delivered,
    /// Entry was refused or lost terminally
    Failed(String),
}

/// Observable handle onto one entry's delivery status
///
/// Cheap to clone; all clones observe the same slot.
#[derive(Debug, Clone)]
pub struct DeliveryTicket {
    id: Uuid,
    slot: Arc<RwLock<DeliveryStatus>>,
}

impl DeliveryTicket {
    /// Id of the transaction this ticket tracks
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current delivery status
    pub fn status(&self) -> DeliveryStatus {
        self.slot.read().clone()
    }

    /// True once the entry is delivered or failed
    pub fn is_settled(&self) -> bool {
        !matches!(self.status(), DeliveryStatus::Pending)
    }
}

struct QueuedDelivery {
    entry: QueueEntry,
    slot: Arc<RwLock<DeliveryStatus>>,
}

/// Ordered outbox of committed transactions awaiting remote persistence
#[derive(Default)]
pub struct TransactionQueue {
    entries: Mutex<VecDeque<QueuedDelivery>>,
}

impl TransactionQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        TransactionQueue {
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Append an entry, returning its delivery ticket
    ///
    /// Ordering is append-only: entries leave the queue strictly in push
    /// order via [`TransactionQueue::acknowledge`].
    pub fn push(&self, entry: QueueEntry) -> DeliveryTicket {
        let slot = Arc::new(RwLock::new(DeliveryStatus::Pending));
        let ticket = DeliveryTicket {
            id: entry.id,
            slot: slot.clone(),
        };
        debug!(id = %entry.id, operations = entry.operations.len(), "transaction enqueued");
        self.entries.lock().push_back(QueuedDelivery { entry, slot });
        ticket
    }

    /// Number of entries awaiting delivery
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if nothing is awaiting delivery
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Ids of all pending entries, oldest first
    pub fn pending_ids(&self) -> Vec<Uuid> {
        self.entries.lock().iter().map(|queued| queued.entry.id).collect()
    }

    /// Snapshot of up to `max` entries from the head, oldest first
    ///
    /// The transport uses this to read the next batch to send. Entries stay
    /// queued until acknowledged.
    pub fn peek_batch(&self, max: usize) -> Vec<QueueEntry> {
        self.entries
            .lock()
            .iter()
            .take(max)
            .map(|queued| queued.entry.clone())
            .collect()
    }

    /// Settle the head entry
    ///
    /// Only the head may be acknowledged; delivery is strictly in order.
    /// Returns false (and changes nothing) if `id` is not the head entry.
    pub fn acknowledge(&self, id: Uuid, outcome: DeliveryOutcome) -> bool {
        let mut entries = self.entries.lock();
        match entries.front() {
            Some(queued) if queued.entry.id == id => {}
            _ => {
                warn!(%id, "acknowledge ignored: not the head entry");
                return false;
            }
        }
        let queued = entries.pop_front().expect("head entry checked above");
        *queued.slot.write() = match outcome {
            DeliveryOutcome::Delivered => DeliveryStatus::Delivered,
            DeliveryOutcome::Failed(reason) => DeliveryStatus::Failed(reason),
        };
        true
    }
}
