//! Transactions
//!
//! A transaction batches operations against one or more record stores,
//! applying each to the shared cache the moment it is added (optimistic
//! local mutation), and on commit either finalizes locally (local and
//! guest users) or enqueues the batch onto the delivery queue for the
//! remote authority. The optimistic apply is what makes the editor feel
//! instant; determinism of the reducer is what makes the later authoritative
//! replay converge on the same state.
//!
//! # Lifecycle
//!
//! `Open` (committed = false) → `Committed`. `commit()` is the only
//! transition and it is irreversible; calling it again is a logged no-op.
//! There is no rollback and no cancellation at this layer: an error while
//! adding an operation leaves the transaction half-built and the caller must
//! discard it without committing.

use crate::facade::{Applied, CommandFacade};
use crate::queue::{DeliveryTicket, QueueEntry, TransactionQueue};
use folio_core::{
    is_guest_user, is_local_user, Error, Operation, Pointer, Record, Result, Value,
};
use folio_store::RecordStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Callback invoked when a transaction finishes (the `done()` extension point)
pub type PostSubmitCallback = Box<dyn FnMut(Option<&Value>)>;

/// Hook run during commit, before or after submission
pub type SubmitAction = Box<dyn FnMut()>;

/// How a commit resolved
#[derive(Debug)]
pub enum Commit {
    /// The transaction had already been committed; nothing was reapplied
    AlreadyCommitted,
    /// Zero operations; callbacks ran, the queue was never touched
    Empty,
    /// Local/guest user: the optimistic cache state is final
    Local,
    /// Networked user: the batch was enqueued for delivery
    ///
    /// The ticket can be watched for the delivery outcome, or dropped;
    /// commit never waits on it.
    Enqueued(DeliveryTicket),
}

/// An ordered batch of operations committed together
pub struct Transaction {
    id: Uuid,
    user_id: String,
    is_local: bool,
    /// Whether this transaction should participate in undo history
    pub can_undo: bool,
    committed: bool,
    operations: Vec<Operation>,
    stores: Vec<RecordStore>,
    /// Pre-images of every touched record, captured on first touch
    snapshots: HashMap<Pointer, Arc<Record>>,
    queue: Arc<TransactionQueue>,
    pre_submit_actions: Vec<SubmitAction>,
    post_submit_actions: Vec<SubmitAction>,
    post_submit_callbacks: Vec<PostSubmitCallback>,
}

impl Transaction {
    /// Create a transaction for a user
    ///
    /// The only constructor: binds a fresh id and derives the commit path
    /// from the user id: local and guest users never touch the queue.
    pub fn create(queue: Arc<TransactionQueue>, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let is_local = is_local_user(&user_id) || is_guest_user(&user_id);
        Transaction {
            id: Uuid::new_v4(),
            user_id,
            is_local,
            can_undo: true,
            committed: false,
            operations: Vec::new(),
            stores: Vec::new(),
            snapshots: HashMap::new(),
            queue,
            pre_submit_actions: Vec::new(),
            post_submit_actions: Vec::new(),
            post_submit_callbacks: Vec::new(),
        }
    }

    /// Create a transaction, populate it via `callback`, and commit
    ///
    /// Returns the callback's value after the commit resolves.
    pub fn create_and_commit<R>(
        queue: Arc<TransactionQueue>,
        user_id: impl Into<String>,
        callback: impl FnOnce(&mut Transaction) -> R,
    ) -> Result<R> {
        let mut transaction = Transaction::create(queue, user_id);
        let result = callback(&mut transaction);
        transaction.commit()?;
        Ok(result)
    }

    /// Unique id of this transaction
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The user this transaction is attributed to
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// True if this transaction commits without network involvement
    pub fn is_local(&self) -> bool {
        self.is_local
    }

    /// True once `commit()` has run
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// The operations added so far, in order
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// The store each operation targeted, parallel to `operations()`
    pub fn stores(&self) -> &[RecordStore] {
        &self.stores
    }

    /// Number of operations added so far
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// True if no operations have been added
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Pre-image of a touched record, captured before its first mutation
    pub fn snapshot(&self, pointer: &Pointer) -> Option<&Arc<Record>> {
        self.snapshots.get(pointer)
    }

    /// Register a hook to run at commit, before submission
    pub fn add_pre_submit_action(&mut self, action: impl FnMut() + 'static) {
        self.pre_submit_actions.push(Box::new(action));
    }

    /// Register a hook to run at commit, after submission
    pub fn add_post_submit_action(&mut self, action: impl FnMut() + 'static) {
        self.post_submit_actions.push(Box::new(action));
    }

    /// Register a completion callback, invoked by `done()`
    pub fn on_post_submit(&mut self, callback: impl FnMut(Option<&Value>) + 'static) {
        self.post_submit_callbacks.push(Box::new(callback));
    }

    /// Add one operation, applying it to the shared cache immediately
    ///
    /// Reads the whole backing record through the store's root-path store
    /// (materializing the default on first touch), applies the operation via
    /// the reducer, writes the result back into the shared cache (visible to
    /// every sibling store before this method returns), and appends the
    /// operation to the batch. No network I/O happens here.
    ///
    /// # Errors
    ///
    /// A malformed operation propagates the reducer's error and leaves the
    /// previously-added operations in place; the caller must discard the
    /// transaction rather than commit it. A rejected operation (insufficient
    /// role) aborts the batch the same way with
    /// [`Error::OperationRejected`], appending nothing.
    pub fn add_operation(&mut self, store: &RecordStore, operation: Operation) -> Result<()> {
        let pointer = store.pointer();
        if operation.pointer() != *pointer {
            return Err(Error::InvalidOperation(format!(
                "operation targets {} but store points at {}",
                operation.pointer(),
                pointer
            )));
        }

        let root = store.at_root_path();
        let record = root.get_or_default_record()?;
        self.snapshots
            .entry(pointer.clone())
            .or_insert_with(|| record.clone());

        match CommandFacade::execute(&operation, &record)? {
            Applied::Applied(next) => {
                store
                    .context()
                    .update_cache(store.user_id(), pointer, next, true);
                self.operations.push(operation);
                self.stores.push(store.clone());
                Ok(())
            }
            Applied::Rejected(reason) => Err(Error::OperationRejected(reason)),
        }
    }

    /// Commit the transaction
    ///
    /// Idempotent: a second call is a logged no-op. With zero operations the
    /// completion callbacks still run but the queue is never touched. With
    /// operations, the pre-submit hooks run first; local users finalize
    /// directly (the optimistic mutations already applied are the final
    /// state), networked users enqueue `{id, operations}` in the exact
    /// order the operations were added, without awaiting delivery. Both
    /// paths then run the post-submit hooks and fire `done()`.
    pub fn commit(&mut self) -> Result<Commit> {
        if self.committed {
            debug!(id = %self.id, "commit on a committed transaction");
            return Ok(Commit::AlreadyCommitted);
        }

        if self.operations.is_empty() {
            self.done(None);
            self.committed = true;
            return Ok(Commit::Empty);
        }

        for action in &mut self.pre_submit_actions {
            action();
        }

        let outcome = if self.is_local {
            Commit::Local
        } else {
            let entry = QueueEntry::new(self.id, self.operations.clone());
            Commit::Enqueued(self.queue.push(entry))
        };

        for action in &mut self.post_submit_actions {
            action();
        }

        self.done(None);
        self.committed = true;
        Ok(outcome)
    }

    /// Fire every completion callback with an optional argument
    pub fn done(&mut self, args: Option<&Value>) {
        for callback in &mut self.post_submit_callbacks {
            callback(args);
        }
        debug!(id = %self.id, "done");
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("is_local", &self.is_local)
            .field("committed", &self.committed)
            .field("operations", &self.operations.len())
            .finish()
    }
}
