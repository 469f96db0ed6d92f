//! Folio: a transactional block-document store for collaborative editors
//!
//! Folio is the mutation engine beneath a block-based rich-text editor: a
//! shared record cache, path-scoped record stores, a pure operation reducer,
//! and unit-of-work transactions that apply every operation to the local
//! cache the moment it is added and, on commit, either finalize locally or
//! enqueue the batch onto an ordered outbox for the remote authority.
//!
//! # Quick start
//!
//! ```
//! use foliodb::{Command, Operation, Pointer, RecordPath, Session, Table, Value};
//!
//! let session = Session::new();
//! let store = session.store_for("local-1", Pointer::new(Table::Page, "p-1"));
//!
//! session
//!     .transact("local-1", |transaction| {
//!         transaction.add_operation(
//!             &store,
//!             Operation::new(
//!                 Table::Page,
//!                 "p-1",
//!                 RecordPath::root().key("title"),
//!                 Command::Set { value: Value::from("Hello") },
//!             ),
//!         )
//!     })
//!     .unwrap();
//!
//! assert_eq!(
//!     store.property_store("title").get_value(),
//!     Some(Value::from("Hello"))
//! );
//! ```

#![warn(missing_docs)]

pub use folio_core::{
    is_guest_user, is_local_user, is_networked_user, Command, Error, ListPosition, Operation,
    PathSegment, Pointer, Record, RecordPath, RejectReason, Result, Role, Table, Value,
};
pub use folio_engine::{
    Applied, Commit, CommandFacade, DeliveryOutcome, DeliveryStatus, DeliveryTicket, QueueEntry,
    Session, Transaction, TransactionQueue,
};
pub use folio_store::{
    FileStorageProvider, MemoryStorageProvider, RecordCache, RecordStore, StorageProvider,
    StoreContext,
};
