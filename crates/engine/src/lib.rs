//! Transaction engine for Folio
//!
//! This crate implements the mutation side of the document store:
//! - CommandFacade: the pure reducer applying operations to record snapshots
//! - Transaction: the unit of work batching operations with optimistic apply
//! - TransactionQueue: the ordered outbox toward the remote authority
//! - Session: the constructed-and-injected bundle everything hangs off

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod facade;
pub mod queue;
pub mod session;
pub mod transaction;

pub use facade::{Applied, CommandFacade};
pub use queue::{
    DeliveryOutcome, DeliveryStatus, DeliveryTicket, QueueEntry, TransactionQueue,
};
pub use session::Session;
pub use transaction::{Commit, Transaction};
