//! # graphfs-graph
//!
//! The metadata graph and everything that guards it: the typed graph
//! state, the multiple-readers/single-writer transaction manager, the
//! explicit per-request context that carries the active transaction and
//! principal, and the write-ahead log used for recovery.

pub mod context;
pub mod listener;
pub mod mutation;
pub mod recovery;
pub mod state;
pub mod transaction;
pub mod wal;

pub use context::{RequestContext, ViewOptions};
pub use listener::{TransactionEvent, TransactionListener};
pub use mutation::Mutation;
pub use state::GraphState;
pub use transaction::{Transaction, TransactionManager, TransactionMode, TransactionState};
pub use wal::{LogRecord, WriteAheadLog};
