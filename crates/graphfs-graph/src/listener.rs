//! Transaction lifecycle hooks.

use std::fmt;

use crate::transaction::TransactionMode;

/// Lifecycle point reported to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionEvent {
    /// The transaction acquired its lock.
    Begin(TransactionMode),
    /// The transaction committed and its lock was released.
    Commit(TransactionMode),
    /// The transaction was rolled back and its lock was released.
    Abort(TransactionMode),
}

impl fmt::Display for TransactionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin(mode) => write!(f, "begin({mode})"),
            Self::Commit(mode) => write!(f, "commit({mode})"),
            Self::Abort(mode) => write!(f, "abort({mode})"),
        }
    }
}

/// Observer notified synchronously at each lifecycle point.
pub trait TransactionListener: Send + Sync + fmt::Debug {
    fn on_event(&self, event: TransactionEvent);
}
