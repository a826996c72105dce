//! Per-request context.
//!
//! A [`RequestContext`] is created by the protocol adapter for every request
//! and passed explicitly to every operation. It carries the authenticated
//! principal, the view options, and the at-most-one active transaction.

use graphfs_core::types::PrincipalId;
use graphfs_core::{AppError, AppResult};

use crate::mutation::Mutation;
use crate::state::GraphState;
use crate::transaction::{Transaction, TransactionMode, TransactionState};

/// Request-scoped view flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Resolve tombstones instead of live resources.
    pub show_deleted: bool,
}

#[derive(Debug)]
enum Slot {
    Idle,
    Active(Transaction),
    Finished(TransactionState),
}

/// Explicit context threaded through every operation of one request.
#[derive(Debug)]
pub struct RequestContext {
    principal: PrincipalId,
    view: ViewOptions,
    slot: Slot,
}

impl RequestContext {
    pub fn new(principal: impl Into<PrincipalId>) -> Self {
        Self {
            principal: principal.into(),
            view: ViewOptions::default(),
            slot: Slot::Idle,
        }
    }

    pub fn with_view(mut self, view: ViewOptions) -> Self {
        self.view = view;
        self
    }

    pub fn principal(&self) -> &PrincipalId {
        &self.principal
    }

    pub fn view(&self) -> ViewOptions {
        self.view
    }

    pub fn show_deleted(&self) -> bool {
        self.view.show_deleted
    }

    /// Current transaction state of this request.
    pub fn state(&self) -> TransactionState {
        match &self.slot {
            Slot::Idle => TransactionState::Idle,
            Slot::Active(txn) => match txn.mode() {
                TransactionMode::Read => TransactionState::ActiveRead,
                TransactionMode::Write => TransactionState::ActiveWrite,
            },
            Slot::Finished(state) => *state,
        }
    }

    /// Mode of the active transaction, if any.
    pub fn active_mode(&self) -> Option<TransactionMode> {
        match &self.slot {
            Slot::Active(txn) => Some(txn.mode()),
            _ => None,
        }
    }

    pub fn transaction(&self) -> AppResult<&Transaction> {
        match &self.slot {
            Slot::Active(txn) => Ok(txn),
            _ => Err(no_transaction()),
        }
    }

    pub fn transaction_mut(&mut self) -> AppResult<&mut Transaction> {
        match &mut self.slot {
            Slot::Active(txn) => Ok(txn),
            _ => Err(no_transaction()),
        }
    }

    /// The graph as seen by the active transaction.
    pub fn graph(&self) -> AppResult<&GraphState> {
        Ok(self.transaction()?.graph())
    }

    /// Apply a mutation inside the active write transaction.
    pub fn apply(&mut self, mutation: Mutation) -> AppResult<()> {
        self.transaction_mut()?.apply(mutation)
    }

    /// Record the commit message of the active transaction.
    pub fn set_message(&mut self, message: impl Into<String>) -> AppResult<()> {
        self.transaction_mut()?.set_message(message);
        Ok(())
    }

    pub(crate) fn install(&mut self, txn: Transaction) {
        self.slot = Slot::Active(txn);
    }

    pub(crate) fn take_active(&mut self) -> Option<Transaction> {
        match std::mem::replace(&mut self.slot, Slot::Idle) {
            Slot::Active(txn) => Some(txn),
            other => {
                self.slot = other;
                None
            }
        }
    }

    pub(crate) fn finish(&mut self, state: TransactionState) {
        self.slot = Slot::Finished(state);
    }
}

fn no_transaction() -> AppError {
    AppError::transaction_state("No active transaction is bound to this request")
}
