//! Multiple-readers/single-writer transaction manager.
//!
//! Read transactions hold a shared guard on the graph; write transactions
//! hold the exclusive guard and mutate the graph in place, recording the
//! inverse of every mutation so that an abort restores the prior state.
//! Committed write transactions are appended to the write-ahead log before
//! the exclusive guard is released.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, error, info, warn};

use graphfs_core::types::{PrincipalId, TransactionId};
use graphfs_core::{AppError, AppResult};

use crate::context::RequestContext;
use crate::listener::{TransactionEvent, TransactionListener};
use crate::mutation::Mutation;
use crate::state::GraphState;
use crate::wal::{LogRecord, WriteAheadLog};

/// Read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionMode {
    Read,
    Write,
}

impl fmt::Display for TransactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Lifecycle state of a request's transaction slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    ActiveRead,
    ActiveWrite,
    Committed,
    Aborted,
}

#[derive(Debug)]
enum Guard {
    Read(OwnedRwLockReadGuard<GraphState>),
    Write(OwnedRwLockWriteGuard<GraphState>),
}

/// An open transaction. Dropping it without commit rolls it back.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    mode: TransactionMode,
    guard: Guard,
    mutations: Vec<Mutation>,
    undo: Vec<Mutation>,
    message: Option<String>,
}

impl Transaction {
    fn new(id: TransactionId, mode: TransactionMode, guard: Guard) -> Self {
        Self {
            id,
            mode,
            guard,
            mutations: Vec::new(),
            undo: Vec::new(),
            message: None,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    pub fn graph(&self) -> &GraphState {
        match &self.guard {
            Guard::Read(g) => g,
            Guard::Write(g) => g,
        }
    }

    /// Forward mutations applied so far.
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Apply a mutation. Fails in read transactions; read locks are never
    /// promoted.
    pub fn apply(&mut self, mutation: Mutation) -> AppResult<()> {
        let Guard::Write(graph) = &mut self.guard else {
            return Err(AppError::transaction_state(format!(
                "Cannot {} inside a read transaction",
                mutation.op_name()
            )));
        };
        let inverse = graph.apply(mutation.clone())?;
        self.undo.push(inverse);
        self.mutations.push(mutation);
        Ok(())
    }

    fn rollback(&mut self) {
        if let Guard::Write(graph) = &mut self.guard {
            while let Some(inverse) = self.undo.pop() {
                if let Err(e) = graph.apply(inverse) {
                    error!(transaction = %self.id, error = %e, "Failed to roll back mutation");
                }
            }
        }
        self.mutations.clear();
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.undo.is_empty() {
            warn!(
                transaction = %self.id,
                pending = self.undo.len(),
                "Transaction dropped without commit; rolling back"
            );
            self.rollback();
        }
    }
}

/// Coordinates all access to the shared graph.
#[derive(Debug)]
pub struct TransactionManager {
    graph: Arc<RwLock<GraphState>>,
    wal: Option<Mutex<WriteAheadLog>>,
    seq: AtomicU64,
    listeners: Vec<Arc<dyn TransactionListener>>,
    pub(crate) dataset_dir: Option<PathBuf>,
}

impl TransactionManager {
    /// A manager over an empty graph with no log.
    pub fn in_memory() -> Self {
        Self::with_state(GraphState::new())
    }

    /// A manager over an existing graph with no log.
    pub fn with_state(state: GraphState) -> Self {
        Self::assemble(state, None, 0, None)
    }

    pub(crate) fn assemble(
        state: GraphState,
        wal: Option<WriteAheadLog>,
        seq: u64,
        dataset_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            graph: Arc::new(RwLock::new(state)),
            wal: wal.map(Mutex::new),
            seq: AtomicU64::new(seq),
            listeners: Vec::new(),
            dataset_dir,
        }
    }

    /// Register a lifecycle listener.
    pub fn with_listener(mut self, listener: Arc<dyn TransactionListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Sequence number of the last committed write.
    pub fn last_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    pub(crate) fn shared_graph(&self) -> &Arc<RwLock<GraphState>> {
        &self.graph
    }

    fn notify(&self, event: TransactionEvent) {
        for listener in &self.listeners {
            listener.on_event(event);
        }
    }

    /// Open a transaction on `ctx`, waiting for the lock.
    ///
    /// Any number of read transactions may be open at once; a write
    /// transaction excludes every other transaction.
    pub async fn begin(&self, ctx: &mut RequestContext, mode: TransactionMode) -> AppResult<()> {
        if let Some(active) = ctx.active_mode() {
            return Err(AppError::transaction_state(format!(
                "A {active} transaction is already active; nested transactions are not supported"
            )));
        }

        let id = TransactionId::new();
        let guard = match mode {
            TransactionMode::Read => Guard::Read(Arc::clone(&self.graph).read_owned().await),
            TransactionMode::Write => Guard::Write(Arc::clone(&self.graph).write_owned().await),
        };
        debug!(transaction = %id, %mode, principal = %ctx.principal(), "Transaction started");

        ctx.install(Transaction::new(id, mode, guard));
        self.notify(TransactionEvent::Begin(mode));
        Ok(())
    }

    /// Make the active transaction's changes durable and release its lock.
    pub async fn commit(&self, ctx: &mut RequestContext) -> AppResult<()> {
        let mut txn = ctx
            .take_active()
            .ok_or_else(|| AppError::transaction_state("No active transaction to commit"))?;
        let mode = txn.mode;

        if mode == TransactionMode::Write && !txn.mutations.is_empty() {
            if let Err(e) = self.log_commit(&txn, ctx.principal()).await {
                error!(transaction = %txn.id, error = %e, "Commit failed; rolling back");
                txn.rollback();
                drop(txn);
                ctx.finish(TransactionState::Aborted);
                self.notify(TransactionEvent::Abort(mode));
                return Err(e);
            }
        }

        txn.undo.clear();
        let id = txn.id;
        let count = txn.mutations.len();
        let message = txn.message.take();
        drop(txn);
        ctx.finish(TransactionState::Committed);

        if count > 0 {
            info!(
                transaction = %id,
                seq = self.last_seq(),
                mutations = count,
                message = message.as_deref().unwrap_or(""),
                "Transaction committed"
            );
        } else {
            debug!(transaction = %id, %mode, "Transaction committed");
        }
        self.notify(TransactionEvent::Commit(mode));
        Ok(())
    }

    /// Discard the active transaction's changes and release its lock.
    pub async fn abort(&self, ctx: &mut RequestContext) -> AppResult<()> {
        let mut txn = ctx
            .take_active()
            .ok_or_else(|| AppError::transaction_state("No active transaction to abort"))?;
        let mode = txn.mode;
        let discarded = txn.undo.len();
        txn.rollback();
        let id = txn.id;
        drop(txn);
        ctx.finish(TransactionState::Aborted);

        debug!(transaction = %id, %mode, discarded, "Transaction aborted");
        self.notify(TransactionEvent::Abort(mode));
        Ok(())
    }

    async fn log_commit(&self, txn: &Transaction, principal: &PrincipalId) -> AppResult<()> {
        let seq = self.seq.load(Ordering::SeqCst) + 1;
        if let Some(wal) = &self.wal {
            let record = LogRecord {
                seq,
                transaction: txn.id,
                timestamp: Utc::now(),
                principal: Some(principal.clone()),
                message: txn.message.clone(),
                mutations: txn.mutations.clone(),
            };
            wal.lock().await.append(&record).await?;
        }
        self.seq.store(seq, Ordering::SeqCst);
        Ok(())
    }

    /// Run `f` inside a read transaction.
    ///
    /// Inside an already active transaction of either mode `f` simply runs
    /// within it.
    pub async fn execute_read<T, F>(&self, ctx: &mut RequestContext, f: F) -> AppResult<T>
    where
        F: AsyncFnOnce(&mut RequestContext) -> AppResult<T>,
    {
        if ctx.active_mode().is_some() {
            return f(ctx).await;
        }
        self.begin(ctx, TransactionMode::Read).await?;
        let outcome = f(ctx).await;
        self.finish_with(ctx, outcome).await
    }

    /// Run `f` inside a write transaction, committing on success and aborting
    /// on error.
    ///
    /// Inside an active write transaction `f` runs within it; inside an
    /// active read transaction this fails.
    pub async fn execute_write<T, F>(&self, ctx: &mut RequestContext, f: F) -> AppResult<T>
    where
        F: AsyncFnOnce(&mut RequestContext) -> AppResult<T>,
    {
        match ctx.active_mode() {
            Some(TransactionMode::Write) => return f(ctx).await,
            Some(TransactionMode::Read) => {
                return Err(AppError::transaction_state(
                    "Cannot promote a read transaction to a write transaction",
                ));
            }
            None => {}
        }
        self.begin(ctx, TransactionMode::Write).await?;
        let outcome = f(ctx).await;
        self.finish_with(ctx, outcome).await
    }

    async fn finish_with<T>(&self, ctx: &mut RequestContext, outcome: AppResult<T>) -> AppResult<T> {
        match outcome {
            Ok(value) => {
                self.commit(ctx).await?;
                Ok(value)
            }
            Err(e) => {
                if ctx.active_mode().is_some() {
                    self.abort(ctx).await?;
                }
                Err(e)
            }
        }
    }
}
