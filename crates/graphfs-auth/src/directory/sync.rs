//! Sync directory principals into the graph.

use chrono::Utc;
use tracing::info;

use graphfs_core::AppResult;
use graphfs_entity::PrincipalKind;
use graphfs_graph::{GraphState, Mutation, RequestContext, TransactionManager, TransactionMode};

use super::UserDirectory;

/// Principal that owns maintenance transactions.
pub const SYSTEM_PRINCIPAL: &str = "system";

impl UserDirectory {
    /// Mutations that bring the graph's principals in line with the directory.
    ///
    /// New or changed principals are written; workspaces that disappeared
    /// from the directory are tombstoned. Users are never removed.
    pub fn sync_mutations(&self, graph: &GraphState) -> Vec<Mutation> {
        let mut mutations: Vec<Mutation> = self
            .principals()
            .iter()
            .filter(|p| graph.principal(&p.id) != Some(*p))
            .map(|p| Mutation::PutPrincipal {
                principal: p.clone(),
            })
            .collect();

        let now = Utc::now();
        for existing in graph.principals() {
            let configured = self.principals().iter().any(|p| p.id == existing.id);
            if existing.kind == PrincipalKind::Workspace && !existing.is_deleted() && !configured {
                let mut tombstone = existing.clone();
                tombstone.date_deleted = Some(now);
                mutations.push(Mutation::PutPrincipal {
                    principal: tombstone,
                });
            }
        }
        mutations
    }

    /// Apply [`sync_mutations`](Self::sync_mutations) in one write transaction.
    pub async fn sync_into(&self, manager: &TransactionManager) -> AppResult<usize> {
        let mut ctx = RequestContext::new(SYSTEM_PRINCIPAL);
        manager.begin(&mut ctx, TransactionMode::Write).await?;

        let mutations = self.sync_mutations(ctx.graph()?);
        let count = mutations.len();
        let applied = mutations
            .into_iter()
            .try_for_each(|mutation| ctx.apply(mutation))
            .and_then(|()| ctx.set_message("Syncing user directory"));
        if let Err(e) = applied {
            manager.abort(&mut ctx).await?;
            return Err(e);
        }
        manager.commit(&mut ctx).await?;

        info!(changed = count, "User directory synced");
        Ok(count)
    }
}
