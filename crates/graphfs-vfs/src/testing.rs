//! Shared fixtures for the VFS unit tests.

use graphfs_core::AppResult;
use graphfs_core::traits::BlobInfo;
use graphfs_core::types::BlobId;
use graphfs_entity::{Capabilities, Principal};
use graphfs_graph::{Mutation, RequestContext, TransactionManager, TransactionMode};

use crate::service::Vfs;

pub(crate) struct Harness {
    pub manager: TransactionManager,
    pub vfs: Vfs,
}

/// A blob reference of `size` bytes; content is never looked at here.
pub(crate) fn blob(size: u64) -> BlobInfo {
    BlobInfo {
        id: BlobId::new(format!("{size:064x}")),
        size,
        checksum_sha256: String::new(),
    }
}

impl Harness {
    /// Users alice and carol, and the administrator root.
    pub async fn new() -> Self {
        let harness = Self {
            manager: TransactionManager::in_memory(),
            vfs: Vfs::new("urn:graphfs:", Default::default()),
        };
        harness
            .write_as("system", |_, ctx| {
                for principal in [
                    Principal::user("alice", "Alice", Capabilities::default()),
                    Principal::user("carol", "Carol", Capabilities::default()),
                    Principal::user(
                        "root",
                        "Root",
                        Capabilities {
                            admin: true,
                            ..Capabilities::default()
                        },
                    ),
                ] {
                    ctx.apply(Mutation::PutPrincipal { principal })?;
                }
                Ok(())
            })
            .await
            .unwrap();
        harness
    }

    pub async fn write_as<T>(
        &self,
        principal: &str,
        f: impl FnOnce(&Vfs, &mut RequestContext) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut ctx = RequestContext::new(principal);
        self.manager.begin(&mut ctx, TransactionMode::Write).await?;
        match f(&self.vfs, &mut ctx) {
            Ok(value) => {
                self.manager.commit(&mut ctx).await?;
                Ok(value)
            }
            Err(e) => {
                self.manager.abort(&mut ctx).await?;
                Err(e)
            }
        }
    }

    pub async fn read_as<T>(
        &self,
        principal: &str,
        f: impl FnOnce(&Vfs, &RequestContext) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut ctx = RequestContext::new(principal);
        self.manager.begin(&mut ctx, TransactionMode::Read).await?;
        let outcome = f(&self.vfs, &ctx);
        self.manager.commit(&mut ctx).await?;
        outcome
    }
}
