//! Startup recovery and checkpoints.
//!
//! On open the graph is rebuilt from the last checkpoint in the dataset
//! directory, then every log record with a higher sequence number is
//! replayed on top of it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use graphfs_core::config::GraphConfig;
use graphfs_core::error::{AppError, ErrorKind};
use graphfs_core::result::AppResult;
use graphfs_core::types::{PrincipalId, ResourceId};
use graphfs_entity::{GrantEdge, Principal, Resource};

use crate::mutation::Mutation;
use crate::state::GraphState;
use crate::transaction::TransactionManager;
use crate::wal::{LOG_FILE_NAME, WriteAheadLog};

/// Checkpoint file name inside the dataset directory.
pub const SNAPSHOT_FILE_NAME: &str = "snapshot.json";

#[derive(Debug, Serialize, Deserialize)]
struct GrantRecord {
    principal: PrincipalId,
    resource: ResourceId,
    edge: GrantEdge,
}

/// Serialized form of a whole graph.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    seq: u64,
    created_at: DateTime<Utc>,
    resources: Vec<Resource>,
    principals: Vec<Principal>,
    grants: Vec<GrantRecord>,
}

impl Snapshot {
    fn capture(graph: &GraphState, seq: u64) -> Self {
        let mut resources: Vec<Resource> = graph.resources().cloned().collect();
        resources.sort_by(|a, b| a.path.cmp(&b.path).then(a.date_created.cmp(&b.date_created)));
        let mut principals: Vec<Principal> = graph.principals().cloned().collect();
        principals.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        let grants = graph
            .grant_triples()
            .into_iter()
            .map(|(principal, resource, edge)| GrantRecord {
                principal,
                resource,
                edge,
            })
            .collect();
        Self {
            seq,
            created_at: Utc::now(),
            resources,
            principals,
            grants,
        }
    }

    fn restore(self) -> AppResult<GraphState> {
        let mut graph = GraphState::new();
        for resource in self.resources {
            graph.apply(Mutation::PutResource { resource })?;
        }
        for principal in self.principals {
            graph.apply(Mutation::PutPrincipal { principal })?;
        }
        for grant in self.grants {
            graph.apply(Mutation::AddGrant {
                principal: grant.principal,
                resource: grant.resource,
                edge: grant.edge,
            })?;
        }
        Ok(graph)
    }
}

async fn load_snapshot(dir: &Path) -> AppResult<Option<Snapshot>> {
    let path = dir.join(SNAPSHOT_FILE_NAME);
    if !fs::try_exists(&path).await? {
        return Ok(None);
    }
    let content = fs::read(&path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to read checkpoint: {}", path.display()),
            e,
        )
    })?;
    Ok(Some(serde_json::from_slice(&content)?))
}

impl TransactionManager {
    /// Open the persistent graph described by `config`, recovering its
    /// state from the checkpoint and the transaction log.
    pub async fn open(config: &GraphConfig) -> AppResult<Self> {
        let dataset_dir = PathBuf::from(&config.dataset_path);
        let log_dir = PathBuf::from(&config.transaction_log_path);
        fs::create_dir_all(&dataset_dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create dataset directory: {}", dataset_dir.display()),
                e,
            )
        })?;

        let (mut graph, mut seq) = match load_snapshot(&dataset_dir).await? {
            Some(snapshot) => {
                let seq = snapshot.seq;
                (snapshot.restore()?, seq)
            }
            None => (GraphState::new(), 0),
        };
        let checkpoint_seq = seq;

        let records = WriteAheadLog::read_all(&log_dir.join(LOG_FILE_NAME)).await?;
        let mut replayed = 0usize;
        for record in records.into_iter().filter(|r| r.seq > checkpoint_seq) {
            for mutation in record.mutations {
                graph.apply(mutation).map_err(|e| {
                    AppError::new(
                        ErrorKind::Storage,
                        format!("Failed to replay transaction {}: {e}", record.seq),
                    )
                })?;
            }
            seq = record.seq;
            replayed += 1;
        }

        let wal = if config.wal_enabled {
            Some(WriteAheadLog::open(&log_dir, config.fsync).await?)
        } else {
            None
        };

        info!(
            checkpoint_seq,
            replayed,
            seq,
            resources = graph.resource_count(),
            live = graph.live_count(),
            "Graph recovered"
        );

        Ok(Self::assemble(graph, wal, seq, Some(dataset_dir)))
    }

    /// Write a checkpoint of the current graph. Returns its sequence number.
    ///
    /// Holds a shared lock, so it waits for any writer and blocks new ones
    /// until the file is in place.
    pub async fn checkpoint(&self) -> AppResult<u64> {
        let dir = self
            .dataset_dir
            .as_ref()
            .ok_or_else(|| AppError::configuration("No dataset directory configured"))?;

        let graph = self.shared_graph().read().await;
        let seq = self.last_seq();
        let snapshot = Snapshot::capture(&graph, seq);
        let body = serde_json::to_vec(&snapshot)?;

        let tmp = dir.join(format!("{SNAPSHOT_FILE_NAME}.tmp"));
        let mut file = fs::File::create(&tmp).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create checkpoint: {}", tmp.display()),
                e,
            )
        })?;
        file.write_all(&body).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, dir.join(SNAPSHOT_FILE_NAME)).await?;
        drop(graph);

        info!(seq, bytes = body.len(), "Checkpoint written");
        Ok(seq)
    }

    /// Recover the graph and write a checkpoint without taking over the log.
    ///
    /// The log is only read, never truncated or appended to, so a server
    /// appending to it at the same time is left alone: a record it is still
    /// writing is skipped like any incomplete final line.
    pub async fn checkpoint_offline(config: &GraphConfig) -> AppResult<u64> {
        let read_only = GraphConfig {
            wal_enabled: false,
            ..config.clone()
        };
        Self::open(&read_only).await?.checkpoint().await
    }
}
