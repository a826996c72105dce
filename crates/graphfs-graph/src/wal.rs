//! Append-only transaction log.
//!
//! One JSON record per line. Each committed write transaction appends a
//! single record holding its forward mutations; the append is flushed (and
//! optionally synced) before the commit is acknowledged.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

use graphfs_core::error::{AppError, ErrorKind};
use graphfs_core::result::AppResult;
use graphfs_core::types::{PrincipalId, TransactionId};

use crate::mutation::Mutation;

/// Log file name inside the configured log directory.
pub const LOG_FILE_NAME: &str = "transactions.jsonl";

/// One committed write transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Monotonic commit sequence number.
    pub seq: u64,
    /// Transaction identifier.
    pub transaction: TransactionId,
    /// Commit time.
    pub timestamp: DateTime<Utc>,
    /// Principal the transaction ran as.
    #[serde(default)]
    pub principal: Option<PrincipalId>,
    /// Human-readable summary of the operation.
    #[serde(default)]
    pub message: Option<String>,
    /// Forward mutations in application order.
    pub mutations: Vec<Mutation>,
}

/// Handle on the open log file.
#[derive(Debug)]
pub struct WriteAheadLog {
    path: PathBuf,
    file: fs::File,
    fsync: bool,
    /// Length of the file covered by acknowledged records.
    len: u64,
    /// Set when a failed append could not be cut off again.
    poisoned: bool,
    #[cfg(test)]
    inject_sync_failure: bool,
}

impl WriteAheadLog {
    /// Open (creating if needed) the log inside `dir`.
    ///
    /// A torn trailing record left by a crash is cut off before the file is
    /// opened for appending.
    pub async fn open(dir: &Path, fsync: bool) -> AppResult<Self> {
        fs::create_dir_all(dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create log directory: {}", dir.display()),
                e,
            )
        })?;
        let path = dir.join(LOG_FILE_NAME);

        if fs::try_exists(&path).await? {
            let (_, valid_len) = Self::scan(&path).await?;
            let actual = fs::metadata(&path).await?.len();
            if valid_len < actual {
                warn!(
                    path = %path.display(),
                    discarded = actual - valid_len,
                    "Truncating torn transaction log tail"
                );
                let file = fs::OpenOptions::new().write(true).open(&path).await?;
                file.set_len(valid_len).await?;
                file.sync_all().await?;
            }
        }

        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open transaction log: {}", path.display()),
                    e,
                )
            })?;
        let len = file.metadata().await?.len();

        Ok(Self {
            path,
            file,
            fsync,
            len,
            poisoned: false,
            #[cfg(test)]
            inject_sync_failure: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and make it durable.
    ///
    /// On failure the file is cut back to its last acknowledged length, so
    /// a record whose commit was refused never reaches recovery. If that
    /// cut fails too, the log refuses every further append.
    pub async fn append(&mut self, record: &LogRecord) -> AppResult<()> {
        if self.poisoned {
            return Err(AppError::storage(
                "Transaction log is unusable after a failed append; restart to recover",
            ));
        }
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        if let Err(e) = self.write_line(&line).await {
            self.discard_tail().await;
            return Err(e);
        }
        self.len += line.len() as u64;

        debug!(
            seq = record.seq,
            mutations = record.mutations.len(),
            "Appended transaction log record"
        );
        Ok(())
    }

    async fn write_line(&mut self, line: &[u8]) -> AppResult<()> {
        self.file.write_all(line).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to append transaction log", e)
        })?;
        self.file.flush().await?;

        #[cfg(test)]
        if std::mem::take(&mut self.inject_sync_failure) {
            return Err(AppError::storage("Failed to sync transaction log"));
        }

        if self.fsync {
            self.file.sync_data().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to sync transaction log", e)
            })?;
        }
        Ok(())
    }

    /// Drop whatever a failed append left past the acknowledged length.
    async fn discard_tail(&mut self) {
        let cut = async {
            self.file.set_len(self.len).await?;
            self.file.sync_all().await
        };
        if let Err(e) = cut.await {
            error!(
                path = %self.path.display(),
                len = self.len,
                error = %e,
                "Failed to discard partial transaction log record"
            );
            self.poisoned = true;
        }
    }

    /// Make the next append fail after its bytes were written.
    #[cfg(test)]
    pub(crate) fn fail_next_sync(&mut self) {
        self.inject_sync_failure = true;
    }

    /// Read every complete record from a log file. A missing file is empty.
    pub async fn read_all(path: &Path) -> AppResult<Vec<LogRecord>> {
        if !fs::try_exists(path).await? {
            return Ok(Vec::new());
        }
        let (records, _) = Self::scan(path).await?;
        Ok(records)
    }

    /// Parse records and return them with the byte length they cover.
    ///
    /// Only the final line may be malformed; anything else is corruption.
    async fn scan(path: &Path) -> AppResult<(Vec<LogRecord>, u64)> {
        let content = fs::read(path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read transaction log: {}", path.display()),
                e,
            )
        })?;

        let mut records = Vec::new();
        let mut offset = 0usize;
        while offset < content.len() {
            let rest = &content[offset..];
            let (line, consumed, terminated) = match rest.iter().position(|b| *b == b'\n') {
                Some(idx) => (&rest[..idx], idx + 1, true),
                None => (rest, rest.len(), false),
            };
            let is_last = offset + consumed >= content.len();

            if line.iter().all(u8::is_ascii_whitespace) {
                offset += consumed;
                continue;
            }

            match serde_json::from_slice::<LogRecord>(line) {
                Ok(record) if terminated => records.push(record),
                Err(e) if !is_last => {
                    return Err(AppError::with_source(
                        ErrorKind::Serialization,
                        format!(
                            "Corrupt transaction log record at byte {offset} in {}",
                            path.display()
                        ),
                        e,
                    ));
                }
                _ => {
                    warn!(
                        path = %path.display(),
                        offset,
                        "Ignoring incomplete final transaction log record"
                    );
                    break;
                }
            }
            offset += consumed;
        }

        Ok((records, offset as u64))
    }
}
