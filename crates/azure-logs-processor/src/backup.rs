// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Durable storage for whatever an invocation could not deliver.
//!
//! Two tiers are kept apart:
//! - [`BackupTier::FailedParse`]: the raw message bodies of a batch that could not be
//!   transformed, newline-joined in their original order.
//! - [`BackupTier::FailedSend`]: the payloads HEC did not accept, newline-joined.

use async_trait::async_trait;
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::BackupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackupTier {
    FailedParse,
    FailedSend,
}

impl BackupTier {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupTier::FailedParse => "failed-parse",
            BackupTier::FailedSend => "failed-send",
        }
    }
}

impl fmt::Display for BackupTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts one blob per tier and invocation.
#[async_trait]
pub trait BackupSink: Send + Sync {
    async fn store(&self, tier: BackupTier, blob: Vec<u8>) -> Result<(), BackupError>;
}

/// Joins blobs with `\n`, without a trailing newline.
pub fn join_lines<I, T>(parts: I) -> Vec<u8>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut joined = Vec::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            joined.push(b'\n');
        }
        joined.extend_from_slice(part.as_ref());
    }
    joined
}

const MAX_CREATE_ATTEMPTS: usize = 64;

/// Writes each blob to a new file `<directory>/<tier>-<unix millis>-<sequence>.log`.
///
/// Existing files are never overwritten.
#[derive(Debug)]
pub struct FileBackupSink {
    directory: PathBuf,
    sequence: AtomicU64,
}

impl FileBackupSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            sequence: AtomicU64::new(0),
        }
    }

    fn blob_path(&self, tier: BackupTier) -> PathBuf {
        let millis = chrono::Utc::now().timestamp_millis();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.directory.join(format!("{tier}-{millis}-{sequence}.log"))
    }

    async fn create_blob_file(
        &self,
        tier: BackupTier,
    ) -> Result<(tokio::fs::File, PathBuf), BackupError> {
        let mut attempts = 0;
        loop {
            let path = self.blob_path(tier);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((file, path)),
                Err(e)
                    if e.kind() == ErrorKind::AlreadyExists && attempts < MAX_CREATE_ATTEMPTS =>
                {
                    warn!(
                        "Backup file {} already exists, picking another name",
                        path.display()
                    );
                    attempts += 1;
                }
                Err(source) => return Err(BackupError::Io { tier, path, source }),
            }
        }
    }
}

#[async_trait]
impl BackupSink for FileBackupSink {
    async fn store(&self, tier: BackupTier, blob: Vec<u8>) -> Result<(), BackupError> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| BackupError::Io {
                tier,
                path: self.directory.clone(),
                source,
            })?;

        let (mut file, path) = self.create_blob_file(tier).await?;
        let io_error = |source| BackupError::Io {
            tier,
            path: path.clone(),
            source,
        };
        file.write_all(&blob).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;

        debug!("Wrote {} bytes of {} backup to {}", blob.len(), tier, path.display());
        Ok(())
    }
}

/// Keeps blobs in memory, for hosts that hand them to their own output bindings.
#[derive(Debug, Default)]
pub struct MemoryBackupSink {
    blobs: Mutex<Vec<(BackupTier, Vec<u8>)>>,
}

impl MemoryBackupSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains every blob stored so far, oldest first.
    pub fn take(&self) -> Vec<(BackupTier, Vec<u8>)> {
        match self.blobs.lock() {
            Ok(mut blobs) => std::mem::take(&mut *blobs),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl BackupSink for MemoryBackupSink {
    async fn store(&self, tier: BackupTier, blob: Vec<u8>) -> Result<(), BackupError> {
        let mut blobs = self.blobs.lock().map_err(|_| BackupError::Rejected {
            tier,
            message: "memory sink lock poisoned".to_string(),
        })?;
        blobs.push((tier, blob));
        Ok(())
    }
}
