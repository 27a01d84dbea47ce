//! Durable FIFO queue of post drafts.
//!
//! The whole queue lives in one pretty-printed JSON array. Every mutation
//! rewrites the array into a temporary file next to the store and renames it
//! over the canonical path, so the store on disk is always either the state
//! before an operation or the state after it.
//!
//! ```text
//! ~/.postdraft/
//! ├── drafts_queue.json        # [ {draft}, {draft}, ... ] head first
//! ├── drafts_queue.json.lock   # advisory lock held while a queue is open
//! └── .drafts_queue.json.*.tmp # only exists mid-write; leftovers from a
//!                              # crash are removed on the next open
//! ```

use std::collections::{HashSet, VecDeque};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::DraftRecord;

use super::limits::{DraftLimits, ValidationError};

/// Errors that can occur with the draft queue
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Invalid draft: {0}")]
    Validation(#[from] ValidationError),

    #[error("Queue is empty")]
    Empty,

    #[error("Queue store is corrupt: {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Storage error at {}: {source}", path.display())]
    Storage { path: PathBuf, source: io::Error },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Queue is locked by another process: {}", .0.display())]
    Locked(PathBuf),
}

impl QueueError {
    fn storage(path: &Path, source: io::Error) -> Self {
        Self::Storage {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of repairing a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    /// Store was absent or readable; nothing changed
    Healthy { drafts: usize },

    /// Store was unreadable; it was moved aside and replaced by an empty queue
    Reset { backup: PathBuf },
}

/// File-backed FIFO queue of drafts
pub struct DraftQueue {
    /// Canonical store path
    path: PathBuf,

    /// In-memory copy of the store, head first
    drafts: VecDeque<DraftRecord>,

    /// Limits checked on enqueue
    limits: DraftLimits,

    /// Lock file handle; the advisory lock lives as long as this does
    _lock: File,
}

impl std::fmt::Debug for DraftQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftQueue")
            .field("path", &self.path)
            .field("size", &self.drafts.len())
            .finish()
    }
}

impl DraftQueue {
    /// Open (or create) the queue stored at `path`
    ///
    /// An absent store is an empty queue. A store that cannot be parsed is
    /// reported as [`QueueError::Corrupt`] and left untouched on disk.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, QueueError> {
        Self::open_with_limits(path, DraftLimits::default())
    }

    /// Open the queue with custom draft limits
    pub fn open_with_limits(path: impl Into<PathBuf>, limits: DraftLimits) -> Result<Self, QueueError> {
        let path = path.into();

        let dir = store_dir(&path);
        fs::create_dir_all(dir).map_err(|e| QueueError::storage(dir, e))?;

        let lock = acquire_lock(&path)?;
        remove_stray_temp_files(&path);
        let drafts = load(&path)?;

        info!(path = %path.display(), size = drafts.len(), "Opened draft queue");

        Ok(Self {
            path,
            drafts,
            limits,
            _lock: lock,
        })
    }

    /// Get the default store path ($POSTDRAFT_HOME/drafts_queue.json)
    pub fn default_path() -> anyhow::Result<PathBuf> {
        crate::config::queue_path()
    }

    /// Open the default queue
    pub fn open_default() -> anyhow::Result<Self> {
        let path = Self::default_path()?;
        Ok(Self::open(path)?)
    }

    /// Get the store path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Limits applied at enqueue time
    pub fn limits(&self) -> &DraftLimits {
        &self.limits
    }

    /// Append a draft to the tail
    pub fn enqueue(&mut self, draft: DraftRecord) -> Result<(), QueueError> {
        self.limits.validate(&draft)?;

        if self.drafts.iter().any(|d| d.id == draft.id) {
            return Err(ValidationError::DuplicateId(draft.id.to_string()).into());
        }

        self.persist(self.drafts.iter().chain(std::iter::once(&draft)))?;

        debug!(id = %draft.id, chars = draft.char_count(), "Enqueued draft");
        self.drafts.push_back(draft);

        Ok(())
    }

    /// Append several drafts with a single write
    ///
    /// Every draft is validated first; if any is rejected nothing is
    /// appended. Returns the number of drafts added.
    pub fn enqueue_batch(
        &mut self,
        drafts: impl IntoIterator<Item = DraftRecord>,
    ) -> Result<usize, QueueError> {
        let batch: Vec<DraftRecord> = drafts.into_iter().collect();
        if batch.is_empty() {
            return Ok(0);
        }

        let mut seen: HashSet<&str> = self.drafts.iter().map(|d| d.id.as_str()).collect();
        for draft in &batch {
            self.limits.validate(draft)?;
            if !seen.insert(draft.id.as_str()) {
                return Err(ValidationError::DuplicateId(draft.id.to_string()).into());
            }
        }

        self.persist(self.drafts.iter().chain(batch.iter()))?;

        let count = batch.len();
        self.drafts.extend(batch);
        info!(count, size = self.drafts.len(), "Enqueued draft batch");

        Ok(count)
    }

    /// Remove and return the head draft exactly as it was stored
    pub fn dequeue(&mut self) -> Result<DraftRecord, QueueError> {
        if self.drafts.is_empty() {
            return Err(QueueError::Empty);
        }

        self.persist(self.drafts.iter().skip(1))?;

        let head = self.drafts.pop_front().ok_or(QueueError::Empty)?;
        info!(id = %head.id, remaining = self.drafts.len(), "Dequeued draft");

        Ok(head)
    }

    /// Look at the head draft without removing it
    pub fn peek(&self) -> Result<&DraftRecord, QueueError> {
        self.drafts.front().ok_or(QueueError::Empty)
    }

    /// Number of queued drafts
    pub fn size(&self) -> usize {
        self.drafts.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// First `limit` drafts, head to tail
    pub fn list(&self, limit: usize) -> Vec<DraftRecord> {
        self.drafts.iter().take(limit).cloned().collect()
    }

    /// Iterate over queued drafts, head to tail
    pub fn iter(&self) -> impl Iterator<Item = &DraftRecord> {
        self.drafts.iter()
    }

    /// Remove every draft
    pub fn clear(&mut self) -> Result<(), QueueError> {
        self.persist(std::iter::empty())?;

        let removed = self.drafts.len();
        self.drafts.clear();
        info!(removed, "Cleared draft queue");

        Ok(())
    }

    /// Move an unreadable store aside and start over with an empty queue
    ///
    /// The unreadable file is kept as `<name>.corrupt-<timestamp>`. A store
    /// that is absent or parses cleanly is left alone.
    pub fn repair(path: impl AsRef<Path>) -> Result<RepairOutcome, QueueError> {
        let path = path.as_ref();
        let dir = store_dir(path);
        fs::create_dir_all(dir).map_err(|e| QueueError::storage(dir, e))?;

        let _lock = acquire_lock(path)?;
        remove_stray_temp_files(path);

        match load(path) {
            Ok(drafts) => Ok(RepairOutcome::Healthy {
                drafts: drafts.len(),
            }),
            Err(QueueError::Corrupt { source, .. }) => {
                let backup = backup_path(path, Utc::now());
                fs::rename(path, &backup).map_err(|e| QueueError::storage(path, e))?;
                write_atomic(path, Vec::new())?;

                warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    error = %source,
                    "Reset corrupt draft queue"
                );

                Ok(RepairOutcome::Reset { backup })
            }
            Err(e) => Err(e),
        }
    }

    /// Write the given state to the store
    fn persist<'a>(&self, drafts: impl IntoIterator<Item = &'a DraftRecord>) -> Result<(), QueueError> {
        write_atomic(&self.path, drafts.into_iter().collect())
    }
}

/// Directory holding the store (`.` for a bare file name)
fn store_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "drafts_queue.json".to_string())
}

/// Sidecar lock file path (`<name>.lock`)
pub fn lock_path(path: &Path) -> PathBuf {
    store_dir(path).join(format!("{}.lock", file_name(path)))
}

/// Backup path for a corrupt store (`<name>.corrupt-<timestamp>`)
fn backup_path(path: &Path, at: DateTime<Utc>) -> PathBuf {
    store_dir(path).join(format!(
        "{}.corrupt-{}",
        file_name(path),
        at.format("%Y%m%dT%H%M%S%.3f")
    ))
}

/// Take the exclusive advisory lock for a store
fn acquire_lock(path: &Path) -> Result<File, QueueError> {
    let lock_path = lock_path(path);
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&lock_path)
        .map_err(|e| QueueError::storage(&lock_path, e))?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(file),
        Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
            Err(QueueError::Locked(path.to_path_buf()))
        }
        Err(e) => Err(QueueError::storage(&lock_path, e)),
    }
}

/// Check whether `name` is a temp file staged by `write_atomic` for `path`
fn is_stray_temp(path: &Path, name: &str) -> bool {
    let prefix = format!(".{}.", file_name(path));
    name.strip_prefix(&prefix)
        .and_then(|rest| rest.strip_suffix(".tmp"))
        .is_some_and(|random| !random.is_empty() && random.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Delete temp files left behind by writes that never reached the rename
///
/// Only called with the store lock held, so no live write owns them.
/// Failures are logged and otherwise ignored.
fn remove_stray_temp_files(path: &Path) {
    let dir = store_dir(path);
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Could not scan for stray temp files");
            return;
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        if !is_stray_temp(path, &name.to_string_lossy()) {
            continue;
        }

        let stray = entry.path();
        match fs::remove_file(&stray) {
            Ok(()) => info!(path = %stray.display(), "Removed stray temp file"),
            Err(e) => warn!(path = %stray.display(), error = %e, "Could not remove stray temp file"),
        }
    }
}

/// Read the store; absent or blank means empty
fn load(path: &Path) -> Result<VecDeque<DraftRecord>, QueueError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(VecDeque::new()),
        Err(e) => return Err(QueueError::storage(path, e)),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(VecDeque::new());
    }

    serde_json::from_slice::<Vec<DraftRecord>>(&bytes)
        .map(VecDeque::from)
        .map_err(|source| QueueError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialize to a temp file in the store's directory, fsync, rename over
/// the store, fsync the directory
fn write_atomic(path: &Path, drafts: Vec<&DraftRecord>) -> Result<(), QueueError> {
    let dir = store_dir(path);
    let mut json = serde_json::to_vec_pretty(&drafts)?;
    json.push(b'\n');

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{}.", file_name(path)))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| QueueError::storage(dir, e))?;

    tmp.write_all(&json)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| QueueError::storage(tmp.path(), e))?;

    tmp.persist(path)
        .map_err(|e| QueueError::storage(path, e.error))?;

    sync_dir(dir)?;

    debug!(path = %path.display(), drafts = drafts.len(), bytes = json.len(), "Persisted draft queue");
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<(), QueueError> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| QueueError::storage(dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<(), QueueError> {
    Ok(())
}
