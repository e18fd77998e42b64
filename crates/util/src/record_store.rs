//! Durable key/value record storage.
//!
//! Records are plain strings addressed by string keys, each carrying an
//! expiry so the store behaves like browser cookie storage: a record survives
//! restarts until its lifetime runs out. Two backends are provided: a JSON
//! file on disk and an in-memory map for tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::serde::ts_seconds;
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Lifetime applied when a write does not request one explicitly.
pub const DEFAULT_EXPIRY_DAYS: u32 = 365;

/// Upper bound for `key + value` of a single record, mirroring the cookie size limit.
pub const MAX_RECORD_BYTES: usize = 4096;

/// Errors surfaced by record store operations.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    /// I/O failure while reading or writing the backing file.
    #[error("record store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("record store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The record (or the store as a whole) exceeds its size budget.
    #[error("record '{key}' rejected: {size} bytes exceeds limit of {limit}")]
    QuotaExceeded { key: String, size: usize, limit: usize },
    /// The store refuses all access.
    #[error("record store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Per-write options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordOptions {
    /// Days until the record expires; `None` uses the store default.
    pub expiry_days: Option<u32>,
}

impl RecordOptions {
    pub fn expiring_in(days: u32) -> Self {
        Self { expiry_days: Some(days) }
    }
}

/// Shared trait implemented by record persistence backends.
pub trait RecordStore: Send + Sync {
    /// Read the value stored under `key`. Expired records read as absent.
    fn get(&self, key: &str) -> Result<Option<String>, RecordStoreError>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str, options: RecordOptions) -> Result<(), RecordStoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), RecordStoreError>;

    /// All live records whose key starts with `prefix`, in first-insertion order.
    fn entries_with_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, RecordStoreError>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredRecord {
    value: String,
    #[serde(with = "ts_seconds")]
    expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct RecordFile {
    records: IndexMap<String, StoredRecord>,
}

impl RecordFile {
    fn get(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        self.records
            .get(key)
            .filter(|record| record.expires_at > now)
            .map(|record| record.value.clone())
    }

    /// Existing keys keep their position so enumeration order stays stable.
    fn upsert(&mut self, key: &str, value: &str, expires_at: DateTime<Utc>) {
        self.records.insert(
            key.to_string(),
            StoredRecord {
                value: value.to_string(),
                expires_at,
            },
        );
    }

    fn remove(&mut self, key: &str) -> bool {
        self.records.shift_remove(key).is_some()
    }

    fn with_prefix(&self, prefix: &str, now: DateTime<Utc>) -> Vec<(String, String)> {
        self.records
            .iter()
            .filter(|(key, record)| key.starts_with(prefix) && record.expires_at > now)
            .map(|(key, record)| (key.clone(), record.value.clone()))
            .collect()
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| record.expires_at > now);
        before - self.records.len()
    }

    fn total_bytes(&self) -> usize {
        self.records.iter().map(|(key, record)| key.len() + record.value.len()).sum()
    }
}

fn expiry_from(now: DateTime<Utc>, options: RecordOptions, default_days: u32) -> DateTime<Utc> {
    let days = options.expiry_days.unwrap_or(default_days);
    Duration::try_days(i64::from(days))
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn check_record_size(key: &str, value: &str) -> Result<(), RecordStoreError> {
    let size = key.len() + value.len();
    if size > MAX_RECORD_BYTES {
        return Err(RecordStoreError::QuotaExceeded {
            key: key.to_string(),
            size,
            limit: MAX_RECORD_BYTES,
        });
    }
    Ok(())
}

fn lock_records(records: &Mutex<RecordFile>) -> Result<MutexGuard<'_, RecordFile>, RecordStoreError> {
    records.lock().map_err(|_| RecordStoreError::Unavailable {
        reason: "record lock poisoned".to_string(),
    })
}

/// JSON-backed record store persisted on disk.
pub struct JsonFileRecordStore {
    path: PathBuf,
    records: Mutex<RecordFile>,
    default_expiry_days: u32,
}

impl JsonFileRecordStore {
    /// Open the store at `path`, dropping records that have already expired.
    pub fn new(path: impl Into<PathBuf>, default_expiry_days: u32) -> Result<Self, RecordStoreError> {
        let path = path.into();
        let mut file = load_record_file(&path)?;
        let purged = file.purge_expired(Utc::now());
        if purged > 0 {
            debug!(path = %path.display(), purged, "dropped expired records");
        }
        Ok(Self {
            path,
            records: Mutex::new(file),
            default_expiry_days,
        })
    }

    /// Access the underlying file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, file: &RecordFile) -> Result<(), RecordStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(file)?;
        let temporary_path = self.path.with_extension("json.tmp");
        fs::write(&temporary_path, content)?;
        fs::rename(&temporary_path, &self.path)?;
        Ok(())
    }

    /// Apply `change` to a copy, persist it, and only then publish it in memory.
    fn commit(&self, change: impl FnOnce(&mut RecordFile)) -> Result<(), RecordStoreError> {
        let mut file = lock_records(&self.records)?;
        let mut next = file.clone();
        change(&mut next);
        self.save(&next)?;
        *file = next;
        Ok(())
    }
}

impl RecordStore for JsonFileRecordStore {
    fn get(&self, key: &str) -> Result<Option<String>, RecordStoreError> {
        let file = lock_records(&self.records)?;
        Ok(file.get(key, Utc::now()))
    }

    fn set(&self, key: &str, value: &str, options: RecordOptions) -> Result<(), RecordStoreError> {
        check_record_size(key, value)?;
        let expires_at = expiry_from(Utc::now(), options, self.default_expiry_days);
        self.commit(|file| file.upsert(key, value, expires_at))
    }

    fn delete(&self, key: &str) -> Result<(), RecordStoreError> {
        {
            let file = lock_records(&self.records)?;
            if !file.records.contains_key(key) {
                return Ok(());
            }
        }
        self.commit(|file| {
            file.remove(key);
        })
    }

    fn entries_with_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, RecordStoreError> {
        let file = lock_records(&self.records)?;
        Ok(file.with_prefix(prefix, Utc::now()))
    }
}

fn load_record_file(path: &Path) -> Result<RecordFile, RecordStoreError> {
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<RecordFile>(&content) {
            Ok(file) => Ok(file),
            Err(error) => {
                // Set the unreadable file aside so the next save cannot overwrite it.
                let quarantine = path.with_extension("json.corrupt");
                fs::rename(path, &quarantine)?;
                warn!(
                    path = %path.display(),
                    moved_to = %quarantine.display(),
                    error = %error,
                    "Failed to parse record file; starting empty"
                );
                Ok(RecordFile::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(RecordFile::default()),
        Err(error) => Err(RecordStoreError::Io(error)),
    }
}

/// In-memory record store used by unit tests and as an ephemeral fallback.
pub struct InMemoryRecordStore {
    records: Mutex<RecordFile>,
    quota_bytes: Option<usize>,
    unavailable: AtomicBool,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self {
            records: Mutex::new(RecordFile::default()),
            quota_bytes: None,
            unavailable: AtomicBool::new(false),
        }
    }
}

impl InMemoryRecordStore {
    /// Create an empty, unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes once all records together exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Make every subsequent write fail, as a browser with storage disabled would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of records currently held, expired ones included.
    pub fn len(&self) -> usize {
        lock_records(&self.records).map(|file| file.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_available(&self) -> Result<(), RecordStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RecordStoreError::Unavailable {
                reason: "storage disabled".to_string(),
            });
        }
        Ok(())
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get(&self, key: &str) -> Result<Option<String>, RecordStoreError> {
        let file = lock_records(&self.records)?;
        Ok(file.get(key, Utc::now()))
    }

    fn set(&self, key: &str, value: &str, options: RecordOptions) -> Result<(), RecordStoreError> {
        self.ensure_available()?;
        check_record_size(key, value)?;
        let mut file = lock_records(&self.records)?;
        if let Some(limit) = self.quota_bytes {
            let existing = file.records.get(key).map(|record| key.len() + record.value.len()).unwrap_or(0);
            let size = file.total_bytes() - existing + key.len() + value.len();
            if size > limit {
                return Err(RecordStoreError::QuotaExceeded {
                    key: key.to_string(),
                    size,
                    limit,
                });
            }
        }
        let expires_at = expiry_from(Utc::now(), options, DEFAULT_EXPIRY_DAYS);
        file.upsert(key, value, expires_at);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), RecordStoreError> {
        self.ensure_available()?;
        let mut file = lock_records(&self.records)?;
        file.remove(key);
        Ok(())
    }

    fn entries_with_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, RecordStoreError> {
        let file = lock_records(&self.records)?;
        Ok(file.with_prefix(prefix, Utc::now()))
    }
}
