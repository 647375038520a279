//! Persisted freshness caches for paid external calls.
//!
//! One JSON file per namespace, mapping key → `{timestamp, payload}`.
//! Entries live in a `DashMap` so concurrent workers read without
//! contention. Every write re-persists the whole namespace, and those
//! writes are serialized through a mutex: the snapshot is taken under the
//! lock, so an update from one worker can never overwrite another's.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use common::config::MAX_TTL_MINUTES;
use common::{Error, Result};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Disjoint key spaces, one persisted file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    Schedule,
    Props,
    Trends,
    Analysis,
}

impl CacheNamespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Props => "props",
            Self::Trends => "trends",
            Self::Analysis => "analysis",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}_cache.json", self.prefix())
    }

    /// Build a namespaced key. An empty suffix yields the bare prefix.
    pub fn key(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.prefix().to_string()
        } else {
            format!("{}_{}", self.prefix(), suffix)
        }
    }
}

/// A single cached payload with its write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.timestamp < ttl
    }
}

/// Keyed store with a time-to-live read policy.
///
/// Stale entries are never deleted; they are ignored on read and replaced
/// by the next successful write under the same key.
#[derive(Debug)]
pub struct FreshnessCache {
    namespace: CacheNamespace,
    path: Option<PathBuf>,
    ttl: Duration,
    entries: DashMap<String, CacheEntry>,
    write_lock: Mutex<()>,
}

impl FreshnessCache {
    /// Open the namespace file under `dir`. A missing or unreadable file
    /// starts an empty cache.
    pub fn open(dir: impl AsRef<Path>, namespace: CacheNamespace, ttl_minutes: i64) -> Self {
        let path = dir.as_ref().join(namespace.file_name());
        let entries = DashMap::new();

        match load_entries(&path) {
            Ok(loaded) => {
                debug!(
                    "{}: loaded {} cache entries from {}",
                    namespace.prefix(),
                    loaded.len(),
                    path.display()
                );
                for (key, entry) in loaded {
                    entries.insert(key, entry);
                }
            }
            Err(e) => warn!(
                "{}: ignoring cache file {}: {}",
                namespace.prefix(),
                path.display(),
                e
            ),
        }

        Self {
            namespace,
            path: Some(path),
            ttl: ttl_from_minutes(ttl_minutes),
            entries,
            write_lock: Mutex::new(()),
        }
    }

    /// A cache that never touches disk.
    pub fn in_memory(namespace: CacheNamespace, ttl_minutes: i64) -> Self {
        Self {
            namespace,
            path: None,
            ttl: ttl_from_minutes(ttl_minutes),
            entries: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Number of stored entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now())
    }

    /// Read `key` as of `now`. Missing, stale, or undecodable entries are
    /// all treated as absent.
    pub fn get_at<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let payload = self.get_raw_at(key, now)?;
        match serde_json::from_value(payload) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(
                    "{}: cached payload for {} did not decode: {}",
                    self.namespace.prefix(),
                    key,
                    e
                );
                None
            }
        }
    }

    pub fn get_raw_at(&self, key: &str, now: DateTime<Utc>) -> Option<serde_json::Value> {
        let entry = self.entries.get(key)?;
        if entry.is_fresh(now, self.ttl) {
            Some(entry.payload.clone())
        } else {
            debug!("{}: cache entry {} is stale", self.namespace.prefix(), key);
            None
        }
    }

    pub fn put<T: Serialize>(&self, key: &str, payload: &T) -> Result<()> {
        self.put_at(key, payload, Utc::now())
    }

    /// Store `payload` under `key`, superseding any previous entry, then
    /// persist the namespace.
    pub fn put_at<T: Serialize>(&self, key: &str, payload: &T, now: DateTime<Utc>) -> Result<()> {
        let payload = serde_json::to_value(payload)?;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                timestamp: now,
                payload,
            },
        );
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::Cache("cache write lock poisoned".into()))?;

        let snapshot: BTreeMap<String, CacheEntry> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write-then-rename so readers never see a half-written file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Out-of-range TTLs are clamped to [0, one year].
fn ttl_from_minutes(minutes: i64) -> Duration {
    Duration::minutes(minutes.clamp(0, MAX_TTL_MINUTES))
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, CacheEntry>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let contents = fs::read(path)?;
    if contents.is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_slice(&contents).map_err(Error::from)
}
