//! File-backed cache store
//!
//! One JSON file per cache key, named by the SHA-256 fingerprint of the
//! request URL. Writes go to a temporary sibling and are renamed into
//! place so a concurrent reader never observes a partial entry.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Persisted cache entry: `{ "timestamp": ..., "data": { "json": ..., "headers": ... } }`
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// Epoch seconds at write time
    timestamp: i64,
    data: CachePayload,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachePayload {
    json: Value,
    headers: HashMap<String, String>,
}

/// TTL-bounded file cache for API responses, keyed by request URL.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    /// Create a cache rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, ttl })
    }

    /// The directory cache entries live in
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// SHA-256 hex fingerprint of a request URL
    fn fingerprint(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::fingerprint(url)))
    }

    fn is_expired(&self, timestamp: i64) -> bool {
        Utc::now().timestamp() - timestamp > self.ttl.as_secs() as i64
    }

    /// Look up a cached response.
    ///
    /// Returns `None` for missing entries, expired entries (deleted on
    /// read), and entries that fail to deserialize (also deleted).
    /// Never propagates an error.
    pub fn get(&self, url: &str) -> Option<(Value, HashMap<String, String>)> {
        let path = self.entry_path(url);
        let content = fs::read_to_string(&path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Removing corrupt cache entry {}: {e}", path.display());
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        if self.is_expired(entry.timestamp) {
            debug!("Cache entry expired: {}", path.display());
            let _ = fs::remove_file(&path);
            return None;
        }

        debug!("Cache hit for {url}");
        Some((entry.data.json, entry.data.headers))
    }

    /// Store a response, stamped with the current time.
    ///
    /// Write failures are logged and swallowed.
    pub fn set(&self, url: &str, body: &Value, headers: &HashMap<String, String>) {
        let path = self.entry_path(url);
        let entry = CacheEntry {
            timestamp: Utc::now().timestamp(),
            data: CachePayload {
                json: body.clone(),
                headers: headers.clone(),
            },
        };

        let serialized = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize cache entry for {url}: {e}");
                return;
            }
        };

        // Write-then-rename keeps readers from seeing a partial entry.
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp, serialized) {
            warn!("Failed to write cache file {}: {e}", tmp.display());
            return;
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            warn!("Failed to move cache file into place {}: {e}", path.display());
            let _ = fs::remove_file(&tmp);
        }
    }

    /// Remove all entries, tolerating individual deletion failures
    pub fn clear(&self) {
        for path in self.entry_files() {
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to delete cache file {}: {e}", path.display());
            }
        }
    }

    /// Remove entries older than the TTL; corrupt entries encountered
    /// during the sweep are removed as well.
    pub fn clear_expired(&self) {
        for path in self.entry_files() {
            let expired = match fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str::<CacheEntry>(&content) {
                    Ok(entry) => self.is_expired(entry.timestamp),
                    // Corrupt entry, sweep it too.
                    Err(_) => true,
                },
                Err(e) => {
                    warn!("Failed to read cache file {}: {e}", path.display());
                    continue;
                }
            };

            if expired {
                if let Err(e) = fs::remove_file(&path) {
                    warn!("Failed to delete cache file {}: {e}", path.display());
                }
            }
        }
    }

    fn entry_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(std::result::Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect()
    }
}
