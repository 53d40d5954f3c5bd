use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::scoring::RankedTable;

const CACHE_KEY_PREFIX: &str = "ranked-table";

/// Get the platform-appropriate cache directory for ranked tables
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("cb-alpha/tables"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/cb-alpha/tables",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Settings that change what a refresh produces.
#[derive(Serialize)]
struct Fingerprinted<'a> {
    entities: &'a [crate::config::EntityConfig],
    lookback: &'a str,
    scoring: &'a crate::scoring::ScoringConfig,
    fred_frequency: &'a Option<String>,
}

/// SHA-256 of everything in `config` that affects the scored table.
/// Stable across builds, so tables cached by one release are found by the next.
pub fn fingerprint(config: &Config) -> Result<String> {
    let json = serde_json::to_vec(&Fingerprinted {
        entities: &config.entities,
        lookback: &config.lookback,
        scoring: &config.scoring,
        fred_frequency: &config.fred.frequency,
    })
    .context("Failed to serialize cache fingerprint")?;

    Ok(hex::encode(Sha256::digest(&json)))
}

/// Disk cache of ranked tables, one entry per TTL bucket.
///
/// A table stored at time `t` is served until the wall clock crosses into the
/// next `ttl` bucket, so every process in the same bucket sees the same table.
pub struct TableCache {
    path: PathBuf,
    ttl: Duration,
    fingerprint: String,
}

impl TableCache {
    pub fn new(path: PathBuf, ttl: Duration, fingerprint: String) -> Self {
        Self {
            path,
            ttl,
            fingerprint,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn bucket(&self, now: DateTime<Utc>) -> i64 {
        let ttl = self.ttl.as_secs().max(1) as i64;
        now.timestamp().div_euclid(ttl)
    }

    fn key(&self, now: DateTime<Utc>) -> String {
        format!("{}:{}:{}", CACHE_KEY_PREFIX, self.bucket(now), self.fingerprint)
    }

    /// Cached table for the current bucket, if any.
    /// Unreadable or corrupt entries count as a miss.
    pub fn load(&self, now: DateTime<Utc>) -> Option<RankedTable> {
        let key = self.key(now);
        let bytes = match cacache::read_sync(&self.path, &key) {
            Ok(bytes) => bytes,
            Err(_) => {
                info!("Cache miss for {}", key);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(table) => {
                info!("Cache hit for {}", key);
                Some(table)
            }
            Err(e) => {
                debug!("Discarding unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    pub fn store(&self, table: &RankedTable, now: DateTime<Utc>) -> Result<()> {
        let key = self.key(now);
        let json = serde_json::to_vec(table).context("Failed to serialize ranked table")?;
        let integrity = cacache::write_sync(&self.path, &key, &json)
            .with_context(|| format!("Failed to write cache entry {}", key))?;
        debug!("Cached ranked table as {}", key);
        self.prune(&key, &integrity);
        Ok(())
    }

    /// Remove every other ranked table: older buckets and other fingerprints.
    /// Content shared with the entry being kept stays on disk.
    fn prune(&self, keep: &str, keep_integrity: &cacache::Integrity) {
        let prefix = format!("{}:", CACHE_KEY_PREFIX);
        let stale: Vec<cacache::Metadata> = cacache::list_sync(&self.path)
            .filter_map(|entry| entry.ok())
            .filter(|md| md.key.starts_with(&prefix) && md.key != keep)
            .collect();

        for md in stale {
            if let Err(e) = cacache::remove_sync(&self.path, &md.key) {
                debug!("Failed to remove stale cache entry {}: {}", md.key, e);
                continue;
            }
            if md.integrity != *keep_integrity {
                if let Err(e) = cacache::remove_hash_sync(&self.path, &md.integrity) {
                    debug!("Failed to remove content of {}: {}", md.key, e);
                }
            }
            debug!("Pruned stale cache entry {}", md.key);
        }
    }

    /// Drop every cached table.
    pub fn invalidate(&self) -> Result<()> {
        clear_cache_at(&self.path)
    }
}

/// Clear the default table cache directory
pub fn clear_cache() -> Result<()> {
    clear_cache_at(&get_cache_path())
}

fn clear_cache_at(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}
