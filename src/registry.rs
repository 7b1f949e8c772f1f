//! Shortcode registry: the single shared mutable resource of the service.
//!
//! The service layer depends only on the [`Registry`] trait so the in-memory
//! map can later be replaced by a persistent store without touching the
//! orchestration code.

use crate::error::{AppError, AppResult};
use crate::models::{ClickEvent, UrlEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Store of shortcode → URL mappings.
///
/// All operations are safe under concurrent invocation; `insert` is a single
/// atomic check-and-set, so callers never need a separate existence probe to
/// avoid duplicate keys.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Registry: Send + Sync {
    /// Check whether a shortcode is present (expired-but-unswept included).
    async fn exists(&self, code: &str) -> AppResult<bool>;

    /// Atomically add an entry; fails with `ShortcodeTaken` if the code is
    /// already present.
    async fn insert(&self, entry: UrlEntry) -> AppResult<UrlEntry>;

    /// Fetch a snapshot of the entry for a shortcode.
    async fn lookup(&self, code: &str) -> AppResult<Option<UrlEntry>>;

    /// Append a click to the entry's sequence. Returns false (no-op) when
    /// the code does not exist.
    async fn append_click(&self, code: &str, click: ClickEvent) -> AppResult<bool>;

    /// Remove every entry whose `expires_at` is before `now`; returns the
    /// number removed.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Number of entries currently held.
    async fn count(&self) -> AppResult<u64>;
}

/// In-memory registry backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    entries: DashMap<String, UrlEntry>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn exists(&self, code: &str) -> AppResult<bool> {
        Ok(self.entries.contains_key(code))
    }

    async fn insert(&self, entry: UrlEntry) -> AppResult<UrlEntry> {
        // Entry API holds the shard lock across the check and the write, so
        // two racing creations of the same code resolve to one winner.
        match self.entries.entry(entry.short_code.clone()) {
            Entry::Occupied(_) => Err(AppError::ShortcodeTaken(entry.short_code)),
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                Ok(entry)
            }
        }
    }

    async fn lookup(&self, code: &str) -> AppResult<Option<UrlEntry>> {
        Ok(self.entries.get(code).map(|entry| entry.value().clone()))
    }

    async fn append_click(&self, code: &str, click: ClickEvent) -> AppResult<bool> {
        match self.entries.get_mut(code) {
            Some(mut entry) => {
                entry.clicks.push(click);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut removed = 0u64;
        self.entries.retain(|_, entry| {
            if entry.expires_at < now {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.entries.len() as u64)
    }
}
