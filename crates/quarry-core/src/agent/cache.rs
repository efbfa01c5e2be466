//! Answer cache for thread-opening questions
//!
//! Keys are the question lowercased, trimmed and with whitespace runs
//! collapsed, so "K5  브레이크 " and "k5 브레이크" share an entry.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Default time to live for cached answers (one hour)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

struct CacheEntry {
    answer: String,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) > self.ttl
    }
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_queries: u64,
    /// Hits over lookups, 0.0 before the first lookup
    pub hit_rate: f64,
}

impl CacheStats {
    fn record(&mut self, hit: bool) {
        self.total_queries += 1;
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.hit_rate = self.hits as f64 / self.total_queries as f64;
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

/// In-process answer cache with a per-entry time to live
pub struct ResponseCache {
    inner: RwLock<Inner>,
    default_ttl: Duration,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            default_ttl: ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Look up a cached answer; an expired entry is dropped and counts as a miss
    pub fn get(&self, query: &str) -> Option<String> {
        let key = normalize_query(query);
        let mut inner = self.inner.write().ok()?;
        let now = Instant::now();

        let answer = inner
            .entries
            .get(&key)
            .filter(|entry| !entry.expired(now))
            .map(|entry| entry.answer.clone());
        if answer.is_none() {
            inner.entries.remove(&key);
        }
        inner.stats.record(answer.is_some());
        answer
    }

    pub fn insert(&self, query: &str, answer: impl Into<String>) {
        self.insert_with_ttl(query, answer, self.default_ttl);
    }

    pub fn insert_with_ttl(&self, query: &str, answer: impl Into<String>, ttl: Duration) {
        let key = normalize_query(query);
        if key.is_empty() {
            return;
        }
        if let Ok(mut inner) = self.inner.write() {
            inner.entries.insert(
                key,
                CacheEntry {
                    answer: answer.into(),
                    stored_at: Instant::now(),
                    ttl,
                },
            );
        }
    }

    /// Remove one question's entry; false if it was not cached
    pub fn delete(&self, query: &str) -> bool {
        let key = normalize_query(query);
        self.inner
            .write()
            .map(|mut inner| inner.entries.remove(&key).is_some())
            .unwrap_or(false)
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.write() {
            *inner = Inner::default();
        }
    }

    /// Drop expired entries, returning how many were removed
    pub fn cleanup(&self) -> usize {
        let Ok(mut inner) = self.inner.write() else {
            return 0;
        };
        let now = Instant::now();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.expired(now));
        let removed = before - inner.entries.len();
        if removed > 0 {
            tracing::debug!("Dropped {} expired cached answers", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner
            .read()
            .map(|inner| inner.stats)
            .unwrap_or_default()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
