//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and access metadata.

use serde::Serialize;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion timestamp (Unix milliseconds)
    pub inserted_at: u64,
    /// Time to live in milliseconds, always > 0
    pub ttl_ms: u64,
    /// Number of successful reads since insertion
    pub access_count: u64,
    /// Last read or write timestamp (Unix milliseconds)
    pub last_accessed_at: u64,
    /// Serialized size in bytes, once measured
    pub size_hint: Option<usize>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a fresh entry inserted at `now`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_ms` - TTL in milliseconds; callers resolve defaults beforehand
    /// * `now` - Current Unix time in milliseconds
    pub fn new(value: V, ttl_ms: u64, now: u64) -> Self {
        Self {
            value,
            inserted_at: now,
            ttl_ms: ttl_ms.max(1),
            access_count: 0,
            last_accessed_at: now,
            size_hint: None,
        }
    }

    // == Expiry ==
    /// Absolute expiry timestamp (Unix milliseconds).
    pub fn expires_at(&self) -> u64 {
        self.inserted_at.saturating_add(self.ttl_ms)
    }

    /// Makes the entry expire `ttl_ms` after `now`, keeping its insert time.
    pub fn reset_ttl(&mut self, ttl_ms: u64, now: u64) {
        let age = now.saturating_sub(self.inserted_at);
        self.ttl_ms = age.saturating_add(ttl_ms).max(1);
    }

    /// Checks if the entry is logically expired at `now`.
    ///
    /// The entry stays live up to and including `inserted_at + ttl_ms`; it is
    /// expired strictly after that instant.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.expires_at()
    }

    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now: u64) -> u64 {
        self.expires_at().saturating_sub(now)
    }

    // == Touch ==
    /// Records a successful read at `now`.
    pub fn touch(&mut self, now: u64) {
        self.access_count += 1;
        self.last_accessed_at = now.max(self.last_accessed_at);
    }

    // == Info ==
    /// Builds a read-only view of the entry metadata.
    pub fn info(&self, now: u64) -> EntryInfo {
        EntryInfo {
            expired: self.is_expired_at(now),
            age_ms: now.saturating_sub(self.inserted_at),
            ttl_ms: self.ttl_ms,
            ttl_remaining_ms: self.ttl_remaining_ms(now),
            access_count: self.access_count,
            last_accessed_at: self.last_accessed_at,
        }
    }
}

// == Entry Info ==
/// Metadata view of one entry, used for debugging and ops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    /// Whether the entry is logically expired
    pub expired: bool,
    /// Milliseconds since insertion
    pub age_ms: u64,
    /// Configured TTL in milliseconds
    pub ttl_ms: u64,
    /// Milliseconds until expiry, 0 once expired
    pub ttl_remaining_ms: u64,
    /// Number of successful reads
    pub access_count: u64,
    /// Last access timestamp (Unix milliseconds)
    pub last_accessed_at: u64,
}
