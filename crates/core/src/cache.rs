//! The generic cache entry shape used by `remind-cache`.

use chrono::{DateTime, Utc};

/// A cached value with an absolute expiry. `remind_cache::TtlCache` is the
/// concurrent map built on top of this.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, ttl: chrono::Duration) -> Self {
        Self {
            value,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
