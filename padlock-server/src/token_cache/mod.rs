pub mod clock;
mod sweep;

use std::collections::HashMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use sha1::{Digest, Sha1};

pub use self::sweep::CacheSweeper;

/// One validated token: when the issuer says it expires, and when this
/// process last confirmed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheEntry {
    expires_at: i64,
    recorded_at: DateTime<Utc>,
}

/// Concurrent cache of validated bearer tokens. Keys are a content hash of
/// the raw token so the credential itself never sits in a structure that
/// could be logged or dumped; the hash doubles as the log-printable
/// identifier.
pub struct TokenCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// How long a recorded entry may be trusted before the token must be
    /// re-validated against the issuer.
    refresh_interval: Duration,
}

/// SHA-1, URL-safe base64.
#[must_use]
pub fn token_hash(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha1::digest(token.as_bytes()))
}

impl TokenCache {
    #[must_use]
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            refresh_interval,
        }
    }

    /// Record a validated token.
    pub fn record(&self, token: &str, expires_at: i64, now: DateTime<Utc>) {
        let entry = CacheEntry {
            expires_at,
            recorded_at: now,
        };
        self.entries.write().insert(token_hash(token), entry);
    }

    pub fn remove(&self, token: &str) {
        self.entries.write().remove(&token_hash(token));
    }

    /// Whether the token can still be trusted at `now` without asking the
    /// issuer again. An entry past its expiry or past the refresh interval
    /// is dropped on the spot and the answer is `false`.
    ///
    /// The read lock is released before the write lock is taken; a racing
    /// writer may have already removed the entry, which is fine.
    pub fn valid_in(&self, token: &str, now: DateTime<Utc>) -> bool {
        let key = token_hash(token);

        let entry = {
            let entries = self.entries.read();
            match entries.get(&key) {
                Some(entry) => *entry,
                None => return false,
            }
        };

        if now.timestamp() > entry.expires_at || now - entry.recorded_at > self.refresh_interval {
            self.entries.write().remove(&key);
            return false;
        }

        true
    }

    /// Drop every entry whose expiry has passed.
    pub fn sweep(&self, now: DateTime<Utc>) {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| now.timestamp() < entry.expires_at);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = entries.len(), "Swept expired tokens");
        }
    }

    /// Drop everything, forcing re-validation of all tokens.
    pub fn purge(&self) {
        let mut entries = self.entries.write();
        if !entries.is_empty() {
            tracing::debug!(purged = entries.len(), "Purged token cache");
        }
        entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
