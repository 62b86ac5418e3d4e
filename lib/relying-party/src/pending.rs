//! Registry of in-flight login attempts.
//!
//! Every call to the login endpoint records a pending entry keyed by its
//! `state` value. The callback consumes the entry exactly once; entries that
//! outlive their TTL are treated as absent and purged.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Secrets bound to one login attempt.
#[derive(Clone)]
pub struct PendingLogin {
    nonce: String,
    pkce_verifier: String,
    created_at: DateTime<Utc>,
}

impl PendingLogin {
    /// Creates a pending login started now.
    #[must_use]
    pub fn new(nonce: String, pkce_verifier: String) -> Self {
        Self {
            nonce,
            pkce_verifier,
            created_at: Utc::now(),
        }
    }

    /// Returns the ID token nonce.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Returns the PKCE code verifier.
    #[must_use]
    pub fn pkce_verifier(&self) -> &str {
        &self.pkce_verifier
    }

    /// Returns when the login was started.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now >= self.created_at + ttl
    }
}

/// Mutex-guarded map from `state` to pending login.
pub struct PendingLogins {
    entries: Mutex<HashMap<String, PendingLogin>>,
    ttl: Duration,
    max_entries: usize,
}

impl PendingLogins {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// How long an entry stays valid.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Records a pending login under `state`.
    ///
    /// Expired entries are dropped first; if the registry is still full the
    /// oldest entry is evicted.
    pub async fn insert(&self, state: String, login: PendingLogin) {
        let mut entries = self.entries.lock().await;
        let now = Utc::now();
        entries.retain(|_, pending| !pending.is_expired(self.ttl, now));

        if entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, pending)| pending.created_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                debug!("evicted oldest pending login");
            }
        }

        entries.insert(state, login);
    }

    /// Removes and returns the pending login for `state`.
    ///
    /// Returns `None` when the state is unknown, already consumed or expired.
    pub async fn take(&self, state: &str) -> Option<PendingLogin> {
        let login = self.entries.lock().await.remove(state)?;
        if login.is_expired(self.ttl, Utc::now()) {
            debug!("pending login expired before callback");
            return None;
        }
        Some(login)
    }

    /// Drops all expired entries, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        let now = Utc::now();
        entries.retain(|_, pending| !pending.is_expired(self.ttl, now));
        before - entries.len()
    }

    /// Returns the number of entries currently held.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns true if no logins are pending.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
