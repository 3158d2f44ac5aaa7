//! Credential storage for the OAuth token relay.
//!
//! [`CredentialStore`] is the seam between the relay logic and wherever
//! state lives. [`MemoryStore`] keeps everything in process memory.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::types::{
    AccessToken, AuthorizationCode, PendingAuthorization, RegisteredClient, UpstreamCredential,
};

/// Entry counts per map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub clients: usize,
    pub pending: usize,
    pub codes: usize,
    pub tokens: usize,
    pub links: usize,
}

/// Entries removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub pending: usize,
    pub codes: usize,
    pub tokens: usize,
}

impl SweepStats {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.codes + self.tokens
    }
}

/// Storage operations for every OAuth entity.
///
/// `take_*` operations must check-and-remove atomically: two concurrent
/// calls for the same key return the entry to exactly one caller.
/// Removing a token must also remove its linkage.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn insert_client(&self, client: RegisteredClient);

    async fn client(&self, client_id: &str) -> Option<RegisteredClient>;

    /// Insert unless `state` is already pending. Returns whether it was inserted.
    async fn insert_pending(&self, state: String, pending: PendingAuthorization) -> bool;

    async fn contains_pending(&self, state: &str) -> bool;

    async fn take_pending(&self, state: &str) -> Option<PendingAuthorization>;

    async fn insert_code(&self, code: AuthorizationCode);

    /// Look up a code without consuming it.
    async fn code(&self, code: &str) -> Option<AuthorizationCode>;

    async fn take_code(&self, code: &str) -> Option<AuthorizationCode>;

    async fn insert_token(&self, token: AccessToken);

    async fn token(&self, token: &str) -> Option<AccessToken>;

    /// Remove a token and its linkage. Returns whether the token existed.
    async fn remove_token(&self, token: &str) -> bool;

    async fn link(&self, token: String, credential: UpstreamCredential);

    async fn linked_credential(&self, token: &str) -> Option<UpstreamCredential>;

    /// Drop expired codes and tokens, and pending authorizations created before `pending_cutoff`.
    async fn sweep_expired(&self, now: DateTime<Utc>, pending_cutoff: DateTime<Utc>) -> SweepStats;

    async fn stats(&self) -> StoreStats;
}

/// In-memory credential store. Lifetime = process lifetime.
#[derive(Clone, Default)]
pub struct MemoryStore {
    clients: Arc<RwLock<HashMap<String, RegisteredClient>>>,
    pending: Arc<RwLock<HashMap<String, PendingAuthorization>>>,
    codes: Arc<RwLock<HashMap<String, AuthorizationCode>>>,
    tokens: Arc<RwLock<HashMap<String, AccessToken>>>,
    links: Arc<RwLock<HashMap<String, UpstreamCredential>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_client(&self, client: RegisteredClient) {
        self.clients.write().await.insert(client.client_id.clone(), client);
    }

    async fn client(&self, client_id: &str) -> Option<RegisteredClient> {
        self.clients.read().await.get(client_id).cloned()
    }

    async fn insert_pending(&self, state: String, pending: PendingAuthorization) -> bool {
        match self.pending.write().await.entry(state) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(pending);
                true
            }
        }
    }

    async fn contains_pending(&self, state: &str) -> bool {
        self.pending.read().await.contains_key(state)
    }

    async fn take_pending(&self, state: &str) -> Option<PendingAuthorization> {
        self.pending.write().await.remove(state)
    }

    async fn insert_code(&self, code: AuthorizationCode) {
        self.codes.write().await.insert(code.code.clone(), code);
    }

    async fn code(&self, code: &str) -> Option<AuthorizationCode> {
        self.codes.read().await.get(code).cloned()
    }

    async fn take_code(&self, code: &str) -> Option<AuthorizationCode> {
        self.codes.write().await.remove(code)
    }

    async fn insert_token(&self, token: AccessToken) {
        self.tokens.write().await.insert(token.token.clone(), token);
    }

    async fn token(&self, token: &str) -> Option<AccessToken> {
        self.tokens.read().await.get(token).cloned()
    }

    async fn remove_token(&self, token: &str) -> bool {
        // Lock order: tokens, then links.
        let mut tokens = self.tokens.write().await;
        let existed = tokens.remove(token).is_some();
        self.links.write().await.remove(token);
        existed
    }

    async fn link(&self, token: String, credential: UpstreamCredential) {
        self.links.write().await.insert(token, credential);
    }

    async fn linked_credential(&self, token: &str) -> Option<UpstreamCredential> {
        self.links.read().await.get(token).cloned()
    }

    async fn sweep_expired(&self, now: DateTime<Utc>, pending_cutoff: DateTime<Utc>) -> SweepStats {
        let mut stats = SweepStats::default();

        {
            let mut pending = self.pending.write().await;
            let before = pending.len();
            pending.retain(|_, p| p.created_at >= pending_cutoff);
            stats.pending = before - pending.len();
        }

        {
            let mut codes = self.codes.write().await;
            let before = codes.len();
            codes.retain(|_, code| !code.is_expired_at(now));
            stats.codes = before - codes.len();
        }

        {
            let mut tokens = self.tokens.write().await;
            let expired: Vec<String> = tokens
                .values()
                .filter(|t| t.is_expired_at(now))
                .map(|t| t.token.clone())
                .collect();

            let mut links = self.links.write().await;
            for token in &expired {
                tokens.remove(token);
                links.remove(token);
            }
            stats.tokens = expired.len();
        }

        stats
    }

    async fn stats(&self) -> StoreStats {
        StoreStats {
            clients: self.clients.read().await.len(),
            pending: self.pending.read().await.len(),
            codes: self.codes.read().await.len(),
            tokens: self.tokens.read().await.len(),
            links: self.links.read().await.len(),
        }
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish()
    }
}
