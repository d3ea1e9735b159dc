//! Session store — concurrency-safe keyed store for onboarding sessions.
//!
//! One authoritative in-memory mapping, last-writer-wins per identity.
//! Sessions are never persisted and never expire; an abandoned flow can be
//! resumed at any time. The store also hands out a per-identity guard so
//! the router can serialize event handling for one identity across workers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::onboarding::Session;

/// Keyed session store plus per-identity mutual exclusion.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    guards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session for an identity, if one is open.
    pub async fn get(&self, identity: &str) -> Option<Session> {
        self.sessions.read().await.get(identity).cloned()
    }

    /// Whether an identity has an open session.
    pub async fn contains(&self, identity: &str) -> bool {
        self.sessions.read().await.contains_key(identity)
    }

    /// Store (or overwrite) an identity's session.
    pub async fn put(&self, identity: &str, session: Session) {
        self.sessions
            .write()
            .await
            .insert(identity.to_string(), session);
    }

    /// Remove an identity's session. Returns the removed session, if any.
    pub async fn delete(&self, identity: &str) -> Option<Session> {
        self.sessions.write().await.remove(identity)
    }

    /// Number of open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Acquire the per-identity guard, serializing event handling for one
    /// identity. Guards nobody holds or waits on are pruned before each
    /// acquisition, so the map stays bounded by concurrent identities.
    pub async fn guard(&self, identity: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut guards = self.guards.lock().await;
            guards.retain(|_, l| Arc::strong_count(l) > 1);
            Arc::clone(guards.entry(identity.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
