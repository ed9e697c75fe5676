//! In-memory session store.
//!
//! Sessions are volatile by design: a process restart loses in-flight
//! conversations, and durable state lives only in the external blob store
//! and file index. The store keeps one entry lock per identity so the engine
//! can serialize read-modify-write cycles without blocking other identities.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::domain::foundation::Identity;
use crate::domain::session::Session;
use crate::ports::SessionStore;

/// Process-local session store keyed by identity.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Identity, Session>>,
    // Entry locks outlive their sessions so a clear followed by a new flow
    // reuses the same serialization point.
    locks: RwLock<HashMap<Identity, Arc<Mutex<()>>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions (for tests and diagnostics).
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn entry_lock(&self, identity: &Identity) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(identity) {
            return lock.clone();
        }
        let mut locks = self.locks.write().await;
        locks
            .entry(identity.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn get(&self, identity: &Identity) -> Option<Session> {
        self.sessions.read().await.get(identity).cloned()
    }

    async fn upsert(&self, session: Session) {
        self.sessions
            .write()
            .await
            .insert(session.identity.clone(), session);
    }

    async fn clear(&self, identity: &Identity) {
        self.sessions.write().await.remove(identity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::SessionState;

    fn id(n: u32) -> Identity {
        Identity::new(format!("+1555000{n}"))
    }

    #[tokio::test]
    async fn get_returns_none_for_unknown_identity() {
        let store = InMemorySessionStore::new();
        assert!(store.get(&id(1)).await.is_none());
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let store = InMemorySessionStore::new();
        let mut session = Session::new(id(1));
        session.transition(SessionState::Idle);
        store.upsert(session.clone()).await;

        let loaded = store.get(&id(1)).await.expect("stored");
        assert_eq!(loaded.state, SessionState::Idle);
    }

    #[tokio::test]
    async fn clear_removes_the_session() {
        let store = InMemorySessionStore::new();
        store.upsert(Session::new(id(1))).await;
        store.clear(&id(1)).await;
        assert!(store.get(&id(1)).await.is_none());
    }

    #[tokio::test]
    async fn entry_lock_is_stable_per_identity() {
        let store = InMemorySessionStore::new();
        let a = store.entry_lock(&id(1)).await;
        let b = store.entry_lock(&id(1)).await;
        let other = store.entry_lock(&id(2)).await;

        assert!(Arc::ptr_eq(&a, &b), "same identity shares one lock");
        assert!(!Arc::ptr_eq(&a, &other), "identities are independent");
    }

    #[tokio::test]
    async fn entry_lock_serializes_same_identity_writers() {
        let store = Arc::new(InMemorySessionStore::new());
        store.upsert(Session::new(id(1))).await;

        // Two tasks race a read-modify-write of the same session; the entry
        // lock forces one to observe the other's write.
        let mut handles = Vec::new();
        for name in ["first", "second"] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let lock = store.entry_lock(&id(1)).await;
                let _guard = lock.lock().await;
                let mut session = store.get(&id(1)).await.expect("present");
                tokio::task::yield_now().await;
                session.file_name = Some(name.to_string());
                store.upsert(session).await;
            }));
        }
        for handle in handles {
            handle.await.expect("task completes");
        }

        let final_name = store.get(&id(1)).await.expect("present").file_name;
        assert!(final_name.is_some(), "one write wins, none is lost mid-flight");
    }
}
