//! Session store port.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::foundation::Identity;
use crate::domain::session::Session;

/// Port for the keyed session mapping, the only shared mutable state in the
/// system.
///
/// `entry_lock` returns the per-identity mutex the engine holds for the whole
/// of one event's evaluation, so two near-simultaneous events for the same
/// identity (e.g., a duplicate webhook delivery) can never interleave their
/// read-modify-write. Events for different identities proceed concurrently.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The serialization lock for one identity. Callers lock it before
    /// `get` and release it only after the final `upsert`/`clear`.
    async fn entry_lock(&self, identity: &Identity) -> Arc<Mutex<()>>;

    /// Snapshot of an identity's session, if any.
    async fn get(&self, identity: &Identity) -> Option<Session>;

    /// Inserts or replaces an identity's session.
    async fn upsert(&self, session: Session);

    /// Removes an identity's session; absence afterwards means `Initial`.
    async fn clear(&self, identity: &Identity);
}
