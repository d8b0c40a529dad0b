//! Concurrency-safe session storage.

use crate::session::Session;
use model::SessionId;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Map of session state, keyed by session id.
///
/// The outer lock is held only long enough to fetch or insert the
/// per-session handle; all state access goes through the per-key mutex, so
/// operations on different sessions never block each other.
///
/// Sessions are created on first access and retained for the process
/// lifetime; eviction is a deliberately unresolved extension point.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the handle for `id`, creating a default session if absent.
    fn handle(&self, id: SessionId) -> Arc<Mutex<Session>> {
        if let Some(handle) = self.sessions.read().get(&id) {
            return Arc::clone(handle);
        }

        let mut sessions = self.sessions.write();
        Arc::clone(sessions.entry(id).or_default())
    }

    /// Apply `f` under exclusive access to exactly this session's state,
    /// creating the default session if absent.
    pub fn mutate<R>(&self, id: SessionId, f: impl FnOnce(&mut Session) -> R) -> R {
        let handle = self.handle(id);
        let mut session = handle.lock();
        f(&mut session)
    }

    /// Consistent point-in-time copy of the session, creating the default
    /// if absent.
    pub fn snapshot(&self, id: SessionId) -> Session {
        let handle = self.handle(id);
        let session = handle.lock();
        session.clone()
    }

    /// Apply `f` to the session if it exists; never creates one.
    pub fn read<R>(&self, id: SessionId, f: impl FnOnce(&Session) -> R) -> Option<R> {
        let handle = {
            let sessions = self.sessions.read();
            sessions.get(&id).map(Arc::clone)
        }?;
        let session = handle.lock();
        Some(f(&session))
    }

    /// Whether a session exists for `id`.
    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().contains_key(&id)
    }

    /// Number of sessions created so far.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no session has been created yet.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MonitorMode;

    const ALICE: SessionId = SessionId(1);
    const BOB: SessionId = SessionId(2);

    #[test]
    fn snapshot_creates_default_session() {
        let store = SessionStore::new();
        assert!(!store.contains(ALICE));

        let session = store.snapshot(ALICE);
        assert!(session.mode.is_idle());
        assert!(!session.running);
        assert_eq!(session.generation, 0);
        assert!(store.contains(ALICE));
    }

    #[test]
    fn mutate_persists_changes() {
        let store = SessionStore::new();

        store.mutate(ALICE, |s| {
            s.filter.asset = "BTC".to_string();
        });

        assert_eq!(store.snapshot(ALICE).filter.asset, "BTC");
    }

    #[test]
    fn snapshot_is_an_independent_copy() {
        let store = SessionStore::new();
        let mut snapshot = store.snapshot(ALICE);
        snapshot.filter.asset = "BTC".to_string();

        assert_eq!(store.snapshot(ALICE).filter.asset, "USDT");
    }

    #[test]
    fn read_does_not_create_sessions() {
        let store = SessionStore::new();
        assert!(store.read(ALICE, |s| s.generation).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new();

        store.mutate(ALICE, |s| {
            s.arm(MonitorMode::Counterparty("trader1".to_string()));
        });

        assert!(!store.snapshot(BOB).running);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn concurrent_mutations_do_not_lose_updates() {
        let store = SessionStore::new();
        let mut handles = Vec::new();

        for i in 0..8 {
            let store = store.clone();
            let id = SessionId(i % 2);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    store.mutate(id, |s| s.generation += 1);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let total = store.snapshot(SessionId(0)).generation + store.snapshot(SessionId(1)).generation;
        assert_eq!(total, 800);
    }
}
