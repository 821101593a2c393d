//! Observable session store shared across execution contexts.
//!
//! A `SessionStore` is one context's handle on the persisted session. Every
//! store attached to the same `SessionBus` sees every change: `set`/`clear`
//! persist the record, then deliver the new value to all subscribers on the
//! bus before returning.
//!
//! Stores in other processes have their own bus. `watch_external` carries
//! their changes into this one by watching the persisted store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::{AppError, Result, Session};
use crate::infrastructure::SessionBackend;

type Callback = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

/// How often `watch_external` checks the persisted store by default.
pub const DEFAULT_EXTERNAL_POLL: Duration = Duration::from_millis(500);

/// Publish hub for session changes.
#[derive(Default)]
pub struct SessionBus {
    next_id: AtomicU64,
    subscribers: Mutex<BTreeMap<u64, Callback>>,
}

impl SessionBus {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of live subscriptions across all attached contexts.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, Callback>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, callback: Callback) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, callback);
        id
    }

    fn unregister(&self, id: u64) {
        self.lock().remove(&id);
    }

    /// Deliver `session` to every subscriber, without holding the lock
    /// while a callback runs.
    fn publish(&self, session: Option<&Session>) {
        let ids: Vec<u64> = self.lock().keys().copied().collect();
        for id in ids {
            // Re-check so a callback removed mid-delivery is never invoked.
            let callback = self.lock().get(&id).cloned();
            if let Some(callback) = callback {
                callback(session);
            }
        }
    }
}

/// Handle returned by [`SessionStore::subscribe`].
///
/// The callback stays registered until `unsubscribe` is called or the handle
/// is dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<SessionBus>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unregister(self.id);
        }
    }
}

/// One execution context's view of the persisted session.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn SessionBackend>,
    bus: Arc<SessionBus>,
}

impl SessionStore {
    /// Store over `backend` with its own, fresh bus.
    #[must_use]
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        Self::attach(backend, SessionBus::new())
    }

    /// Store over `backend` that joins an existing bus.
    #[must_use]
    pub fn attach(backend: Arc<dyn SessionBackend>, bus: Arc<SessionBus>) -> Self {
        Self { backend, bus }
    }

    /// A sibling context over the same persisted store and bus.
    #[must_use]
    pub fn context(&self) -> Self {
        Self::attach(Arc::clone(&self.backend), Arc::clone(&self.bus))
    }

    #[must_use]
    pub fn bus(&self) -> Arc<SessionBus> {
        Arc::clone(&self.bus)
    }

    /// Current session, or `None`.
    ///
    /// Unreadable or malformed records read as logged out.
    #[must_use]
    pub fn get(&self) -> Option<Session> {
        match self.backend.load() {
            Ok(Some(record)) => decode(&record),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Session storage unreadable, treating as logged out");
                None
            }
        }
    }

    /// Persist `session` and notify every subscriber.
    ///
    /// # Errors
    /// Returns error if the session is incomplete or cannot be persisted;
    /// no notification is sent in that case.
    pub fn set(&self, session: Session) -> Result<()> {
        if session.token.trim().is_empty() {
            return Err(AppError::validation("session", "Session token is empty"));
        }

        let record = serde_json::to_string(&session).map_err(AppError::json_parse)?;
        self.backend.save(&record)?;

        tracing::info!(user = %session.user.email, "Session established");
        self.bus.publish(Some(&session));
        Ok(())
    }

    /// Remove the persisted session and notify every subscriber.
    ///
    /// # Errors
    /// Returns error if the record cannot be removed.
    pub fn clear(&self) -> Result<()> {
        self.backend.remove()?;

        tracing::info!("Session cleared");
        self.bus.publish(None);
        Ok(())
    }

    /// Publish changes committed to the persisted store by other processes,
    /// checking every `period` until the returned handle is dropped.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn watch_external(&self, period: Duration) -> ExternalWatch {
        let mut changes = ExternalChanges::new(self.clone());
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                changes.check();
            }
        });

        tracing::debug!(?period, "Watching for external session changes");
        ExternalWatch { task }
    }

    /// Register `callback` for every subsequent change, from any context.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        let id = self.bus.register(Arc::new(callback));
        Subscription {
            bus: Arc::downgrade(&self.bus),
            id,
        }
    }
}

/// Detects changes that other processes commit to a store's backend and
/// publishes them on the store's bus.
pub struct ExternalChanges {
    store: SessionStore,
    seen: i64,
}

impl ExternalChanges {
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        let seen = store.backend.external_version().unwrap_or_default();
        Self { store, seen }
    }

    /// Publish the current session if another process changed it since the
    /// last check. Returns whether anything was published.
    pub fn check(&mut self) -> bool {
        let version = match self.store.backend.external_version() {
            Ok(version) => version,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot check session storage for outside changes");
                return false;
            }
        };
        if version == self.seen {
            return false;
        }

        self.seen = version;
        let session = self.store.get();
        tracing::info!(logged_in = session.is_some(), "Session changed in another process");
        self.store.bus.publish(session.as_ref());
        true
    }
}

/// Background watch started by [`SessionStore::watch_external`]; stops when
/// dropped.
#[must_use = "dropping an ExternalWatch stops it immediately"]
pub struct ExternalWatch {
    task: JoinHandle<()>,
}

impl Drop for ExternalWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn decode(record: &str) -> Option<Session> {
    match serde_json::from_str::<Session>(record) {
        Ok(session) if !session.token.trim().is_empty() => Some(session),
        Ok(_) => {
            tracing::warn!("Persisted session has an empty token, ignoring");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Persisted session is corrupted, ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::infrastructure::{LocalStorage, MemoryBackend};
    use std::sync::atomic::AtomicUsize;
    use tempfile::tempdir;

    fn session(token: &str) -> Session {
        Session::new(
            token,
            User {
                id: "1".into(),
                email: "jane@example.com".into(),
            },
        )
    }

    fn recorder(store: &SessionStore) -> (Subscription, Arc<Mutex<Vec<Option<String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = store.subscribe(move |s| {
            sink.lock().unwrap().push(s.map(|s| s.token.clone()));
        });
        (sub, seen)
    }

    #[test]
    fn test_set_then_get_and_clear() {
        let store = SessionStore::new(Arc::new(MemoryBackend::new()));
        assert_eq!(store.get(), None);

        store.set(session("abc")).unwrap();
        assert_eq!(store.get(), Some(session("abc")));

        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_change_reaches_other_context() {
        let tab_a = SessionStore::new(Arc::new(MemoryBackend::new()));
        let tab_b = tab_a.context();
        let (_sub, seen) = recorder(&tab_b);

        tab_a.set(session("abc")).unwrap();
        assert_eq!(tab_b.get(), Some(session("abc")));
        tab_a.clear().unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("abc".to_string()), None]
        );
    }

    #[test]
    fn test_contexts_over_sqlite_share_bus() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.db");
        let bus = SessionBus::new();

        let a = SessionStore::attach(
            Arc::new(LocalStorage::open(&path).unwrap()),
            Arc::clone(&bus),
        );
        let b = SessionStore::attach(Arc::new(LocalStorage::open(&path).unwrap()), bus);
        let (_sub, seen) = recorder(&b);

        a.set(session("xyz")).unwrap();

        assert_eq!(b.get(), Some(session("xyz")));
        assert_eq!(*seen.lock().unwrap(), vec![Some("xyz".to_string())]);
    }

    fn sqlite_store(path: &std::path::Path) -> SessionStore {
        SessionStore::new(Arc::new(LocalStorage::open(path).unwrap()))
    }

    #[test]
    fn test_other_process_change_reaches_subscribers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.db");
        let first = sqlite_store(&path);
        let second = sqlite_store(&path);
        let (_sub, seen) = recorder(&second);
        let mut changes = ExternalChanges::new(second.clone());

        assert!(!changes.check());

        first.set(session("xyz")).unwrap();
        assert!(changes.check());
        assert!(!changes.check());

        first.clear().unwrap();
        assert!(changes.check());

        assert_eq!(*seen.lock().unwrap(), vec![Some("xyz".to_string()), None]);
    }

    #[test]
    fn test_own_writes_are_not_published_twice() {
        let dir = tempdir().unwrap();
        let store = sqlite_store(&dir.path().join("session.db"));
        let (_sub, seen) = recorder(&store);
        let mut changes = ExternalChanges::new(store.clone());

        store.set(session("abc")).unwrap();

        assert!(!changes.check());
        assert_eq!(*seen.lock().unwrap(), vec![Some("abc".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_publishes_until_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.db");
        let first = sqlite_store(&path);
        let second = sqlite_store(&path);
        let (_sub, seen) = recorder(&second);

        let watch = second.watch_external(Duration::from_millis(100));
        first.set(session("xyz")).unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(*seen.lock().unwrap(), vec![Some("xyz".to_string())]);

        drop(watch);
        first.clear().unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(*seen.lock().unwrap(), vec![Some("xyz".to_string())]);
    }

    #[test]
    fn test_unsubscribe_is_honored() {
        let store = SessionStore::new(Arc::new(MemoryBackend::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sub = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.set(session("abc")).unwrap();
        sub.unsubscribe();
        store.clear().unwrap();
        store.set(session("def")).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.bus().subscriber_count(), 0);
    }

    #[test]
    fn test_callback_can_read_store() {
        let store = SessionStore::new(Arc::new(MemoryBackend::new()));
        let reader = store.context();
        let observed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        let _sub = store.subscribe(move |_| {
            *sink.lock().unwrap() = reader.get();
        });

        store.set(session("abc")).unwrap();
        assert_eq!(*observed.lock().unwrap(), Some(session("abc")));
    }

    #[test]
    fn test_independent_stores_are_isolated() {
        let a = SessionStore::new(Arc::new(MemoryBackend::new()));
        let b = SessionStore::new(Arc::new(MemoryBackend::new()));
        let (_sub, seen) = recorder(&b);

        a.set(session("abc")).unwrap();

        assert_eq!(b.get(), None);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_corrupted_record_reads_as_absent() {
        for record in [
            "not json",
            r#"{"token":"abc"}"#,
            r#"{"token":"","user":{"id":"1","email":"a@b.c"}}"#,
            r#"{"user":{"id":"1","email":"a@b.c"}}"#,
        ] {
            let store = SessionStore::new(Arc::new(MemoryBackend::with_record(record)));
            assert_eq!(store.get(), None, "{record} should read as absent");
        }
    }

    #[test]
    fn test_numeric_user_id_is_accepted() {
        let record = r#"{"token":"abc","user":{"id":7,"email":"a@b.c"}}"#;
        let store = SessionStore::new(Arc::new(MemoryBackend::with_record(record)));
        assert_eq!(store.get().map(|s| s.user.id), Some("7".to_string()));
    }

    #[test]
    fn test_empty_token_is_rejected_without_notification() {
        let store = SessionStore::new(Arc::new(MemoryBackend::new()));
        let (_sub, seen) = recorder(&store);

        assert!(store.set(session("  ")).is_err());
        assert_eq!(store.get(), None);
        assert!(seen.lock().unwrap().is_empty());
    }
}
