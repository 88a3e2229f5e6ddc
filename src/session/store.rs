//! In-memory session storage keyed by opaque session id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use uuid::Uuid;

use super::CalculatorSession;
use crate::calculator::MAX_HISTORY;

/// Shared handle to one stored session.
///
/// Holding the lock serializes requests against the same session; different
/// sessions never contend.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Arc<str>,
    session: Arc<Mutex<CalculatorSession>>,
}

impl SessionHandle {
    fn new(id: &str, session: CalculatorSession) -> Self {
        Self {
            id: Arc::from(id),
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Opaque session id, as carried in the session cookie.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Lock the session for the rest of the request.
    pub async fn lock(&self) -> MutexGuard<'_, CalculatorSession> {
        self.session.lock().await
    }
}

/// Thread-safe store for calculator sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    max_history: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a store whose sessions keep [`MAX_HISTORY`] entries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_history(MAX_HISTORY)
    }

    /// Create a store whose sessions keep `max_history` entries.
    #[must_use]
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
                max_history,
            }),
        }
    }

    #[must_use]
    pub fn max_history(&self) -> usize {
        self.inner.max_history
    }

    /// Create a session under a fresh random id, with a fresh token.
    pub async fn create(&self) -> SessionHandle {
        let id = Uuid::new_v4().to_string();
        self.set(id, CalculatorSession::new(self.inner.max_history))
            .await
    }

    /// Get a session by id.
    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.inner.sessions.read().await.get(id).cloned()
    }

    /// Store `session` under `id`, replacing whatever was there.
    pub async fn set(&self, id: impl Into<String>, session: CalculatorSession) -> SessionHandle {
        let id = id.into();
        let handle = SessionHandle::new(&id, session);
        self.inner
            .sessions
            .write()
            .await
            .insert(id, handle.clone());
        handle
    }

    /// Look up the session a client presented, or start a new one.
    ///
    /// The second value is `true` when a new session was created. A client
    /// can never choose its own id: unknown ids get a fresh random one.
    pub async fn resolve(&self, id: Option<&str>) -> (SessionHandle, bool) {
        if let Some(id) = id {
            if let Some(handle) = self.get(id).await {
                return (handle, false);
            }
        }
        (self.create().await, true)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove sessions that have been idle longer than `timeout`.
    ///
    /// Sessions locked by an in-flight request are in use and are kept.
    /// Returns the number of sessions removed.
    pub async fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self.inner.sessions.write().await;
        let before = guard.len();
        guard.retain(|_, handle| match handle.session.try_lock() {
            Ok(session) => !session.is_expired_with_timeout(timeout),
            Err(_) => true,
        });
        before - guard.len()
    }

    /// Periodically drop idle sessions in the background.
    pub fn spawn_sweeper(&self, every: Duration, idle_timeout: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = store.cleanup_expired_with_timeout(idle_timeout).await;
                if removed > 0 {
                    let remaining = store.len().await;
                    debug!(
                        name: "session.expired",
                        removed,
                        remaining,
                        "Expired idle sessions"
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CsrfToken;

    #[tokio::test]
    async fn test_session_store() {
        let store = SessionStore::new();
        assert!(store.is_empty().await);

        let handle = store.create().await;
        assert_eq!(store.len().await, 1);

        let retrieved = store.get(handle.id()).await.unwrap();
        assert_eq!(retrieved.id(), handle.id());
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_handles_share_state() {
        let store = SessionStore::new();
        let handle = store.create().await;
        let token = handle.lock().await.token().as_str().to_owned();

        handle.lock().await.compute(&token, "1", "2", "Sum");

        let again = store.get(handle.id()).await.unwrap();
        assert_eq!(again.lock().await.history().len(), 1);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = SessionStore::new();
        let session = CalculatorSession::with_token(CsrfToken::from_string("t"), 3);
        store.set("known-id", session).await;

        let handle = store.get("known-id").await.unwrap();
        assert!(handle.lock().await.token().verify("t"));
        assert_eq!(handle.lock().await.max_history(), 3);
        assert!(store.get("other-id").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve() {
        let store = SessionStore::with_max_history(2);

        let (first, created) = store.resolve(None).await;
        assert!(created);
        assert_eq!(first.lock().await.max_history(), 2);

        let (same, created) = store.resolve(Some(first.id())).await;
        assert!(!created);
        assert_eq!(same.id(), first.id());

        let (fresh, created) = store.resolve(Some("attacker-chosen")).await;
        assert!(created);
        assert_ne!(fresh.id(), "attacker-chosen");
        assert!(store.get("attacker-chosen").await.is_none());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_sessions_get_distinct_tokens() {
        let store = SessionStore::new();
        let a = store.create().await;
        let b = store.create().await;
        assert_ne!(a.id(), b.id());
        assert_ne!(a.lock().await.token(), b.lock().await.token());
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let store = SessionStore::new();
        store.create().await;
        let busy = store.create().await;

        assert_eq!(
            store
                .cleanup_expired_with_timeout(Duration::from_secs(3600))
                .await,
            0
        );

        tokio::time::sleep(Duration::from_millis(20)).await;
        let _in_use = busy.lock().await;
        let removed = store
            .cleanup_expired_with_timeout(Duration::from_millis(1))
            .await;
        assert_eq!(removed, 1);
        assert!(store.get(busy.id()).await.is_some());
    }

    #[tokio::test]
    async fn test_sweeper_drops_idle_sessions() {
        let store = SessionStore::new();
        let idle = store.create().await;

        let sweeper = store.spawn_sweeper(Duration::from_millis(10), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(store.get(idle.id()).await.is_none());
        assert!(store.is_empty().await);
        sweeper.abort();
    }
}
