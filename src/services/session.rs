//! Dialog session state
//!
//! One session per user, held in process behind an async RwLock. A session
//! walks the four dialog steps forward and is removed when the dialog
//! completes. Sessions idle longer than the TTL are expired: lazily on
//! access, and by a periodic sweeper task so abandoned dialogs do not pile
//! up.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::time::Instant;

use crate::models::PreferenceTriple;

/// Where a dialog currently stands; "idle" is the absence of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    AwaitingGenre,
    AwaitingDepth,
    AwaitingFeatures,
    AwaitingFeedback { content_id: i64 },
}

/// One user's in-flight dialog
#[derive(Debug, Clone)]
pub struct DialogSession {
    pub state: DialogState,
    pub prefs: PreferenceTriple,
    last_activity: Instant,
}

impl DialogSession {
    fn new() -> Self {
        Self {
            state: DialogState::AwaitingGenre,
            prefs: PreferenceTriple::default(),
            last_activity: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_activity.elapsed() > ttl
    }
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<i64, DialogSession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Starts a fresh session for the user, replacing any existing one
    pub async fn begin(&self, user_id: i64) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(user_id, DialogSession::new());
    }

    /// Removes and returns the user's session; expired sessions count as gone
    pub async fn take(&self, user_id: i64) -> Option<DialogSession> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.remove(&user_id)?;
        if session.is_expired(self.ttl) {
            tracing::debug!(user_id, "Expired dialog session dropped on access");
            return None;
        }
        Some(session)
    }

    /// Stores the session back, refreshing its idle clock
    pub async fn put(&self, user_id: i64, mut session: DialogSession) {
        session.last_activity = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.insert(user_id, session);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn sweep(&self) {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.ttl));
        let swept = before - sessions.len();
        if swept > 0 {
            tracing::info!(swept, remaining = sessions.len(), "Expired dialog sessions swept");
        }
    }

    /// Spawns the periodic expiry sweeper
    ///
    /// Runs until the returned handle is told to shut down; the store clone
    /// inside the task keeps the session map alive.
    pub fn spawn_sweeper(&self, period: Duration) -> SessionSweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let store = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        store.sweep().await;
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Session sweeper shutting down");
                        break;
                    }
                }
            }
        });

        SessionSweeperHandle { shutdown_tx }
    }
}

/// Handle for stopping the sweeper task
pub struct SessionSweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SessionSweeperHandle {
    /// Signals the sweeper task to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_begin_replaces_existing_session() {
        let store = SessionStore::new(Duration::from_secs(1800));
        store.begin(1).await;

        let mut session = store.take(1).await.unwrap();
        session.state = DialogState::AwaitingDepth;
        session.prefs.genre = "sci-fi".to_string();
        store.put(1, session).await;

        store.begin(1).await;
        let session = store.take(1).await.unwrap();
        assert_eq!(session.state, DialogState::AwaitingGenre);
        assert!(session.prefs.is_unconstrained());
    }

    #[tokio::test]
    async fn test_take_removes_session() {
        let store = SessionStore::new(Duration::from_secs(1800));
        store.begin(1).await;

        assert!(store.take(1).await.is_some());
        assert!(store.take(1).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_is_gone_on_access() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.begin(1).await;

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(store.take(1).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_refreshes_idle_clock() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.begin(1).await;

        tokio::time::advance(Duration::from_secs(50)).await;
        let session = store.take(1).await.unwrap();
        store.put(1, session).await;

        tokio::time::advance(Duration::from_secs(50)).await;
        assert!(store.take(1).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_expired_sessions() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.begin(1).await;
        store.begin(2).await;

        let handle = store.spawn_sweeper(Duration::from_secs(30));
        tokio::time::advance(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;

        assert_eq!(store.len().await, 0);
        handle.shutdown().await;
    }
}
