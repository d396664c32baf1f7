//! Per-browser session state.
//!
//! A session is keyed by the `doc_qa_session` cookie. Its [`SessionContext`]
//! sits behind an async mutex, so operations within one session run one at a
//! time. Idle sessions are pruned whenever a new session is created.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use contextor::{QaAnswer, QueryEngine};
use tracing::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "doc_qa_session";

/// One-shot message shown on the next page render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error { category: &'static str, message: String },
}

/// Mutable state of one user session.
#[derive(Debug, Default)]
pub struct SessionContext {
    /// Present once a document has been processed.
    pub engine: Option<Arc<QueryEngine>>,
    pub file_name: Option<String>,
    pub last_question: Option<String>,
    pub last_answer: Option<QaAnswer>,
    pub notice: Option<Notice>,
}

impl SessionContext {
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub ctx: tokio::sync::Mutex<SessionContext>,
    last_seen_ms: AtomicU64,
}

impl Session {
    fn new(id: Uuid, now_ms: u64) -> Self {
        Self {
            id,
            ctx: tokio::sync::Mutex::new(SessionContext::default()),
            last_seen_ms: AtomicU64::new(now_ms),
        }
    }
}

/// All live sessions.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Arc<Session>>>,
    idle: Duration,
    epoch: Instant,
}

impl SessionStore {
    pub fn new(idle: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle,
            epoch: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the session for `id`, or a fresh one when `id` is unknown or absent.
    ///
    /// The boolean is `true` when a new session was created.
    pub fn get_or_create(&self, id: Option<Uuid>) -> (Arc<Session>, bool) {
        let now = self.now_ms();
        let mut map = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(session) = id.and_then(|id| map.get(&id)) {
            session.last_seen_ms.store(now, Ordering::Relaxed);
            return (Arc::clone(session), false);
        }

        let idle_ms = self.idle.as_millis() as u64;
        let before = map.len();
        map.retain(|_, s| now.saturating_sub(s.last_seen_ms.load(Ordering::Relaxed)) <= idle_ms);
        if map.len() < before {
            debug!(pruned = before - map.len(), "expired sessions dropped");
        }

        let session = Arc::new(Session::new(Uuid::new_v4(), now));
        map.insert(session.id, Arc::clone(&session));
        debug!(session = %session.id, live = map.len(), "session created");
        (session, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_known_ids_and_creates_for_unknown() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (a, created) = store.get_or_create(None);
        assert!(created);
        let (b, created) = store.get_or_create(Some(a.id));
        assert!(!created);
        assert!(Arc::ptr_eq(&a, &b));
        let (c, created) = store.get_or_create(Some(Uuid::new_v4()));
        assert!(created);
        assert_ne!(a.id, c.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn idle_sessions_are_pruned_on_create() {
        let store = SessionStore::new(Duration::ZERO);
        let (a, _) = store.get_or_create(None);
        std::thread::sleep(Duration::from_millis(5));
        let (_b, _) = store.get_or_create(None);
        assert_eq!(store.len(), 1);
        let (again, created) = store.get_or_create(Some(a.id));
        assert!(created);
        assert_ne!(again.id, a.id);
    }

    #[tokio::test]
    async fn context_starts_empty() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (s, _) = store.get_or_create(None);
        let mut ctx = s.ctx.lock().await;
        assert!(ctx.engine.is_none());
        assert!(ctx.take_notice().is_none());
    }
}
