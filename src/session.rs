//! Session store (C1) and its in-memory reference implementation.
//!
//! Persistence backends proper are out of scope (spec.md §1) — this module
//! only defines the trait external stores implement, plus an in-memory
//! implementation that makes the crate runnable and testable standalone,
//! alongside whatever production-grade store (e.g. sqlite-backed) an
//! embedder plugs in.

use crate::error::{AgentError, Result};
use crate::event::Event;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub app: String,
    pub user: String,
    pub id: String,
}

impl SessionKey {
    pub fn new(app: impl Into<String>, user: impl Into<String>, id: impl Into<String>) -> Self {
        Self { app: app.into(), user: user.into(), id: id.into() }
    }
}

/// `{app, user, id, events, state}` (spec.md §3). `events` is append-only;
/// `state` is derived by replaying `stateDelta`s in event order and is kept
/// as a materialized cache for convenience — it is never written to
/// directly.
#[derive(Debug, Clone)]
pub struct Session {
    pub key: SessionKey,
    pub events: Vec<Event>,
    pub state: HashMap<String, Value>,
}

impl Session {
    pub fn new(key: SessionKey, initial_state: HashMap<String, Value>) -> Self {
        Session { key, events: Vec::new(), state: initial_state }
    }

    /// Replays `stateDelta`s in event order, confirming the invariant that
    /// the materialized `state` is reproducible from the event log alone.
    pub fn replay_state(&self) -> HashMap<String, Value> {
        let mut state = HashMap::new();
        for event in &self.events {
            for (k, v) in &event.actions.state_delta {
                state.insert(k.clone(), v.clone());
            }
        }
        state
    }

    pub fn events_for_agent<'a>(&'a self, agent: &'a str) -> impl Iterator<Item = &'a Event> {
        self.events.iter().filter(move |e| e.author == agent)
    }

    /// Last `n` events, or all of them when `n` is `None` — mirrors the
    /// optional `window` parameter on `SessionService::get`.
    pub fn windowed(&self, n: Option<usize>) -> &[Event] {
        match n {
            Some(n) if n < self.events.len() => &self.events[self.events.len() - n..],
            _ => &self.events[..],
        }
    }
}

/// External collaborator (C1): persists an append-only event log and a
/// mutable state map, keyed by `(app, user, session)`.
#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    async fn create_session(
        &self,
        app: &str,
        user: &str,
        initial_state: Option<HashMap<String, Value>>,
        id: Option<String>,
    ) -> Result<Session>;

    async fn get_session(&self, key: &SessionKey, window: Option<usize>) -> Result<Session>;

    /// Appends `event` to the session, assigns it a monotonically
    /// increasing timestamp, applies its `stateDelta` to materialized
    /// state, and returns the materialized event.
    async fn append_event(&self, key: &SessionKey, event: Event) -> Result<Event>;

    async fn list_sessions(&self, app: &str, user: &str) -> Result<Vec<SessionKey>>;

    async fn delete_session(&self, key: &SessionKey) -> Result<()>;

    async fn end_session(&self, key: &SessionKey) -> Result<()>;
}

#[derive(Default)]
struct Store {
    sessions: HashMap<SessionKey, Session>,
    last_timestamp: HashMap<SessionKey, i64>,
}

/// In-memory `SessionService`. Single-writer-per-session is enforced by a
/// process-wide mutex; this is a reference/testing implementation, not a
/// production persistence backend.
pub struct InMemorySessionService {
    store: Arc<Mutex<Store>>,
}

impl Default for InMemorySessionService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self { store: Arc::new(Mutex::new(Store::default())) }
    }
}

#[async_trait::async_trait]
impl SessionService for InMemorySessionService {
    async fn create_session(
        &self,
        app: &str,
        user: &str,
        initial_state: Option<HashMap<String, Value>>,
        id: Option<String>,
    ) -> Result<Session> {
        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let key = SessionKey::new(app, user, id);
        let session = Session::new(key.clone(), initial_state.unwrap_or_default());
        let mut store = self.store.lock();
        if store.sessions.contains_key(&key) {
            return Err(AgentError::Session(format!("session already exists: {:?}", key)));
        }
        store.sessions.insert(key.clone(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, key: &SessionKey, window: Option<usize>) -> Result<Session> {
        let store = self.store.lock();
        let session = store
            .sessions
            .get(key)
            .ok_or_else(|| AgentError::Session(format!("session not found: {:?}", key)))?;
        let mut windowed = session.clone();
        windowed.events = session.windowed(window).to_vec();
        Ok(windowed)
    }

    async fn append_event(&self, key: &SessionKey, mut event: Event) -> Result<Event> {
        let mut store = self.store.lock();
        let next_ts = store.last_timestamp.get(key).copied().unwrap_or(0) + 1;
        store.last_timestamp.insert(key.clone(), next_ts);
        event.timestamp = chrono::DateTime::from_timestamp(next_ts, 0).unwrap_or_else(chrono::Utc::now);

        let session = store
            .sessions
            .get_mut(key)
            .ok_or_else(|| AgentError::Session(format!("session not found: {:?}", key)))?;
        for (k, v) in &event.actions.state_delta {
            session.state.insert(k.clone(), v.clone());
        }
        session.events.push(event.clone());
        Ok(event)
    }

    async fn list_sessions(&self, app: &str, user: &str) -> Result<Vec<SessionKey>> {
        let store = self.store.lock();
        Ok(store
            .sessions
            .keys()
            .filter(|k| k.app == app && k.user == user)
            .cloned()
            .collect())
    }

    async fn delete_session(&self, key: &SessionKey) -> Result<()> {
        let mut store = self.store.lock();
        store.sessions.remove(key);
        store.last_timestamp.remove(key);
        Ok(())
    }

    async fn end_session(&self, _key: &SessionKey) -> Result<()> {
        Ok(())
    }
}
