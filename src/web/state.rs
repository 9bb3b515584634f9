//! Shared state for the web host.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::Config;
use crate::replay::{MemoryRegistry, ReplayOutcome, ReplayTrigger};

/// One live UI: its inputs plus the trigger that bookmarks them.
pub type Session = ReplayTrigger<MemoryRegistry>;

/// Handle to a session, locked by one request at a time.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct WebAppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
}

struct SessionEntry {
    handle: SessionHandle,
    last_seen: Instant,
}

impl WebAppState {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Start a session, replaying `query` into its inputs.
    ///
    /// Idle sessions are swept first; at capacity the least recently used
    /// session is dropped.
    pub fn create_session(&self, query: Option<&str>) -> (Uuid, SessionHandle, ReplayOutcome) {
        let config = self.config();
        let mut trigger = ReplayTrigger::new(
            config.policy,
            config.build_serializer(),
            config.build_registry(),
        );
        let outcome = trigger.start(query);

        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(trigger));
        {
            let mut sessions = self.inner.sessions.lock();
            self.evict_idle(&mut sessions, Instant::now());
            self.make_room(&mut sessions);
            sessions.insert(
                id,
                SessionEntry {
                    handle: handle.clone(),
                    last_seen: Instant::now(),
                },
            );
        }

        tracing::debug!(
            session = %id,
            restored = outcome.restored,
            applied = outcome.applied.len(),
            "Session started"
        );
        (id, handle, outcome)
    }

    /// Look up a session and mark it as used.
    pub fn session(&self, id: Uuid) -> Option<SessionHandle> {
        let mut sessions = self.inner.sessions.lock();
        let entry = sessions.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(entry.handle.clone())
    }

    pub fn remove_session(&self, id: Uuid) -> bool {
        self.inner.sessions.lock().remove(&id).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.lock().len()
    }

    /// Drop sessions idle for longer than the configured timeout.
    pub fn sweep_idle(&self) -> usize {
        let mut sessions = self.inner.sessions.lock();
        let before = sessions.len();
        self.evict_idle(&mut sessions, Instant::now());
        before - sessions.len()
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, SessionEntry>, now: Instant) {
        let idle = Duration::from_secs(self.config().server.session_idle_secs);
        sessions.retain(|id, entry| {
            let keep = now.saturating_duration_since(entry.last_seen) < idle;
            if !keep {
                tracing::debug!(session = %id, "Evicting idle session");
            }
            keep
        });
    }

    /// Drop least recently used sessions until one more fits under the cap.
    fn make_room(&self, sessions: &mut HashMap<Uuid, SessionEntry>) {
        let max = self.config().server.max_sessions.max(1);
        while sessions.len() >= max {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    tracing::debug!(session = %id, "Evicting least recently used session");
                    sessions.remove(&id);
                }
                None => break,
            }
        }
    }
}
