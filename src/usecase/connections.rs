use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::notification::Notification;

pub type SessionId = Uuid;

#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Capacity of each session's outbound queue.
    pub buffer_size: usize,
    /// Registering past this many sessions evicts the user's oldest one.
    pub max_sessions_per_user: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            buffer_size: 32,
            max_sessions_per_user: 5,
        }
    }
}

#[derive(Debug)]
struct SessionSlot {
    id: SessionId,
    sender: mpsc::Sender<Notification>,
    opened_at: DateTime<Utc>,
}

/// Live sessions keyed by user. Each session owns the receiving half of a
/// bounded channel and the registry keeps the senders.
#[derive(Debug)]
pub struct ConnectionRegistry {
    sessions: DashMap<i64, Vec<SessionSlot>>,
    settings: RegistrySettings,
}

impl ConnectionRegistry {
    pub fn new(settings: RegistrySettings) -> Self {
        Self {
            sessions: DashMap::new(),
            settings,
        }
    }

    /// Registers a new session for `user_id`.
    ///
    /// The returned guard deregisters the session when dropped, so the caller
    /// must keep it alive for as long as it drains the receiver.
    pub fn register(self: &Arc<Self>, user_id: i64) -> (SessionGuard, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(self.settings.buffer_size.max(1));
        let session_id = Uuid::new_v4();
        let max_sessions = self.settings.max_sessions_per_user.max(1);

        let evicted = {
            let mut slots = self.sessions.entry(user_id).or_default();
            let overflow = (slots.len() + 1).saturating_sub(max_sessions);
            let evicted: Vec<SessionSlot> = slots.drain(..overflow).collect();
            slots.push(SessionSlot {
                id: session_id,
                sender: tx,
                opened_at: Utc::now(),
            });
            evicted
        };

        // Dropping an evicted slot drops its sender, which ends that session's
        // receive loop once its queue is drained.
        for slot in &evicted {
            tracing::warn!(
                user_id,
                evicted_session_id = %slot.id,
                opened_at = %slot.opened_at,
                max_sessions,
                "session limit reached, closing oldest session"
            );
        }

        metrics::gauge!("realtime_sessions_active").increment(1.0);
        if !evicted.is_empty() {
            metrics::gauge!("realtime_sessions_active").decrement(evicted.len() as f64);
            metrics::counter!("realtime_sessions_evicted_total").increment(evicted.len() as u64);
        }

        tracing::info!(user_id, %session_id, "session registered");

        (
            SessionGuard {
                registry: Arc::clone(self),
                user_id,
                session_id,
            },
            rx,
        )
    }

    /// Returns the senders of every live session of `user_id`. Never waits on
    /// a session; the map shard is locked only while the senders are cloned.
    pub fn lookup(&self, user_id: i64) -> Vec<mpsc::Sender<Notification>> {
        self.sessions
            .get(&user_id)
            .map(|slots| slots.iter().map(|slot| slot.sender.clone()).collect())
            .unwrap_or_default()
    }

    pub fn session_count(&self, user_id: i64) -> usize {
        self.sessions.get(&user_id).map(|slots| slots.len()).unwrap_or(0)
    }

    pub fn connected_users(&self) -> usize {
        self.sessions.len()
    }

    fn deregister(&self, user_id: i64, session_id: SessionId) -> bool {
        let removed = match self.sessions.get_mut(&user_id) {
            Some(mut slots) => {
                let before = slots.len();
                slots.retain(|slot| slot.id != session_id);
                slots.len() != before
            }
            None => false,
        };
        // The shard guard above must be released before this call.
        self.sessions.remove_if(&user_id, |_, slots| slots.is_empty());

        if removed {
            metrics::gauge!("realtime_sessions_active").decrement(1.0);
        }
        removed
    }
}

/// Keeps a session registered while alive. Dropped on every exit path of the
/// session task, including unwinding.
#[derive(Debug)]
pub struct SessionGuard {
    registry: Arc<ConnectionRegistry>,
    user_id: i64,
    session_id: SessionId,
}

impl SessionGuard {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.registry.deregister(self.user_id, self.session_id) {
            tracing::info!(user_id = self.user_id, session_id = %self.session_id, "session deregistered");
        } else {
            tracing::debug!(user_id = self.user_id, session_id = %self.session_id, "session already evicted");
        }
    }
}
