//! In-memory session storage
//!
//! Each session owns its conversation state behind its own lock, so a slow
//! completion only blocks further requests on that same session. Sessions
//! idle for longer than the configured TTL are dropped by a periodic sweep,
//! and the store never holds more than `max_sessions` at once.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::conversation::ConversationState;

/// One chat session's slot. The state is `None` until initialized.
#[derive(Debug)]
pub struct Session {
    pub created_at: DateTime<Utc>,
    pub state: Option<ConversationState>,
}

/// When the store may forget a session
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Idle time after which a session is dropped
    pub ttl: Duration,
    /// Upper bound on live sessions; the least recently used idle one goes first
    pub max_sessions: Option<usize>,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            max_sessions: None,
        }
    }
}

#[derive(Debug)]
struct Entry {
    session: Arc<Mutex<Session>>,
    last_active: DateTime<Utc>,
}

impl Entry {
    /// A request currently holds the session's lock
    fn is_busy(&self) -> bool {
        self.session.try_lock().is_err()
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    limits: SessionLimits,
    sessions: RwLock<HashMap<Uuid, Entry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: SessionLimits) -> Self {
        Self {
            limits,
            sessions: RwLock::default(),
        }
    }

    /// Register an empty session and return its id
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let entry = Entry {
            session: Arc::new(Mutex::new(Session {
                created_at: now,
                state: None,
            })),
            last_active: now,
        };

        let mut sessions = self.sessions.write().await;
        if let Some(max) = self.limits.max_sessions {
            while sessions.len() >= max {
                let Some(oldest) = least_recently_active(&sessions) else {
                    break;
                };
                sessions.remove(&oldest);
                tracing::debug!(id = %oldest, "Session evicted, store at capacity");
            }
        }
        sessions.insert(id, entry);
        drop(sessions);

        tracing::debug!(%id, "Session created");
        id
    }

    /// Run `f` with exclusive access to the session, marking it active.
    ///
    /// Returns `None` if the session doesn't exist.
    pub async fn with<F, Fut, T>(&self, id: Uuid, f: F) -> Option<T>
    where
        F: FnOnce(Arc<Mutex<Session>>) -> Fut,
        Fut: Future<Output = T>,
    {
        let session = self.touch(id).await?;
        let result = f(session).await;
        self.touch(id).await;
        Some(result)
    }

    async fn touch(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_active = Utc::now();
        Some(entry.session.clone())
    }

    /// End a session. Returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::debug!(%id, "Session ended");
        }
        removed
    }

    /// Drop every session idle since before `now - ttl`, skipping busy ones.
    /// Returns how many were removed.
    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let ttl = TimeDelta::from_std(self.limits.ttl).unwrap_or(TimeDelta::MAX);
        let cutoff = now.checked_sub_signed(ttl).unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_active >= cutoff || entry.is_busy());
        before - sessions.len()
    }

    /// Periodically purge expired sessions until the returned task is aborted
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let purged = store.purge_expired_at(Utc::now()).await;
                if purged > 0 {
                    tracing::info!(purged, "🧹 Expired idle sessions");
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn least_recently_active(sessions: &HashMap<Uuid, Entry>) -> Option<Uuid> {
    sessions
        .iter()
        .filter(|(_, entry)| !entry.is_busy())
        .min_by_key(|(_, entry)| entry.last_active)
        .map(|(id, _)| *id)
}
