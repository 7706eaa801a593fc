//! Per-visitor session state: request allowance, confirmed mappings and the
//! last suggestion list. Each handler locks only its own session.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use occucode_core::{MappingSession, RateLimiter, Suggestion};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug)]
pub struct Session {
    pub limiter: RateLimiter,
    pub mappings: MappingSession,
    pub suggestions: Vec<Suggestion>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    fn new(limiter: RateLimiter) -> Self {
        Self {
            limiter,
            mappings: MappingSession::new(),
            suggestions: Vec::new(),
            last_seen: Utc::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
    max_requests: u32,
    contact: String,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(max_requests: u32, contact: impl Into<String>, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            contact: contact.into(),
            ttl,
        }
    }

    /// Create a fresh session, evicting any that have been idle past the TTL.
    pub async fn create(&self) -> (Uuid, SessionHandle) {
        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(Session::new(RateLimiter::new(
            self.max_requests,
            self.contact.clone(),
        ))));

        let mut sessions = self.sessions.write().await;
        let evicted = self.evict_idle(&mut sessions);
        sessions.insert(id, handle.clone());
        info!(session_id = %id, evicted, active = sessions.len(), "session created");

        (id, handle)
    }

    pub async fn get(&self, id: Uuid) -> Result<SessionHandle, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, SessionHandle>) -> usize {
        let cutoff = Utc::now() - self.ttl;
        let mut stale = Vec::new();
        for (id, handle) in sessions.iter() {
            // A locked session is in use, so it is not idle.
            if let Ok(session) = handle.try_lock() {
                if session.last_seen < cutoff {
                    stale.push(*id);
                }
            }
        }
        for id in &stale {
            sessions.remove(id);
        }
        stale.len()
    }
}
