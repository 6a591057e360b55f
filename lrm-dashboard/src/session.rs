//! PIN sessions
//!
//! A successful PIN login creates a random token kept in memory and handed
//! to the browser as an HttpOnly cookie. Sessions end on logout, on restart,
//! or once older than the configured lifetime.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "lrm_session";

/// Who a session belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRole {
    Director,
    /// Holder user id
    Holder(String),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub role: SessionRole,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_director(&self) -> bool {
        self.role == SessionRole::Director
    }

    /// Holder user id, `None` for the director
    pub fn holder_account(&self) -> Option<&str> {
        match &self.role {
            SessionRole::Holder(account) => Some(account),
            SessionRole::Director => None,
        }
    }
}

/// Session attached to the current request by the session middleware
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<Session>);

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl,
        }
    }

    fn expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.created_at > self.ttl
    }

    /// Start a session and return its token; expired sessions are dropped
    pub async fn create(&self, role: SessionRole, display_name: impl Into<String>) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let session = Session {
            role,
            display_name: display_name.into(),
            created_at: now,
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !self.expired(s, now));
        if sessions.len() < before {
            debug!("Pruned {} expired sessions", before - sessions.len());
        }
        sessions.insert(token.clone(), session);
        token
    }

    /// Live session for a token; an expired one is removed
    pub async fn get(&self, token: &str) -> Option<Session> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                None => return None,
                Some(session) if !self.expired(session, now) => return Some(session.clone()),
                Some(_) => {}
            }
        }
        self.sessions.write().await.remove(token);
        None
    }

    pub async fn remove(&self, token: &str) -> Option<Session> {
        self.sessions.write().await.remove(token)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Session token from the request's `Cookie` headers
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value that stores a session token
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, token
    )
}

/// `Set-Cookie` value that clears the session cookie
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}
