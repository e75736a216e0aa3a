use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::Role;

/// One authenticated interaction, created at login and torn down at logout
/// or expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(username: String, role: Role, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            role,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_analyst(&self) -> bool {
        self.role == Role::Analyst
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            is_logged_in: true,
            username: self.username.clone(),
            is_admin: self.is_admin(),
        }
    }
}

/// What the presentation layer sees about the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub is_logged_in: bool,
    pub username: String,
    pub is_admin: bool,
}

impl SessionState {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Live sessions keyed by id. Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, username: &str, role: Role, ttl: Duration) -> Session {
        let session = Session::new(username.to_string(), role, ttl);
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id, session.clone());
        info!(username = %session.username, session = %session.id, "session opened");
        session
    }

    /// Expired sessions are evicted on lookup.
    pub async fn get(&self, id: &Uuid) -> Option<Session> {
        // Fast path: try read lock
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some(session) if !session.is_expired() => return Some(session.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.remove(id) {
            info!(username = %session.username, session = %id, "session expired");
        }
        None
    }

    /// Logout. Returns whether a live session was removed.
    pub async fn revoke(&self, id: &Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.remove(id) {
            Some(session) => {
                info!(username = %session.username, session = %id, "session closed");
                true
            }
            None => false,
        }
    }

    /// Drop every session of `username` except `keep`, e.g. after a
    /// password change.
    pub async fn revoke_user_except(&self, username: &str, keep: &Uuid) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, s| id == keep || s.username != username);
        before - sessions.len()
    }

    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_get_revoke() {
        let registry = SessionRegistry::new();
        let session = registry.create("alice", Role::Analyst, Duration::hours(1)).await;

        let found = registry.get(&session.id).await.unwrap();
        assert_eq!(found.username, "alice");
        assert!(found.is_analyst());
        assert!(!found.is_admin());

        assert!(registry.revoke(&session.id).await);
        assert!(registry.get(&session.id).await.is_none());
        assert!(!registry.revoke(&session.id).await);
    }

    #[tokio::test]
    async fn expired_sessions_are_evicted() {
        let registry = SessionRegistry::new();
        let session = registry.create("bob", Role::User, Duration::seconds(-1)).await;
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(&session.id).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn purge_and_revoke_user() {
        let registry = SessionRegistry::new();
        registry.create("bob", Role::User, Duration::seconds(-1)).await;
        registry.create("carol", Role::User, Duration::hours(1)).await;
        registry.create("carol", Role::User, Duration::hours(1)).await;

        let kept = registry.create("carol", Role::User, Duration::hours(1)).await;

        assert_eq!(registry.purge_expired().await, 1);
        assert_eq!(registry.revoke_user_except("carol", &kept.id).await, 2);
        assert!(registry.get(&kept.id).await.is_some());
        assert_eq!(registry.len().await, 1);
    }

    #[test]
    fn state_view() {
        let session = Session::new("root1".into(), Role::Admin, Duration::hours(1));
        let state = session.state();
        assert!(state.is_logged_in);
        assert!(state.is_admin);
        assert_eq!(state.username, "root1");
        assert!(!SessionState::anonymous().is_logged_in);
    }
}
