use crate::gameserver::UserId;
use crate::session::{SessionError, SessionStore, SessionToken, SESSION_TTL};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Debug, Clone, Copy)]
struct StoredSession {
    user_id: Option<UserId>,
    expiry: DateTime<Utc>,
}

/// In-memory session store, primarily for tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<SessionToken, StoredSession>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live rows, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn expire(&self, token: SessionToken) {
        if let Some(mut row) = self.sessions.get_mut(&token) {
            row.expiry = Utc::now() - chrono::Duration::seconds(1);
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self) -> Result<SessionToken, SessionError> {
        loop {
            let token = SessionToken::generate();
            let row = StoredSession {
                user_id: None,
                expiry: Utc::now()
                    + chrono::Duration::from_std(SESSION_TTL)
                        .unwrap_or_else(|_| chrono::Duration::zero()),
            };
            match self.sessions.entry(token) {
                dashmap::mapref::entry::Entry::Vacant(entry) => {
                    entry.insert(row);
                    return Ok(token);
                }
                dashmap::mapref::entry::Entry::Occupied(_) => continue,
            }
        }
    }

    async fn change_session(
        &self,
        token: SessionToken,
        user_id: Option<UserId>,
    ) -> Result<(), SessionError> {
        match self.sessions.get_mut(&token) {
            Some(mut row) => {
                row.user_id = user_id;
                Ok(())
            }
            None => Err(SessionError::NotFound),
        }
    }

    async fn query_session(&self, token: SessionToken) -> Result<Option<UserId>, SessionError> {
        match self.sessions.get(&token) {
            Some(row) if row.expiry > Utc::now() => Ok(row.user_id),
            _ => Err(SessionError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_query_change_round_trip() {
        let store = MemorySessionStore::new();
        let token = store.create_session().await.unwrap();
        assert_eq!(store.query_session(token).await.unwrap(), None);

        let user = UserId::generate();
        store.change_session(token, Some(user)).await.unwrap();
        assert_eq!(store.query_session(token).await.unwrap(), Some(user));

        store.change_session(token, None).await.unwrap();
        assert_eq!(store.query_session(token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let store = MemorySessionStore::new();
        let err = store
            .query_session(SessionToken::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound));
    }

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let store = MemorySessionStore::new();
        let token = store.create_session().await.unwrap();
        store.expire(token);
        let err = store.query_session(token).await.unwrap_err();
        assert!(matches!(err, SessionError::NotFound));
    }
}
