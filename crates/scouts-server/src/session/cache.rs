use crate::gameserver::UserId;
use crate::session::{SessionError, SessionStore, SessionToken, SESSION_CACHE_TTL};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
struct CachedSession {
    user_id: Option<UserId>,
    expiry: DateTime<Utc>,
}

/// Positive cache in front of a backing session store.
///
/// Entries live for [`SESSION_CACHE_TTL`] independently of the backing
/// store's TTL. Lookups consult the cache first and fall through on miss or
/// expiry; store errors are never cached.
pub struct CachedSessionStore {
    storage: Arc<dyn SessionStore>,
    cache: DashMap<SessionToken, CachedSession>,
}

impl CachedSessionStore {
    /// Wrap a backing store.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStore>) -> Self {
        Self {
            storage,
            cache: DashMap::new(),
        }
    }

    fn remember(&self, token: SessionToken, user_id: Option<UserId>) {
        self.cache.insert(
            token,
            CachedSession {
                user_id,
                expiry: Utc::now()
                    + chrono::Duration::from_std(SESSION_CACHE_TTL)
                        .unwrap_or_else(|_| chrono::Duration::zero()),
            },
        );
    }
}

#[async_trait]
impl SessionStore for CachedSessionStore {
    async fn create_session(&self) -> Result<SessionToken, SessionError> {
        let token = self.storage.create_session().await?;
        self.remember(token, None);
        Ok(token)
    }

    async fn change_session(
        &self,
        token: SessionToken,
        user_id: Option<UserId>,
    ) -> Result<(), SessionError> {
        self.storage.change_session(token, user_id).await?;
        self.remember(token, user_id);
        Ok(())
    }

    async fn query_session(&self, token: SessionToken) -> Result<Option<UserId>, SessionError> {
        if let Some(cached) = self.cache.get(&token) {
            if cached.expiry > Utc::now() {
                return Ok(cached.user_id);
            }
            drop(cached);
            self.cache.remove(&token);
        }

        let user_id = self.storage.query_session(token).await?;
        self.remember(token, user_id);
        Ok(user_id)
    }
}
