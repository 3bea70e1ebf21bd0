use crate::gameserver::UserId;
use crate::session::{SessionError, SessionStore, SessionToken, SESSION_TTL};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct SessionRecord {
    user_id: Option<UserId>,
    /// Unix seconds after which the session is dead.
    expiry: i64,
}

/// Session store backed by one JSON file per token under
/// `{state_dir}/v1/sessions/`. Filenames are the hex form of the token, so
/// minting retries on the (astronomically unlikely) filename collision via
/// create-new semantics.
pub struct FsSessionStore {
    dir: PathBuf,
}

impl FsSessionStore {
    /// Open (creating if needed) the store under the given state directory.
    pub async fn open(state_dir: &Path) -> Result<Self, SessionError> {
        let dir = state_dir.join("v1").join("sessions");
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(SessionError::storage)?;
        Ok(Self { dir })
    }

    fn path_for(&self, token: SessionToken) -> PathBuf {
        self.dir.join(format!("{}.json", token.to_hex()))
    }

    async fn read_record(&self, token: SessionToken) -> Result<SessionRecord, SessionError> {
        let bytes = match tokio::fs::read(self.path_for(token)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(SessionError::NotFound);
            }
            Err(err) => return Err(SessionError::storage(err)),
        };
        serde_json::from_slice(&bytes).map_err(SessionError::storage)
    }

    async fn write_record(
        &self,
        token: SessionToken,
        record: SessionRecord,
    ) -> Result<(), SessionError> {
        let bytes = serde_json::to_vec(&record).map_err(SessionError::storage)?;
        tokio::fs::write(self.path_for(token), bytes)
            .await
            .map_err(SessionError::storage)
    }
}

#[async_trait]
impl SessionStore for FsSessionStore {
    async fn create_session(&self) -> Result<SessionToken, SessionError> {
        let expiry = (Utc::now()
            + chrono::Duration::from_std(SESSION_TTL).unwrap_or_else(|_| chrono::Duration::zero()))
        .timestamp();
        loop {
            let token = SessionToken::generate();
            let mut open = tokio::fs::OpenOptions::new();
            open.write(true).create_new(true);
            let mut file = match open.open(self.path_for(token)).await {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(SessionError::storage(err)),
            };
            let record = SessionRecord {
                user_id: None,
                expiry,
            };
            let bytes = serde_json::to_vec(&record).map_err(SessionError::storage)?;
            file.write_all(&bytes)
                .await
                .map_err(SessionError::storage)?;
            return Ok(token);
        }
    }

    async fn change_session(
        &self,
        token: SessionToken,
        user_id: Option<UserId>,
    ) -> Result<(), SessionError> {
        let mut record = self.read_record(token).await?;
        record.user_id = user_id;
        self.write_record(token, record).await
    }

    async fn query_session(&self, token: SessionToken) -> Result<Option<UserId>, SessionError> {
        let record = self.read_record(token).await?;
        if record.expiry < Utc::now().timestamp() {
            return Err(SessionError::NotFound);
        }
        Ok(record.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::open(dir.path()).await.unwrap();

        let token = store.create_session().await.unwrap();
        assert_eq!(store.query_session(token).await.unwrap(), None);

        let user = UserId::generate();
        store.change_session(token, Some(user)).await.unwrap();
        assert_eq!(store.query_session(token).await.unwrap(), Some(user));

        // A second store over the same directory sees the same session.
        let reopened = FsSessionStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.query_session(token).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::open(dir.path()).await.unwrap();
        let err = store
            .query_session(SessionToken::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound));
    }

    #[tokio::test]
    async fn change_on_unknown_token_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::open(dir.path()).await.unwrap();
        let err = store
            .change_session(SessionToken::generate(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound));
    }

    #[tokio::test]
    async fn expired_row_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::open(dir.path()).await.unwrap();
        let token = store.create_session().await.unwrap();

        // Rewrite the record with an expiry in the past.
        store
            .write_record(
                token,
                SessionRecord {
                    user_id: None,
                    expiry: Utc::now().timestamp() - 10,
                },
            )
            .await
            .unwrap();

        let err = store.query_session(token).await.unwrap_err();
        assert!(matches!(err, SessionError::NotFound));
    }

    #[tokio::test]
    async fn files_live_under_v1_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::open(dir.path()).await.unwrap();
        let token = store.create_session().await.unwrap();

        let expected = dir
            .path()
            .join("v1")
            .join("sessions")
            .join(format!("{}.json", token.to_hex()));
        assert!(expected.exists());
    }
}
