//! Session identities.
//!
//! A session is an opaque 24-byte token minted on first contact and carried
//! by every request. Sessions may later be bound to a user id; most stay
//! anonymous. The backing store persists sessions across restarts and is
//! fronted by a short positive cache.

mod cache;
mod fs;
mod memory;

pub use cache::CachedSessionStore;
pub use fs::FsSessionStore;
pub use memory::MemorySessionStore;

use crate::gameserver::UserId;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Advisory time-to-live of a session. Stores need not expire rows eagerly
/// but must reject rows older than this on query.
pub const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// How long a positive cache entry stays valid. Kept well under
/// [`SESSION_TTL`].
pub const SESSION_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// An opaque session token: 24 random bytes. The wire form is unpadded
/// base64; `Display` shows a short prefix for logs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken([u8; 24]);

impl SessionToken {
    /// Mint a token from the OS entropy source.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 24];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// The full wire form: unpadded base64.
    #[must_use]
    pub fn encode(&self) -> String {
        STANDARD_NO_PAD.encode(self.0)
    }

    /// Lowercase hex of the token bytes, used for on-disk filenames.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..8])
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({self})")
    }
}

/// Error returned when a session token fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid session token")]
pub struct InvalidSessionToken;

impl FromStr for SessionToken {
    type Err = InvalidSessionToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = STANDARD_NO_PAD.decode(s).map_err(|_| InvalidSessionToken)?;
        let bytes: [u8; 24] = bytes.try_into().map_err(|_| InvalidSessionToken)?;
        Ok(Self(bytes))
    }
}

impl Serialize for SessionToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for SessionToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A caller's identity: the session token plus the optionally bound user.
/// Two authorizations are equal iff their session tokens are equal.
#[derive(Debug, Clone, Serialize)]
pub struct Authorization {
    #[serde(skip)]
    pub session: SessionToken,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl Authorization {
    /// An authorization bound to a user.
    #[must_use]
    pub fn new(session: SessionToken, user_id: UserId) -> Self {
        Self {
            session,
            user_id: Some(user_id),
        }
    }

    /// An anonymous authorization.
    #[must_use]
    pub fn anonymous(session: SessionToken) -> Self {
        Self {
            session,
            user_id: None,
        }
    }
}

impl PartialEq for Authorization {
    fn eq(&self, other: &Self) -> bool {
        self.session == other.session
    }
}

impl Eq for Authorization {}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.user_id {
            Some(user_id) => write!(f, "{}[{user_id}]", self.session),
            None => write!(f, "{}[?]", self.session),
        }
    }
}

/// Errors surfaced by session stores.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,
    #[error("session storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SessionError {
    pub(crate) fn storage<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Persists and retrieves session identities. A session may or may not be
/// bound to a user. Implementations must be safe for concurrent use and
/// idempotent under retry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Mint a new anonymous session.
    async fn create_session(&self) -> Result<SessionToken, SessionError>;

    /// Rebind the session to a user (or back to anonymous).
    async fn change_session(
        &self,
        token: SessionToken,
        user_id: Option<UserId>,
    ) -> Result<(), SessionError>;

    /// Resolve the session's user. `Ok(None)` means a valid anonymous
    /// session; an unknown or expired session is [`SessionError::NotFound`].
    async fn query_session(&self, token: SessionToken) -> Result<Option<UserId>, SessionError>;
}
