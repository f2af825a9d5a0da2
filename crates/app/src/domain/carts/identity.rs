//! Cart ownership.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::users::records::UserUuid;

/// Longest accepted anonymous session id.
pub const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionIdError {
    #[error("session id must not be empty")]
    Empty,

    #[error("session id must be at most {MAX_SESSION_ID_LEN} characters")]
    TooLong,

    #[error("session id may only contain ASCII letters, digits, '-' and '_'")]
    InvalidCharacter,
}

/// Opaque token identifying an anonymous storefront client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Validate and wrap a raw session id.
    ///
    /// # Errors
    ///
    /// Returns [`SessionIdError`] when the value is empty, too long, or carries
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn parse(raw: impl Into<String>) -> Result<Self, SessionIdError> {
        let raw = raw.into();

        if raw.is_empty() {
            return Err(SessionIdError::Empty);
        }

        if raw.len() > MAX_SESSION_ID_LEN {
            return Err(SessionIdError::TooLong);
        }

        if !raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(SessionIdError::InvalidCharacter);
        }

        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SessionId {
    type Err = SessionIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;

        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}

/// Who a cart belongs to. Exactly one owner per cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartIdentity {
    User(UserUuid),
    Session(SessionId),
}

impl CartIdentity {
    pub(crate) fn user_uuid(&self) -> Option<uuid::Uuid> {
        match self {
            Self::User(user) => Some(user.into_uuid()),
            Self::Session(_) => None,
        }
    }

    pub(crate) fn session_id(&self) -> Option<&str> {
        match self {
            Self::User(_) => None,
            Self::Session(session) => Some(session.as_str()),
        }
    }
}

impl fmt::Display for CartIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(user) => write!(f, "user:{user}"),
            Self::Session(session) => write!(f, "session:{session}"),
        }
    }
}
