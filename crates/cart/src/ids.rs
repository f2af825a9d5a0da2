//! Identifiers shared by the cart, the wishlist and the wire.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Catalog product reference. Not owned by the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Wrap a catalog product uuid.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The catalog product uuid.
    #[must_use]
    pub const fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ProductId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::try_parse(value).map(Self)
    }
}

/// Locally unique line identifier, stable while the line exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(Uuid);

impl LineId {
    /// A new, time-ordered line id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Adopt an id assigned by the server.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

const MAX_SESSION_ID_LEN: usize = 128;

/// Why a string is not a usable session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionIdError {
    /// Empty or too long.
    #[error("session id must be between 1 and {MAX_SESSION_ID_LEN} characters")]
    Length,

    /// Contains something other than `[A-Za-z0-9_-]`.
    #[error("session id may only contain ASCII letters, digits, '-' and '_'")]
    InvalidCharacter,
}

/// Anonymous client token, generated once and kept for as long as local
/// storage survives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// A fresh, unguessable session id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    /// Validate a session id received from storage or a request.
    ///
    /// # Errors
    ///
    /// Returns [`SessionIdError`] when `raw` is empty, longer than 128
    /// characters, or not URL safe.
    pub fn parse(raw: impl Into<String>) -> Result<Self, SessionIdError> {
        let raw = raw.into();

        if raw.is_empty() || raw.len() > MAX_SESSION_ID_LEN {
            return Err(SessionIdError::Length);
        }

        if !raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(SessionIdError::InvalidCharacter);
        }

        Ok(Self(raw))
    }

    /// The id as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = SessionIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SessionId> for String {
    fn from(value: SessionId) -> Self {
        value.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw API token for a signed-in customer. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(**redacted**)")
    }
}

/// Who the server should resolve the cart for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    Session(SessionId),
    User(BearerToken),
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn generated_session_ids_are_valid_and_distinct() -> TestResult {
        let first = SessionId::generate();
        let second = SessionId::generate();

        assert_ne!(first, second);
        assert_eq!(SessionId::parse(first.as_str())?, first);

        Ok(())
    }

    #[test]
    fn session_ids_reject_unsafe_input() {
        assert_eq!(SessionId::parse(""), Err(SessionIdError::Length));
        assert_eq!(SessionId::parse("x".repeat(129)), Err(SessionIdError::Length));
        assert_eq!(
            SessionId::parse("a/b"),
            Err(SessionIdError::InvalidCharacter)
        );
    }

    #[test]
    fn persisted_session_ids_are_validated() {
        let decoded: Result<SessionId, _> = serde_json::from_str("\"bad id\"");

        assert!(decoded.is_err(), "invalid session id should not deserialize");
    }

    #[test]
    fn bearer_tokens_are_redacted() {
        let token = BearerToken::new("st_v1_secret");

        assert_eq!(format!("{token:?}"), "BearerToken(**redacted**)");
        assert_eq!(token.expose(), "st_v1_secret");
    }
}
