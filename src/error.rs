//! Error taxonomy shared by controllers, the bus and repositories.

use thiserror::Error;

use crate::runtime::events::{EventName, PayloadKind};

/// Failure reported by a [`crate::persist::Repository`].
#[derive(Debug, Error)]
pub enum RepoError {
    /// Referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Record kind.
        entity: &'static str,
        /// Missing id.
        id: i64,
    },
    /// Uniqueness constraint violated.
    #[error("{entity} '{key}' already exists")]
    AlreadyExists {
        /// Record kind.
        entity: &'static str,
        /// Conflicting key.
        key: String,
    },
    /// Storage-layer failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

/// Result alias for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Recoverable domain failure raised by a controller action.
#[derive(Debug, Error)]
pub enum CanteenError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),
    /// Referenced entity absent.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Record kind.
        entity: &'static str,
        /// Missing id.
        id: i64,
    },
    /// Uniqueness violation.
    #[error("{entity} '{key}' already exists")]
    AlreadyExists {
        /// Record kind.
        entity: &'static str,
        /// Conflicting key.
        key: String,
    },
    /// Role or ownership check failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Action needs a logged-in user.
    #[error("no active session")]
    NoActiveSession,
    /// Login attempted while a session is active.
    #[error("a user is already logged in")]
    AlreadyLoggedIn,
    /// Username/password pair rejected.
    #[error("invalid username or password")]
    InvalidCredentials,
    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    Credential(String),
    /// Storage-layer failure.
    #[error(transparent)]
    Repository(RepoError),
}

impl From<RepoError> for CanteenError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::AlreadyExists { entity, key } => Self::AlreadyExists { entity, key },
            other => Self::Repository(other),
        }
    }
}

impl CanteenError {
    /// Shorthand for [`CanteenError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for [`CanteenError::Unauthorized`].
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Text shown on the error screen.
    ///
    /// Storage errors never leak their low-level text.
    pub fn user_message(&self) -> String {
        match self {
            Self::Repository(_) => {
                "Something went wrong while accessing the catalog. Please try again.".to_string()
            }
            Self::Credential(_) => "Your password could not be processed. Please try again.".to_string(),
            Self::Unauthorized(what) => format!("You are not allowed to {what}."),
            Self::NoActiveSession => "Please log in first.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result alias for controller actions.
pub type CanteenResult<T> = Result<T, CanteenError>;

/// Wiring failure on the event bus. Never converted into a user message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// Event published (or consumed) with the wrong payload variant.
    #[error("payload contract violation on {event:?}: expected {expected:?}, got {actual:?}")]
    PayloadContractViolation {
        /// Offending event.
        event: EventName,
        /// Declared payload kind.
        expected: PayloadKind,
        /// Payload kind actually supplied.
        actual: PayloadKind,
    },
    /// Nested synchronous dispatch went deeper than the configured limit.
    #[error("dispatch of {event:?} exceeded nesting depth {depth}")]
    DispatchDepthExceeded {
        /// Event that would have exceeded the limit.
        event: EventName,
        /// Configured limit.
        depth: usize,
    },
}
