//! Single-session model gating privileged operations.

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::{
    core::lock,
    error::{CanteenError, CanteenResult},
    types::{Role, UserId},
};

/// Authenticated identity, or nobody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Session {
    /// Nobody is logged in.
    #[default]
    Anonymous,
    /// A user is logged in.
    Authenticated {
        /// Logged-in user.
        user_id: UserId,
        /// Role captured at login.
        role: Role,
    },
}

impl Session {
    /// Replaces `Anonymous` with an authenticated session.
    pub fn login(&mut self, user_id: UserId, role: Role) -> CanteenResult<()> {
        if let Self::Authenticated { .. } = self {
            return Err(CanteenError::AlreadyLoggedIn);
        }
        *self = Self::Authenticated { user_id, role };
        Ok(())
    }

    /// Resets to `Anonymous`. Idempotent.
    pub fn logout(&mut self) {
        *self = Self::Anonymous;
    }

    /// Logged-in user id.
    pub fn current_user_id(&self) -> CanteenResult<UserId> {
        match self {
            Self::Authenticated { user_id, .. } => Ok(*user_id),
            Self::Anonymous => Err(CanteenError::NoActiveSession),
        }
    }

    /// False when anonymous.
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::Authenticated {
                role: Role::Admin,
                ..
            }
        )
    }

    /// True when a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Shared handle to the one process-wide [`Session`].
///
/// Cloned into every controller at construction.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    /// Anonymous session.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`Session::login`].
    pub fn login(&self, user_id: UserId, role: Role) -> CanteenResult<()> {
        lock(&self.inner).login(user_id, role)?;
        info!(user_id, role = role.as_str(), "session started");
        Ok(())
    }

    /// See [`Session::logout`].
    pub fn logout(&self) {
        let mut session = lock(&self.inner);
        if let Session::Authenticated { user_id, .. } = *session {
            info!(user_id, "session ended");
        }
        session.logout();
    }

    /// See [`Session::current_user_id`].
    pub fn current_user_id(&self) -> CanteenResult<UserId> {
        lock(&self.inner).current_user_id()
    }

    /// See [`Session::is_admin`].
    pub fn is_admin(&self) -> bool {
        lock(&self.inner).is_admin()
    }

    /// See [`Session::is_authenticated`].
    pub fn is_authenticated(&self) -> bool {
        lock(&self.inner).is_authenticated()
    }

    /// Copy of the current value.
    pub fn snapshot(&self) -> Session {
        *lock(&self.inner)
    }

    /// Current user id, failing with `Unauthorized` unless the role is admin.
    pub fn require_admin(&self, action: &str) -> CanteenResult<UserId> {
        let session = self.snapshot();
        let user_id = session.current_user_id()?;
        if !session.is_admin() {
            return Err(CanteenError::unauthorized(action));
        }
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_login_is_rejected() {
        let mut session = Session::default();
        session.login(1, Role::User).unwrap();
        assert!(matches!(session.login(2, Role::Admin), Err(CanteenError::AlreadyLoggedIn)));
        assert_eq!(session.current_user_id().unwrap(), 1);
    }

    #[test]
    fn logout_is_idempotent() {
        let handle = SessionHandle::new();
        handle.login(7, Role::Admin).unwrap();
        handle.logout();
        handle.logout();
        assert_eq!(handle.snapshot(), Session::Anonymous);
        assert!(matches!(handle.current_user_id(), Err(CanteenError::NoActiveSession)));
        assert!(!handle.is_admin());
    }

    #[test]
    fn require_admin_distinguishes_anonymous_and_user() {
        let handle = SessionHandle::new();
        assert!(matches!(handle.require_admin("x"), Err(CanteenError::NoActiveSession)));
        handle.login(3, Role::User).unwrap();
        assert!(matches!(handle.require_admin("x"), Err(CanteenError::Unauthorized(_))));
    }
}
