//! Login, logout and registration.

use std::sync::Arc;

use tracing::info;

use crate::{
    error::{BusError, CanteenError, CanteenResult},
    meal::{AccountForm, User, UserDraft},
    runtime::{
        bus::EventBus,
        events::{EventName, Payload},
    },
    types::{MenuState, Role},
};

use super::{Action, Deps, attach_routes, report, report_error};

/// Account entry points available while logged out.
pub struct LoginController {
    deps: Deps,
}

impl LoginController {
    const ROUTES: &'static [(EventName, Action<Self>)] = &[
        (EventName::Login, Self::on_login),
        (EventName::Logout, Self::on_logout),
        (EventName::Register, Self::on_register),
    ];

    /// Controller over `deps`.
    pub fn new(deps: Deps) -> Self {
        Self { deps }
    }

    /// Binds the route table.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) {
        attach_routes(self, bus, Self::ROUTES);
    }

    /// Checks `[username, password]` and opens the session.
    pub fn login(&self, fields: &[String]) -> CanteenResult<User> {
        let [name, password] = fields else {
            return Err(CanteenError::validation("username and password are required"));
        };
        let user = self
            .deps
            .repo
            .find_user_by_name(name.trim())?
            .ok_or(CanteenError::InvalidCredentials)?;
        if !self.deps.credentials.verify(password, &user.password_hash) {
            return Err(CanteenError::InvalidCredentials);
        }
        self.deps.session.login(user.id, user.role)?;
        Ok(user)
    }

    /// Creates a regular account from `[username, password, email]`.
    pub fn register(&self, fields: &[String]) -> CanteenResult<User> {
        let form = AccountForm::parse(fields)?;
        if self.deps.repo.find_user_by_name(&form.name)?.is_some() {
            return Err(CanteenError::AlreadyExists {
                entity: "user",
                key: form.name,
            });
        }
        let password_hash = self.deps.credentials.hash(&form.password)?;
        let user = self.deps.repo.insert_user(UserDraft {
            name: form.name,
            email: form.email,
            password_hash,
            role: Role::User,
        })?;
        info!(user_id = user.id, name = %user.name, "user registered");
        Ok(user)
    }

    fn on_login(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let fields = payload.expect_strings(EventName::Login)?;
        match self.login(fields) {
            Ok(_) => bus.publish(EventName::SwitchMenu, Payload::Int(MenuState::Main.ordinal())),
            Err(err) => report_error(bus, EventName::Login, err),
        }
    }

    fn on_logout(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        payload.expect_none(EventName::Logout)?;
        self.deps.session.logout();
        bus.publish(
            EventName::SwitchMenu,
            Payload::Int(MenuState::LoggedOut.ordinal()),
        )
    }

    fn on_register(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let fields = payload.expect_strings(EventName::Register)?;
        let outcome = self
            .register(fields)
            .map(|user| Some(format!("Welcome, {}! You can log in now.", user.name)));
        report(bus, EventName::Register, outcome)
    }
}
