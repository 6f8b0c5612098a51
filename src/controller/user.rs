//! Account maintenance and user administration.

use std::sync::Arc;

use tracing::info;

use crate::{
    allergen::{self, AllergenSet},
    error::{BusError, CanteenError, CanteenResult},
    meal::{AccountForm, User, UserPatch},
    present::{Screen, UserRow},
    runtime::{
        bus::EventBus,
        events::{EventName, Payload},
    },
    types::{MenuState, Role, UserId},
};

use super::{Action, Deps, attach_routes, report};

/// Handlers of the user menu.
pub struct UserController {
    deps: Deps,
}

impl UserController {
    const ROUTES: &'static [(EventName, Action<Self>)] = &[
        (EventName::ShowUsers, Self::on_show_users),
        (EventName::EditUserData, Self::on_edit_user_data),
        (EventName::EditUserAllergies, Self::on_edit_allergies),
        (EventName::DeleteUser, Self::on_delete_user),
        (EventName::ToggleAdmin, Self::on_toggle_admin),
    ];

    /// Controller over `deps`.
    pub fn new(deps: Deps) -> Self {
        Self { deps }
    }

    /// Binds the route table.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) {
        attach_routes(self, bus, Self::ROUTES);
    }

    /// Every account; admin only.
    pub fn users(&self) -> CanteenResult<Vec<User>> {
        self.deps.session.require_admin("list users")?;
        Ok(self.deps.repo.list_users()?)
    }

    /// Replaces name, password and email of the current user.
    pub fn edit_user_data(&self, fields: &[String]) -> CanteenResult<User> {
        let user_id = self.deps.session.current_user_id()?;
        let form = AccountForm::parse(fields)?;
        let password_hash = self.deps.credentials.hash(&form.password)?;
        let user = self.deps.repo.update_user(
            user_id,
            &UserPatch {
                name: Some(form.name),
                email: Some(form.email),
                password_hash: Some(password_hash),
                ..UserPatch::default()
            },
        )?;
        info!(user_id, "account data changed");
        Ok(user)
    }

    /// Replaces the current user's avoided allergens.
    pub fn edit_allergies(&self, entries: &[String]) -> CanteenResult<AllergenSet> {
        let user_id = self.deps.session.current_user_id()?;
        let mut avoided = AllergenSet::new();
        for entry in entries {
            avoided.extend(allergen::parse_allergens(entry)?);
        }
        let user = self.deps.repo.update_user(
            user_id,
            &UserPatch {
                allergies: Some(avoided),
                ..UserPatch::default()
            },
        )?;
        info!(user_id, allergies = %allergen::encode(&user.allergies), "allergies changed");
        Ok(user.allergies)
    }

    /// Deletes another account; admin only.
    pub fn delete_user(&self, id: UserId) -> CanteenResult<User> {
        let admin_id = self.deps.session.require_admin("delete users")?;
        if id == admin_id {
            return Err(CanteenError::validation("you cannot delete your own account while logged in"));
        }
        let user = self.deps.repo.get_user(id)?;
        self.deps.repo.delete_user(id)?;
        info!(user_id = id, by = admin_id, "user deleted");
        Ok(user)
    }

    /// Flips another account between user and admin; admin only.
    pub fn toggle_admin(&self, id: UserId) -> CanteenResult<User> {
        let admin_id = self.deps.session.require_admin("change roles")?;
        if id == admin_id {
            return Err(CanteenError::validation("you cannot change your own role"));
        }
        let user = self.deps.repo.get_user(id)?;
        let role = match user.role {
            Role::Admin => Role::User,
            Role::User => Role::Admin,
        };
        let user = self.deps.repo.update_user(
            id,
            &UserPatch {
                role: Some(role),
                ..UserPatch::default()
            },
        )?;
        info!(user_id = id, role = role.as_str(), "role changed");
        Ok(user)
    }

    fn on_show_users(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        payload.expect_none(EventName::ShowUsers)?;
        let outcome = self.users().map(|users| {
            let rows = users.iter().map(UserRow::from).collect();
            self.deps
                .presenter
                .render_screen(MenuState::UserMenu, Screen::UserTable(rows));
            None
        });
        report(bus, EventName::ShowUsers, outcome)
    }

    fn on_edit_user_data(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let fields = payload.expect_strings(EventName::EditUserData)?;
        let outcome = self
            .edit_user_data(fields)
            .map(|_| Some("Your account was updated.".to_string()));
        report(bus, EventName::EditUserData, outcome)
    }

    fn on_edit_allergies(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let entries = payload.expect_strings(EventName::EditUserAllergies)?;
        let outcome = self.edit_allergies(entries).map(|avoided| {
            Some(if avoided.is_empty() {
                "No allergies saved.".to_string()
            } else {
                format!("Saved allergies: {}.", allergen::describe(&avoided))
            })
        });
        report(bus, EventName::EditUserAllergies, outcome)
    }

    fn on_delete_user(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let id = payload.expect_int(EventName::DeleteUser)?;
        let outcome = self
            .delete_user(id)
            .map(|user| Some(format!("User '{}' deleted.", user.name)));
        report(bus, EventName::DeleteUser, outcome)
    }

    fn on_toggle_admin(&self, bus: &EventBus, payload: &Payload) -> Result<(), BusError> {
        let id = payload.expect_int(EventName::ToggleAdmin)?;
        let outcome = self
            .toggle_admin(id)
            .map(|user| Some(format!("User '{}' is now {}.", user.name, user.role.as_str())));
        report(bus, EventName::ToggleAdmin, outcome)
    }
}
