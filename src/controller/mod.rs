//! Per-domain handler registries.
//!
//! Each controller binds a fixed route table at attach time. Actions return
//! [`CanteenResult`]; the bus handlers turn those into success or error
//! screens and only ever return [`BusError`] upward.

pub mod login;
pub mod meal;
pub mod review;
pub mod user;
pub mod weekly;

use std::sync::Arc;

use tracing::{error, warn};

use crate::{
    credential::Credentials,
    error::{BusError, CanteenError, CanteenResult},
    persist::Repository,
    present::Presenter,
    runtime::{
        bus::EventBus,
        events::{EventName, Payload},
        session::SessionHandle,
    },
    types::MenuState,
};

/// Collaborators injected into every controller.
#[derive(Clone)]
pub struct Deps {
    /// Catalog persistence.
    pub repo: Arc<dyn Repository>,
    /// The process-wide session.
    pub session: SessionHandle,
    /// Screen output.
    pub presenter: Arc<dyn Presenter>,
    /// Password hashing.
    pub credentials: Arc<dyn Credentials>,
}

/// Bus entry point of a controller action.
pub type Action<C> = fn(&C, &EventBus, &Payload) -> Result<(), BusError>;

pub(crate) fn attach_routes<C>(ctl: &Arc<C>, bus: &EventBus, routes: &[(EventName, Action<C>)])
where
    C: Send + Sync + 'static,
{
    for (name, action) in routes.iter().copied() {
        let ctl = Arc::clone(ctl);
        bus.subscribe(name, move |bus, payload| action(&ctl, bus, payload));
    }
}

/// Publishes the outcome of `event`'s action.
///
/// `Ok(Some(msg))` shows a success screen, `Ok(None)` means the action
/// rendered its own view. Failures show an error screen; a missing session
/// additionally sends the menu back to `LoggedOut`.
pub(crate) fn report(
    bus: &EventBus,
    event: EventName,
    outcome: CanteenResult<Option<String>>,
) -> Result<(), BusError> {
    match outcome {
        Ok(Some(message)) => bus.publish(EventName::ShowSuccessScreen, Payload::strings([message])),
        Ok(None) => Ok(()),
        Err(err) => report_error(bus, event, err),
    }
}

pub(crate) fn report_error(bus: &EventBus, event: EventName, err: CanteenError) -> Result<(), BusError> {
    match &err {
        CanteenError::Repository(inner) => error!(event = ?event, err = %inner, "repository failure"),
        CanteenError::Credential(detail) => error!(event = ?event, err = %detail, "credential failure"),
        other => warn!(event = ?event, err = %other, "action rejected"),
    }
    if matches!(err, CanteenError::NoActiveSession) {
        bus.publish(
            EventName::SwitchMenu,
            Payload::Int(MenuState::LoggedOut.ordinal()),
        )?;
    }
    bus.publish(EventName::ShowErrorScreen, Payload::strings([err.user_message()]))
}
