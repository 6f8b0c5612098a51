//! Menu state machine driven by `SWITCH_MENU` events.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use tracing::{info, warn};

use crate::{
    core::lock,
    error::{BusError, CanteenError},
    present::{Presenter, Screen},
    types::MenuState,
};

use super::{
    bus::EventBus,
    events::{EventName, Payload},
    session::SessionHandle,
};

/// Tracks the current menu and asks the presenter to show it.
pub struct MenuStateMachine {
    current: Mutex<MenuState>,
    exited: AtomicBool,
    session: SessionHandle,
    presenter: Arc<dyn Presenter>,
}

impl MenuStateMachine {
    /// Machine in [`MenuState::LoggedOut`].
    pub fn new(session: SessionHandle, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            current: Mutex::new(MenuState::LoggedOut),
            exited: AtomicBool::new(false),
            session,
            presenter,
        }
    }

    /// Subscribes menu switching, message screens and exit.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) {
        let this = Arc::clone(self);
        bus.subscribe(EventName::SwitchMenu, move |bus, payload| {
            let ordinal = payload.expect_int(EventName::SwitchMenu)?;
            match MenuState::from_ordinal(ordinal) {
                Some(target) => this.transition(bus, target),
                None => {
                    warn!(ordinal, "switch to unknown menu");
                    bus.publish(
                        EventName::ShowErrorScreen,
                        Payload::strings([format!("Unknown menu {ordinal}.")]),
                    )
                }
            }
        });

        let this = Arc::clone(self);
        bus.subscribe(EventName::ShowErrorScreen, move |_, payload| {
            let lines = payload.expect_strings(EventName::ShowErrorScreen)?;
            this.presenter
                .render_screen(this.current(), Screen::Error(lines.join("\n")));
            Ok(())
        });

        let this = Arc::clone(self);
        bus.subscribe(EventName::ShowSuccessScreen, move |_, payload| {
            let lines = payload.expect_strings(EventName::ShowSuccessScreen)?;
            this.presenter
                .render_screen(this.current(), Screen::Success(lines.join("\n")));
            Ok(())
        });

        let this = Arc::clone(self);
        bus.subscribe(EventName::Exit, move |_, payload| {
            payload.expect_none(EventName::Exit)?;
            this.exit();
            Ok(())
        });
    }

    /// Renders the entry screen of the current state.
    pub fn start(&self) {
        self.presenter
            .render_screen(self.current(), Screen::Menu(self.current()));
    }

    /// Current menu.
    pub fn current(&self) -> MenuState {
        *lock(&self.current)
    }

    /// True once an exit was requested.
    pub fn is_exited(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }

    /// Moves to `target`, or back to `LoggedOut` when nobody is logged in.
    pub fn transition(&self, bus: &EventBus, target: MenuState) -> Result<(), BusError> {
        if target != MenuState::LoggedOut && !self.session.is_authenticated() {
            warn!(?target, "menu requires a session");
            self.enter(MenuState::LoggedOut);
            return bus.publish(
                EventName::ShowErrorScreen,
                Payload::strings([CanteenError::NoActiveSession.user_message()]),
            );
        }
        self.enter(target);
        Ok(())
    }

    fn enter(&self, target: MenuState) {
        self.presenter.close_active_screen();
        let from = std::mem::replace(&mut *lock(&self.current), target);
        info!(?from, to = ?target, "menu transition");
        self.presenter.render_screen(target, Screen::Menu(target));
    }

    fn exit(&self) {
        self.session.logout();
        self.presenter.close_active_screen();
        self.exited.store(true, Ordering::SeqCst);
        info!("exit requested");
    }
}
