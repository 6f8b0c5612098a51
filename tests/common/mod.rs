#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use canteen::{
    app::App,
    config::{AdminBootstrap, AppConfig},
    credential::Credentials,
    error::CanteenResult,
    persist::{MemoryRepository, Repository},
    present::{Presenter, Screen, ScreenEvent},
    types::MenuState,
};

#[derive(Default)]
pub struct RecordingPresenter {
    seen: Mutex<Vec<ScreenEvent>>,
}

impl RecordingPresenter {
    pub fn events(&self) -> Vec<ScreenEvent> {
        self.seen.lock().expect("lock").clone()
    }

    pub fn clear(&self) {
        self.seen.lock().expect("lock").clear();
    }

    pub fn screens(&self) -> Vec<(MenuState, Screen)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ScreenEvent::Rendered { state, screen } => Some((state, screen)),
                ScreenEvent::Closed => None,
            })
            .collect()
    }

    pub fn last_error(&self) -> Option<String> {
        self.screens().into_iter().rev().find_map(|(_, s)| match s {
            Screen::Error(msg) => Some(msg),
            _ => None,
        })
    }

    pub fn last_success(&self) -> Option<String> {
        self.screens().into_iter().rev().find_map(|(_, s)| match s {
            Screen::Success(msg) => Some(msg),
            _ => None,
        })
    }

    pub fn last_screen(&self) -> Option<Screen> {
        self.screens().pop().map(|(_, s)| s)
    }
}

impl Presenter for RecordingPresenter {
    fn render_screen(&self, state: MenuState, screen: Screen) {
        self.seen
            .lock()
            .expect("lock")
            .push(ScreenEvent::Rendered { state, screen });
    }

    fn close_active_screen(&self) {
        self.seen.lock().expect("lock").push(ScreenEvent::Closed);
    }
}

/// Reversible stand-in so tests do not pay for Argon2.
pub struct PlainCredentials;

impl Credentials for PlainCredentials {
    fn hash(&self, password: &str) -> CanteenResult<String> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        hash.strip_prefix("plain:") == Some(password)
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn admin_config() -> AppConfig {
    AppConfig {
        admin: Some(AdminBootstrap {
            name: "root".to_string(),
            password: "secret".to_string(),
            email: "root@canteen.local".to_string(),
        }),
        ..AppConfig::default()
    }
}

pub fn test_app_with(repo: Arc<dyn Repository>) -> (App, Arc<RecordingPresenter>) {
    let presenter = Arc::new(RecordingPresenter::default());
    let app = App::build(
        &admin_config(),
        repo,
        presenter.clone(),
        Arc::new(PlainCredentials),
    )
    .expect("build app");
    app.start();
    (app, presenter)
}

pub fn test_app() -> (App, Arc<RecordingPresenter>) {
    test_app_with(Arc::new(MemoryRepository::new()))
}
