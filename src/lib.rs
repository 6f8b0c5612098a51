//! Canteen meal catalog with an event-driven menu and session core.
//!
//! # Examples
//!
//! Synchronous usage with the in-memory repository:
//! ```
//! use std::sync::Arc;
//!
//! use canteen::{
//!     app::App,
//!     config::AppConfig,
//!     present::ChannelPresenter,
//!     runtime::events::{EventName, Payload},
//!     types::MenuState,
//! };
//!
//! let presenter = Arc::new(ChannelPresenter::new(64));
//! let app = App::open(&AppConfig::default(), presenter).expect("open");
//! app.start();
//! app.publish(EventName::Register, Payload::strings(["alice", "pw1", "a@x.com"]))
//!     .expect("register");
//! app.publish(EventName::Login, Payload::strings(["alice", "pw1"]))
//!     .expect("login");
//! assert_eq!(app.menu_state(), MenuState::Main);
//! ```
//!
//! Runtime usage with a SQLite catalog:
//! ```no_run
//! use std::sync::Arc;
//!
//! use canteen::{
//!     app::App,
//!     config::AppConfig,
//!     present::ChannelPresenter,
//!     runtime::{
//!         events::{EventName, Payload},
//!         handle::spawn_canteen,
//!     },
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = AppConfig {
//!     database_path: Some("canteen.db".into()),
//!     ..AppConfig::default()
//! };
//! let presenter = Arc::new(ChannelPresenter::new(config.runtime.screen_buffer));
//! let screens = presenter.sender();
//! let app = App::open(&config, presenter).expect("open");
//! let handle = spawn_canteen(app, screens, &config.runtime);
//! handle.publish(EventName::ShowMeals, Payload::None).await.expect("publish");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![warn(missing_docs)]

/// Allergen codes and their display names.
pub mod allergen;
/// Application wiring.
pub mod app;
/// TOML settings.
pub mod config;
/// Bus handlers per menu.
pub mod controller;
/// In-memory catalog store and index helpers.
pub mod core;
/// Password hashing.
pub mod credential;
/// Error types.
pub mod error;
/// Tracing setup.
pub mod logging;
/// Catalog records, drafts and patches.
pub mod meal;
/// Repository abstraction and SQLite implementation.
pub mod persist;
/// Screens and the presenter boundary.
pub mod present;
/// Sorting, filtering and rating medians.
pub mod query;
/// Event bus, session, menu machine and async handle.
pub mod runtime;
/// Shared primitive types and enums.
pub mod types;
