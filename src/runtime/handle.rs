//! Async front end that serializes events onto one task.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

use crate::{app::App, error::BusError, present::ScreenEvent, types::MenuState};

use super::events::{Event, EventName, Payload};

/// Failures surfaced by [`CanteenHandle`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The event was rejected or a handler failed.
    #[error(transparent)]
    Bus(#[from] BusError),
    /// The blocking dispatch task panicked or was cancelled.
    #[error("dispatch task failed: {0}")]
    Join(String),
    /// The runtime loop has stopped.
    #[error("canteen runtime is closed")]
    ChannelClosed,
}

/// `[runtime]` table of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Commands buffered before `publish` waits.
    pub command_queue_bound: usize,
    /// Screen events buffered per subscriber.
    pub screen_buffer: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 64,
            screen_buffer: 256,
        }
    }
}

/// Cloneable front end of a running canteen task.
pub struct CanteenHandle {
    cmd_tx: mpsc::Sender<Command>,
    screens_tx: broadcast::Sender<ScreenEvent>,
}

impl Clone for CanteenHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            screens_tx: self.screens_tx.clone(),
        }
    }
}

enum Command {
    Publish {
        event: Event,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Menu {
        resp: oneshot::Sender<MenuState>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Moves `app` onto a task that handles one event at a time.
///
/// `screens_tx` is the channel the app's presenter writes to; the handle
/// hands out receivers of it. The loop ends after `EXIT` or `shutdown`.
pub fn spawn_canteen(
    app: App,
    screens_tx: broadcast::Sender<ScreenEvent>,
    config: &RuntimeConfig,
) -> CanteenHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));

    tokio::spawn(async move {
        let app = Arc::new(app);
        app.start();
        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &app).await {
                break;
            }
        }
        debug!("canteen runtime stopped");
    });

    CanteenHandle { cmd_tx, screens_tx }
}

impl CanteenHandle {
    /// New receiver of presenter output.
    pub fn subscribe(&self) -> broadcast::Receiver<ScreenEvent> {
        self.screens_tx.subscribe()
    }

    /// Publishes an event and waits until every handler ran.
    pub async fn publish(&self, name: EventName, payload: Payload) -> Result<(), RuntimeError> {
        let event = Event::new(name, payload)?;
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Publish { event, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Current menu state as seen by the runtime.
    pub async fn menu_state(&self) -> Result<MenuState, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Menu { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Logs out and stops the loop for every clone of the handle.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

async fn handle_command(cmd: Command, app: &Arc<App>) -> bool {
    match cmd {
        Command::Publish { event, resp } => {
            let worker = Arc::clone(app);
            let res = match tokio::task::spawn_blocking(move || worker.publish_event(&event)).await {
                Ok(inner) => inner.map_err(RuntimeError::from),
                Err(e) => Err(RuntimeError::Join(e.to_string())),
            };
            let exited = app.is_exited();
            let _ = resp.send(res);
            if exited {
                info!("exit handled, closing runtime");
            }
            return exited;
        }
        Command::Menu { resp } => {
            let _ = resp.send(app.menu_state());
        }
        Command::Shutdown { resp } => {
            app.session().logout();
            let _ = resp.send(());
            return true;
        }
    }

    false
}
