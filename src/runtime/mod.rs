//! Event dispatch, session state and the async command loop.

/// Typed publish/subscribe bus.
pub mod bus;
/// Event names, payloads and their contracts.
pub mod events;
/// Single-consumer async handle over an [`crate::app::App`].
pub mod handle;
/// Menu state machine.
pub mod menu;
/// The process-wide login session.
pub mod session;
