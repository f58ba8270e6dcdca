//! `washline-notify` — customer notification events and dispatch.
//!
//! The lifecycle engine renders a message for each classified transition and
//! hands it off on a detached task: the request that caused the transition
//! never waits for (or learns about) delivery. Failures are logged and never
//! retried; the persisted order status is authoritative regardless.

pub mod dispatcher;
pub mod event;
pub mod template;

pub use dispatcher::{
    spawn_dispatch, DispatchError, MemoryDispatcher, NotificationDispatcher, TracingDispatcher,
};
pub use event::Notification;
