//! Action tracking handlers and administrative event plumbing.
//!
//! - [`TrackingHandler`]: resolves a model alias and writes one tracking
//!   record per call.
//! - [`AdminTracker`] / [`AdminTrackingHandler`]: adapts administrative
//!   changes into tracking records; the implementation in use is chosen by
//!   name from a [`HandlerRegistry`](actionlog_core::resolver::HandlerRegistry).
//! - [`AdminEventBus`]: in-process publish/subscribe hub for
//!   [`AdminLogEntry`] values.
//! - [`AdminEventListener`]: classifies log entries and forwards them to the
//!   admin tracker, either inline or as a background loop on the bus.

pub mod admin;
pub mod bus;
pub mod entry;
pub mod listener;
pub mod tracker;

pub use admin::{
    builtin_admin_handlers, resolve_admin_tracker, AdminHandlerFactory, AdminTracker,
    AdminTrackingHandler,
};
pub use bus::AdminEventBus;
pub use entry::{ActionFlag, AdminLogEntry, ChangeLogEntry, EditedObject};
pub use listener::{await_listener_shutdown, AdminEventListener, ListenerPolicy};
pub use tracker::{TrackingError, TrackingHandler};
