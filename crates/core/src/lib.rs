//! Domain building blocks for action tracking.
//!
//! This crate has zero internal dependencies so it can be shared by the
//! persistence layer, the tracking handlers, and the HTTP server alike.

pub mod admin;
pub mod details;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod router;
pub mod settings;
pub mod types;
