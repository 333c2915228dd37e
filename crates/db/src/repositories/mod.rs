//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod tracking_repo;

pub use tracking_repo::TrackingRecordRepo;
