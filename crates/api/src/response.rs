//! Shared response envelope types for API handlers.
//!
//! Read endpoints use a `{ "data": ... }` envelope. The tracking POST endpoint
//! has its own fixed shape, defined in [`crate::handlers::tracking`].

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
