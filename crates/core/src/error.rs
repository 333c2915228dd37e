use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An alias or type reference is missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A type reference names a namespace or type that is not registered.
    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Internal error: {0}")]
    Internal(String),
}
