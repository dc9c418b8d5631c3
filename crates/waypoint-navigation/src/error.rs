//! Navigation error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("There can only be one shell navigation model per history")]
    SingletonViolation,

    #[error("Can't determine the type name for view model: {0}")]
    UnresolvableType(String),

    #[error("No registered type for view model: {0}")]
    NotFound(String),

    #[error(
        "Can't resolve a view: the view model has no registered type and no explicit view name"
    )]
    Ambiguous,

    #[error("Failed to build screen {type_name}: {reason}")]
    Reconstruction { type_name: String, reason: String },
}
