//! Render error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("The navigation binding expects a '{0}' observable")]
    MissingContract(&'static str),

    #[error("Unknown transition: {0}")]
    UnknownTransition(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Navigation error: {0}")]
    Navigation(#[from] waypoint_navigation::NavigationError),
}
