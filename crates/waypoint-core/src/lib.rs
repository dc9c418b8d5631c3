//! Waypoint Core
//!
//! Wires the navigation model to its rendering binding and carries the
//! ambient pieces a host needs: configuration, logging and one error type.

mod config;
mod error;
mod navigator;

pub use config::Config;
pub use error::CoreError;
pub use navigator::Navigator;

// Re-export the building blocks
pub use waypoint_navigation::{
    CurrentItem, DefaultViewModel, History, HistoryHandle, HistoryState, MemoryHistory,
    NavigationError, NavigationModel, Parameters, QueryValue, ShellNavigationModel, ShellOptions,
    StateId, ViewModel, ViewModelRef, ViewModelResolver,
};
pub use waypoint_render::{
    BindingConfig, Element, NavigationBinding, NavigationType, RenderError, TemplateEngine,
    TemplateName, Transitions,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
