//! Waypoint Render
//!
//! Renders the navigation stack and animates between screens:
//! - `NavigationType`: eight-way classification of a screen change
//! - `Transitions`: named transition handlers
//! - `NavigationBinding`: keeps one element per screen and runs transitions

mod binding;
mod error;
mod template;
mod transition;

pub use binding::{BindingConfig, NavigationBinding};
pub use error::RenderError;
pub use template::{TemplateEngine, TemplateName};
pub use transition::{
    default_transition, Element, NavigationType, TransitionHandler, Transitions,
    DEFAULT_TRANSITION,
};

pub type Result<T> = std::result::Result<T, RenderError>;
