//! Waypoint Navigation
//!
//! A stack of screens (view models) kept in sync with browser history:
//! - Query codec: typed bookmark parameters to and from URL query strings
//! - Resolver: screen <-> logical type name <-> template name
//! - `NavigationModel`: plain back/forward stack
//! - `ShellNavigationModel`: the history-synchronised stack, with a
//!   transient pointer for history entries that no longer have a screen

mod current;
mod error;
mod history;
mod observable;
mod query;
mod resolver;
mod shell;
mod stack;
mod view_model;

pub use current::CurrentItem;
pub use error::NavigationError;
pub use history::{History, HistoryEntry, HistoryHandle, HistoryState, MemoryHistory, StateChange};
pub use observable::{Observable, Subscription};
pub use query::{format_query_string, parse_query_string, RESERVED_KEYS};
pub use resolver::{ViewModelResolver, DEFAULT_VIEW_SUFFIX};
pub use shell::{DefaultViewModel, ShellNavigationModel, ShellOptions, SCREEN_KEY};
pub use stack::NavigationModel;
pub use view_model::{
    downcast_ref, position_of, same_item, type_id_of, AsAny, Parameters, QueryValue, StateId,
    ViewModel, ViewModelRef,
};

pub type Result<T> = std::result::Result<T, NavigationError>;
