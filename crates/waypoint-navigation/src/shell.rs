//! Shell navigation model
//!
//! The screen stack synchronised with browser history. The browser is the
//! source of truth for back and forward: this model pushes and replaces
//! history entries, then moves its pointers only when history reports a
//! `statechange` (see [`ShellNavigationModel::reconcile`]).
//!
//! ```text
//! navigate_to ──push_state──▶ History ──statechange──▶ reconcile
//!                               ▲                         │
//! back / forward ───────────────┘          persistent / transient pointer
//! ```

use std::fmt;
use std::sync::Arc;

use crate::current::CurrentItem;
use crate::error::NavigationError;
use crate::history::{History, HistoryClaim, HistoryHandle, HistoryState};
use crate::observable::Observable;
use crate::query::{format_query_string, parse_query_string};
use crate::resolver::ViewModelResolver;
use crate::stack::at_edge;
use crate::view_model::{same_item, QueryValue, StateId, ViewModelRef};
use crate::Result;

/// Query parameter naming the bookmarked screen type
pub const SCREEN_KEY: &str = "screen";

/// Screen shown when the URL does not name a bookmarkable screen
pub enum DefaultViewModel {
    Instance(ViewModelRef),
    Factory(Box<dyn Fn() -> ViewModelRef + Send + Sync>),
}

impl DefaultViewModel {
    fn build(&self) -> ViewModelRef {
        match self {
            DefaultViewModel::Instance(view_model) => view_model.clone(),
            DefaultViewModel::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for DefaultViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultViewModel::Instance(view_model) => {
                f.debug_tuple("Instance").field(view_model).finish()
            }
            DefaultViewModel::Factory(_) => f.write_str("Factory"),
        }
    }
}

#[derive(Debug, Default)]
pub struct ShellOptions {
    pub default_view_model: Option<DefaultViewModel>,
    /// Placeholder for history entries with no live stack item
    pub expired_view_model: Option<ViewModelRef>,
    /// Oldest entries are evicted once the stack reaches this size
    pub max_stack_size: Option<usize>,
}

#[derive(Debug, Clone)]
struct StackEntry {
    view_model: ViewModelRef,
    state_id: StateId,
}

pub struct ShellNavigationModel<H: History> {
    history: HistoryHandle<H>,
    resolver: Arc<ViewModelResolver>,
    entries: Vec<StackEntry>,
    navigation_stack: Observable<Vec<ViewModelRef>>,
    current_item: Observable<Option<CurrentItem>>,
    expired_view_model: Option<ViewModelRef>,
    max_stack_size: Option<usize>,
    _claim: HistoryClaim,
}

impl<H: History> ShellNavigationModel<H> {
    /// Install the shell on `history`.
    ///
    /// Fails with `SingletonViolation` while another shell holds the same
    /// history. The initial screen comes from the URL's `screen` parameter,
    /// falling back to the configured default.
    pub fn new(
        history: &HistoryHandle<H>,
        resolver: Arc<ViewModelResolver>,
        options: ShellOptions,
    ) -> Result<Self> {
        let claim = history.claim()?;

        let state_id = StateId::generate();
        let (current_url, emulated) = {
            let history = history.lock();
            (history.current_url(), history.is_emulated())
        };

        let parameters = parse_query_string(&current_url);
        let screen = parameters.get(SCREEN_KEY).and_then(QueryValue::as_str);

        let initial = match resolver.create_view_model(screen, &parameters) {
            Some(view_model) => {
                // Re-encode so reserved and malformed parameters are dropped
                let url = build_url(&state_id, emulated, &format_query_string(&parameters));
                Some((view_model, url))
            }
            None => options.default_view_model.as_ref().map(|default| {
                let url = if emulated {
                    build_url(&state_id, emulated, "")
                } else {
                    current_url.clone()
                };
                (default.build(), url)
            }),
        };

        let mut model = Self {
            history: history.clone(),
            resolver,
            entries: Vec::new(),
            navigation_stack: Observable::new(Vec::new()),
            current_item: Observable::new(None),
            expired_view_model: options.expired_view_model,
            max_stack_size: options.max_stack_size,
            _claim: claim,
        };

        if let Some((view_model, url)) = initial {
            model.entries.push(StackEntry {
                view_model: view_model.clone(),
                state_id: state_id.clone(),
            });
            model.publish_stack();
            model
                .current_item
                .set(Some(CurrentItem::Persistent(view_model)));

            model
                .history
                .lock()
                .replace_state(HistoryState::new(state_id.clone()), None, &url);

            tracing::info!(state_id = %state_id, url = %url, "Shell navigation installed");
        } else {
            tracing::info!("Shell navigation installed without an initial screen");
        }

        Ok(model)
    }

    pub fn navigation_stack(&self) -> &Observable<Vec<ViewModelRef>> {
        &self.navigation_stack
    }

    pub fn current_item(&self) -> &Observable<Option<CurrentItem>> {
        &self.current_item
    }

    /// The item to display: the transient override if set, else the
    /// persistent item
    pub fn current(&self) -> Option<ViewModelRef> {
        self.current_item
            .with(|current| current.as_ref().map(|c| c.effective().clone()))
    }

    pub fn persistent_item(&self) -> Option<ViewModelRef> {
        self.current_item
            .with(|current| current.as_ref().and_then(|c| c.persistent().cloned()))
    }

    pub fn transient_item(&self) -> Option<ViewModelRef> {
        self.current_item
            .with(|current| current.as_ref().and_then(|c| c.transient().cloned()))
    }

    pub fn history(&self) -> &HistoryHandle<H> {
        &self.history
    }

    pub fn resolver(&self) -> &Arc<ViewModelResolver> {
        &self.resolver
    }

    pub fn state_id_of(&self, view_model: &ViewModelRef) -> Option<StateId> {
        self.entries
            .iter()
            .find(|entry| same_item(&entry.view_model, view_model))
            .map(|entry| entry.state_id.clone())
    }

    /// Computed against the persistent item; transient excursions never
    /// change it
    pub fn can_go_back(&self) -> bool {
        at_edge(
            self.entries.first().map(|e| &e.view_model),
            self.persistent_item().as_ref(),
        )
    }

    pub fn can_go_forward(&self) -> bool {
        at_edge(
            self.entries.last().map(|e| &e.view_model),
            self.persistent_item().as_ref(),
        )
    }

    /// Ask history to go back. Pointers move on the resulting `statechange`.
    pub fn back(&self) {
        if self.can_go_back() {
            self.history.lock().back();
        }
    }

    pub fn forward(&self) {
        if self.can_go_forward() {
            self.history.lock().forward();
        }
    }

    /// Push `view_model` onto the stack and into history.
    ///
    /// The pointers are not updated here; they follow once the pushed
    /// history state is reconciled.
    pub fn navigate_to(&mut self, view_model: ViewModelRef) -> Result<StateId> {
        let state_id = StateId::generate();
        let emulated = self.history.lock().is_emulated();

        let query = if view_model.bookmarkable() {
            let type_name = self
                .resolver
                .type_name(view_model.as_ref())
                .map_err(|_| NavigationError::UnresolvableType(format!("{:?}", view_model)))?;

            format!(
                "&{}={}{}",
                SCREEN_KEY,
                type_name,
                format_query_string(&view_model.parameters())
            )
        } else {
            String::new()
        };
        let url = build_url(&state_id, emulated, &query);

        if let Some(persistent) = self.persistent_item() {
            if let Some(index) = self.position(&persistent) {
                self.entries.truncate(index + 1);
            }

            // Leaving a transient state means the browser is out of sync
            // with the stack. Point the active entry back at the last
            // known-good state before pushing.
            if self.transient_item().is_some() {
                if let Some(persistent_id) = self.state_id_of(&persistent) {
                    self.history.lock().replace_state(
                        HistoryState::new(persistent_id),
                        None,
                        &url,
                    );
                }
            }
        }

        if let Some(max) = self.max_stack_size {
            if self.entries.len() >= max {
                let evict = (self.entries.len() + 1 - max).min(self.entries.len());
                self.entries.drain(..evict);
                tracing::debug!(evicted = evict, max, "Navigation stack trimmed");
            }
        }

        self.entries
            .retain(|entry| !same_item(&entry.view_model, &view_model));
        self.entries.push(StackEntry {
            view_model,
            state_id: state_id.clone(),
        });
        self.publish_stack();

        self.history
            .lock()
            .push_state(HistoryState::new(state_id.clone()), None, &url);

        tracing::debug!(state_id = %state_id, url = %url, depth = self.entries.len(), "Pushed screen");

        Ok(state_id)
    }

    /// Mirror a history `statechange` into the pointers.
    ///
    /// A matching live entry becomes the persistent item and clears any
    /// transient override. An expired match is evicted first and handled
    /// as a miss. On a miss the expired placeholder, if configured, is shown
    /// as a transient item; the stack and persistent pointer stay as they are.
    pub fn reconcile(&mut self, state_id: Option<&StateId>) {
        let mut target = None;

        let found = state_id
            .and_then(|id| self.entries.iter().position(|entry| &entry.state_id == id));

        if let Some(index) = found {
            if self.entries[index].view_model.expired() {
                let removed = self.entries.remove(index);
                self.publish_stack();
                tracing::debug!(state_id = %removed.state_id, "Evicted expired screen");
            } else {
                target = Some(self.entries[index].view_model.clone());
            }
        }

        match target {
            Some(view_model) => {
                let unchanged = self.current_item.with(|current| {
                    matches!(current, Some(CurrentItem::Persistent(item)) if same_item(item, &view_model))
                });

                if !unchanged {
                    tracing::debug!(depth = self.entries.len(), "Reconciled to stack entry");
                    self.current_item
                        .set(Some(CurrentItem::Persistent(view_model)));
                }
            }
            None => match &self.expired_view_model {
                Some(placeholder) => {
                    tracing::debug!("History state has no live screen, showing placeholder");
                    let persistent = self.persistent_item();
                    self.current_item.set(Some(CurrentItem::Transient {
                        item: placeholder.clone(),
                        persistent,
                    }));
                }
                None => {
                    tracing::warn!(
                        state_id = ?state_id.map(StateId::as_str),
                        "History state has no live screen and no placeholder is configured"
                    );
                }
            },
        }
    }

    /// Reconcile every pending `statechange`, oldest first. Returns how many
    /// were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;

        loop {
            let change = self.history.lock().take_state_change();
            let Some(change) = change else {
                break;
            };

            self.reconcile(change.state_id.as_ref());
            handled += 1;
        }

        handled
    }

    fn position(&self, view_model: &ViewModelRef) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| same_item(&entry.view_model, view_model))
    }

    fn publish_stack(&self) {
        self.navigation_stack.set(
            self.entries
                .iter()
                .map(|entry| entry.view_model.clone())
                .collect(),
        );
    }
}

impl<H: History> fmt::Debug for ShellNavigationModel<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellNavigationModel")
            .field("entries", &self.entries)
            .field("current_item", &self.current_item)
            .field("max_stack_size", &self.max_stack_size)
            .finish()
    }
}

/// Build a history URL. `query` is a `&key=value` list as produced by
/// `format_query_string`.
fn build_url(state_id: &StateId, emulated: bool, query: &str) -> String {
    if emulated {
        format!("?s={}{}", state_id, query)
    } else {
        format!("?{}", query.strip_prefix('&').unwrap_or(query))
    }
}
