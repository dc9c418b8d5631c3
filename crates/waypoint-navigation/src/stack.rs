//! Basic navigation stack
//!
//! A stack of screens with a single current pointer, for hosts that do not
//! sync with browser history. Navigating from anywhere but the tip discards
//! the forward branch.

use crate::current::CurrentItem;
use crate::observable::Observable;
use crate::view_model::{position_of, same_item, ViewModelRef};

pub struct NavigationModel {
    navigation_stack: Observable<Vec<ViewModelRef>>,
    current_item: Observable<Option<CurrentItem>>,
}

impl NavigationModel {
    pub fn new() -> Self {
        Self {
            navigation_stack: Observable::new(Vec::new()),
            current_item: Observable::new(None),
        }
    }

    /// Start with `view_model` as the only entry
    pub fn with_default(view_model: ViewModelRef) -> Self {
        Self {
            navigation_stack: Observable::new(vec![view_model.clone()]),
            current_item: Observable::new(Some(CurrentItem::Persistent(view_model))),
        }
    }

    pub fn navigation_stack(&self) -> &Observable<Vec<ViewModelRef>> {
        &self.navigation_stack
    }

    pub fn current_item(&self) -> &Observable<Option<CurrentItem>> {
        &self.current_item
    }

    pub fn current(&self) -> Option<ViewModelRef> {
        self.current_item
            .with(|current| current.as_ref().map(|c| c.effective().clone()))
    }

    pub fn can_go_back(&self) -> bool {
        let current = self.current();
        self.navigation_stack
            .with(|stack| at_edge(stack.first(), current.as_ref()))
    }

    pub fn can_go_forward(&self) -> bool {
        let current = self.current();
        self.navigation_stack
            .with(|stack| at_edge(stack.last(), current.as_ref()))
    }

    pub fn back(&self) {
        if self.can_go_back() {
            self.step(-1);
        }
    }

    pub fn forward(&self) {
        if self.can_go_forward() {
            self.step(1);
        }
    }

    pub fn navigate_to(&self, view_model: ViewModelRef) {
        let current = self.current();

        // The stack is published before the pointer so observers never see
        // the new item outside the stack.
        self.navigation_stack.update(|stack| {
            if let Some(current) = &current {
                truncate_after(stack, current);
            }
            push_unique(stack, view_model.clone());
        });

        tracing::debug!(depth = self.navigation_stack.with(Vec::len), "Navigated");
        self.current_item
            .set(Some(CurrentItem::Persistent(view_model)));
    }

    fn step(&self, delta: isize) {
        let Some(current) = self.current() else {
            return;
        };

        let next = self.navigation_stack.with(|stack| {
            let index = position_of(stack, &current)? as isize + delta;
            usize::try_from(index).ok().and_then(|i| stack.get(i).cloned())
        });

        if let Some(next) = next {
            self.current_item.set(Some(CurrentItem::Persistent(next)));
        }
    }
}

impl Default for NavigationModel {
    fn default() -> Self {
        Self::new()
    }
}

/// True unless `current` is the stack element at this edge
pub(crate) fn at_edge(edge: Option<&ViewModelRef>, current: Option<&ViewModelRef>) -> bool {
    match (edge, current) {
        (None, _) => false,
        (Some(edge), Some(current)) => !same_item(edge, current),
        (Some(_), None) => true,
    }
}

/// Drop every entry after `item`. No-op when `item` is not in the stack.
pub(crate) fn truncate_after(stack: &mut Vec<ViewModelRef>, item: &ViewModelRef) {
    if let Some(index) = position_of(stack, item) {
        stack.truncate(index + 1);
    }
}

/// Append, moving an existing entry for the same object to the tip
pub(crate) fn push_unique(stack: &mut Vec<ViewModelRef>, item: ViewModelRef) {
    stack.retain(|existing| !same_item(existing, &item));
    stack.push(item);
}
