//! Current item pointer
//!
//! The shell model tracks two pointers: the persistent item reconciled from
//! history, and an optional transient override shown while history sits on
//! an entry with no live stack item.

use crate::view_model::{same_item, ViewModelRef};

#[derive(Debug, Clone)]
pub enum CurrentItem {
    Persistent(ViewModelRef),
    Transient {
        item: ViewModelRef,
        /// Last known-good position in the stack, kept while the override shows
        persistent: Option<ViewModelRef>,
    },
}

impl CurrentItem {
    /// The item to display
    pub fn effective(&self) -> &ViewModelRef {
        match self {
            CurrentItem::Persistent(item) => item,
            CurrentItem::Transient { item, .. } => item,
        }
    }

    /// The authoritative pointer into the stack
    pub fn persistent(&self) -> Option<&ViewModelRef> {
        match self {
            CurrentItem::Persistent(item) => Some(item),
            CurrentItem::Transient { persistent, .. } => persistent.as_ref(),
        }
    }

    pub fn transient(&self) -> Option<&ViewModelRef> {
        match self {
            CurrentItem::Persistent(_) => None,
            CurrentItem::Transient { item, .. } => Some(item),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, CurrentItem::Transient { .. })
    }

    pub fn is(&self, item: &ViewModelRef) -> bool {
        same_item(self.effective(), item)
    }
}
