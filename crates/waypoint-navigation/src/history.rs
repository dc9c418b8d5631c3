//! Browser history collaborator
//!
//! The shell model drives history through the `History` trait and mirrors
//! whatever state the history reports back. `MemoryHistory` is an in-memory
//! adapter with browser semantics, used by tests and headless hosts.

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::NavigationError;
use crate::view_model::StateId;
use crate::Result;

/// Data stored with a history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    pub state_id: StateId,
}

impl HistoryState {
    pub fn new(state_id: StateId) -> Self {
        Self { state_id }
    }
}

/// A `statechange` notification.
///
/// `state_id` is empty for entries the application never registered, such as
/// a page loaded from a typed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub state_id: Option<StateId>,
    pub url: String,
}

pub trait History: Send {
    fn push_state(&mut self, state: HistoryState, title: Option<&str>, url: &str);

    fn replace_state(&mut self, state: HistoryState, title: Option<&str>, url: &str);

    fn back(&mut self);

    fn forward(&mut self);

    /// Full URL of the active entry
    fn current_url(&self) -> String;

    /// Adapters without native `pushState` need the state id in every URL
    fn is_emulated(&self) -> bool {
        false
    }

    /// Next queued `statechange` notification, oldest first
    fn take_state_change(&mut self) -> Option<StateChange>;
}

/// Shared access to the one history a shell model may drive
pub struct HistoryHandle<H> {
    history: Arc<Mutex<H>>,
    claimed: Arc<AtomicBool>,
}

impl<H: History> HistoryHandle<H> {
    pub fn new(history: H) -> Self {
        Self {
            history: Arc::new(Mutex::new(history)),
            claimed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, H> {
        self.history.lock()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    /// Take exclusive ownership of the history for the claim's lifetime
    pub(crate) fn claim(&self) -> Result<HistoryClaim> {
        self.claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| NavigationError::SingletonViolation)?;

        Ok(HistoryClaim {
            claimed: Arc::clone(&self.claimed),
        })
    }
}

impl<H> Clone for HistoryHandle<H> {
    fn clone(&self) -> Self {
        Self {
            history: Arc::clone(&self.history),
            claimed: Arc::clone(&self.claimed),
        }
    }
}

/// Released on drop
#[derive(Debug)]
pub(crate) struct HistoryClaim {
    claimed: Arc<AtomicBool>,
}

impl Drop for HistoryClaim {
    fn drop(&mut self) {
        self.claimed.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub state: Option<HistoryState>,
    pub title: Option<String>,
    pub url: String,
}

#[derive(Debug)]
pub struct MemoryHistory {
    entries: Vec<HistoryEntry>,
    index: usize,
    emulated: bool,
    pending: VecDeque<StateChange>,
}

impl MemoryHistory {
    /// Start with a single unregistered entry at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            entries: vec![HistoryEntry {
                state: None,
                title: None,
                url: url.into(),
            }],
            index: 0,
            emulated: false,
            pending: VecDeque::new(),
        }
    }

    /// Behave like a browser without native `pushState`
    pub fn emulated(mut self) -> Self {
        self.emulated = true;
        self
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.index]
    }

    /// Move `delta` entries through history. Out-of-range moves are ignored.
    pub fn go(&mut self, delta: isize) {
        let target = self.index as isize + delta;
        if delta == 0 || target < 0 || target >= self.entries.len() as isize {
            return;
        }

        self.index = target as usize;
        self.notify();
    }

    /// Open a URL the application did not register, discarding the forward
    /// entries the way a typed address does.
    pub fn load(&mut self, url: &str) {
        let url = self.resolve_url(url);
        self.entries.truncate(self.index + 1);
        self.entries.push(HistoryEntry {
            state: None,
            title: None,
            url,
        });
        self.index = self.entries.len() - 1;
        self.notify();
    }

    fn notify(&mut self) {
        let entry = &self.entries[self.index];
        self.pending.push_back(StateChange {
            state_id: entry.state.as_ref().map(|s| s.state_id.clone()),
            url: entry.url.clone(),
        });
    }

    // Relative query-only URLs replace the query of the active entry
    fn resolve_url(&self, url: &str) -> String {
        if !url.starts_with('?') {
            return url.to_string();
        }

        let current = &self.entries[self.index].url;
        let base = current.split(['?', '#']).next().unwrap_or_default();
        format!("{}{}", base, url)
    }
}

impl History for MemoryHistory {
    fn push_state(&mut self, state: HistoryState, title: Option<&str>, url: &str) {
        let url = self.resolve_url(url);
        self.entries.truncate(self.index + 1);
        self.entries.push(HistoryEntry {
            state: Some(state),
            title: title.map(str::to_string),
            url,
        });
        self.index = self.entries.len() - 1;
        self.notify();
    }

    fn replace_state(&mut self, state: HistoryState, title: Option<&str>, url: &str) {
        let url = self.resolve_url(url);
        let entry = &mut self.entries[self.index];
        let changed = entry.state.as_ref() != Some(&state);

        *entry = HistoryEntry {
            state: Some(state),
            title: title.map(str::to_string),
            url,
        };

        if changed {
            self.notify();
        }
    }

    fn back(&mut self) {
        self.go(-1);
    }

    fn forward(&mut self) {
        self.go(1);
    }

    fn current_url(&self) -> String {
        self.current().url.clone()
    }

    fn is_emulated(&self) -> bool {
        self.emulated
    }

    fn take_state_change(&mut self) -> Option<StateChange> {
        self.pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: &str) -> HistoryState {
        HistoryState::new(StateId::from(id))
    }

    #[test]
    fn test_push_truncates_forward_entries() {
        let mut history = MemoryHistory::new("https://app.test/?x=1");
        history.push_state(state("a"), None, "?screen=A");
        history.push_state(state("b"), None, "?screen=B");
        history.back();
        history.push_state(state("c"), Some("C"), "?screen=C");

        assert_eq!(history.entries().len(), 3);
        assert_eq!(history.index(), 2);
        assert_eq!(history.current_url(), "https://app.test/?screen=C");
        assert_eq!(history.current().title.as_deref(), Some("C"));
    }

    #[test]
    fn test_notifications_in_order() {
        let mut history = MemoryHistory::new("https://app.test/");
        history.push_state(state("a"), None, "?");
        history.back();
        history.forward();
        history.forward(); // at the tip, ignored

        let ids: Vec<Option<String>> = std::iter::from_fn(|| history.take_state_change())
            .map(|change| change.state_id.map(|id| id.to_string()))
            .collect();

        assert_eq!(
            ids,
            vec![Some("a".to_string()), None, Some("a".to_string())]
        );
    }

    #[test]
    fn test_replace_notifies_only_on_new_state() {
        let mut history = MemoryHistory::new("https://app.test/");
        history.replace_state(state("a"), None, "?");
        history.replace_state(state("a"), None, "?screen=A");

        assert_eq!(history.entries().len(), 1);
        assert_eq!(history.current_url(), "https://app.test/?screen=A");
        assert!(history.take_state_change().is_some());
        assert!(history.take_state_change().is_none());
    }

    #[test]
    fn test_claim_is_exclusive_until_dropped() {
        let handle = HistoryHandle::new(MemoryHistory::new("https://app.test/"));

        let claim = handle.claim().unwrap();
        assert!(handle.is_claimed());
        assert!(matches!(
            handle.clone().claim(),
            Err(NavigationError::SingletonViolation)
        ));

        drop(claim);
        assert!(!handle.is_claimed());
        assert!(handle.claim().is_ok());
    }

    #[test]
    fn test_entry_serialization() {
        let mut history = MemoryHistory::new("https://app.test/");
        history.push_state(state("a1"), None, "?screen=A");

        let json = serde_json::to_value(history.current()).unwrap();
        assert_eq!(json["state"]["state_id"], "a1");
        assert_eq!(json["url"], "https://app.test/?screen=A");

        let entry: HistoryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(&entry, history.current());
    }
}
