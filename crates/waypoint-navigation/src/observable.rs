//! Observable cells
//!
//! Setting a value never calls back into subscribers. Each subscription owns
//! a queue of pending values that its consumer drains when it is ready, so
//! observers run as discrete, ordered steps instead of re-entrantly.
//!
//! Every published value carries a process-wide sequence number, so a
//! consumer of several cells can replay their changes in publish order.

use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

type Queue<T> = Arc<Mutex<VecDeque<(u64, T)>>>;

struct Inner<T> {
    value: RwLock<T>,
    subscribers: Mutex<Vec<Weak<Mutex<VecDeque<(u64, T)>>>>>,
}

/// A shared value cell. Clones are handles to the same cell.
pub struct Observable<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Clone> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(value),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Borrow the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.read())
    }

    pub fn set(&self, value: T) {
        *self.inner.value.write() = value.clone();
        self.notify(value);
    }

    /// Mutate in place, then publish the result once
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let value = {
            let mut guard = self.inner.value.write();
            f(&mut guard);
            guard.clone()
        };
        self.notify(value);
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let queue: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        self.inner.subscribers.lock().push(Arc::downgrade(&queue));
        Subscription { queue }
    }

    fn notify(&self, value: T) {
        let sequence = SEQUENCE.fetch_add(1, Ordering::SeqCst);

        // Dropped subscriptions are pruned here
        self.inner
            .subscribers
            .lock()
            .retain(|subscriber| match subscriber.upgrade() {
                Some(queue) => {
                    queue.lock().push_back((sequence, value.clone()));
                    true
                }
                None => false,
            });
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Observable")
            .field(&*self.inner.value.read())
            .finish()
    }
}

/// Pending changes of one observable, oldest first
pub struct Subscription<T> {
    queue: Queue<T>,
}

impl<T> Subscription<T> {
    pub fn next(&self) -> Option<T> {
        self.queue.lock().pop_front().map(|(_, value)| value)
    }

    pub fn drain(&self) -> Vec<T> {
        self.queue.lock().drain(..).map(|(_, value)| value).collect()
    }

    /// Pending changes tagged with their publish sequence number
    pub fn drain_sequenced(&self) -> Vec<(u64, T)> {
        self.queue.lock().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("pending", &self.queue.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_queues_changes() {
        let cell = Observable::new(0);
        let subscription = cell.subscribe();

        cell.set(1);
        cell.update(|v| *v += 10);

        assert_eq!(cell.get(), 11);
        assert_eq!(subscription.drain(), vec![1, 11]);
        assert!(subscription.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let cell = Observable::new(String::from("a"));
        let handle = cell.clone();
        let subscription = cell.subscribe();

        handle.set("b".to_string());

        assert_eq!(cell.get(), "b");
        assert_eq!(subscription.next(), Some("b".to_string()));
        assert_eq!(subscription.next(), None);
    }

    #[test]
    fn test_sequence_orders_changes_across_cells() {
        let numbers = Observable::new(0);
        let names = Observable::new(String::new());
        let number_changes = numbers.subscribe();
        let name_changes = names.subscribe();

        numbers.set(1);
        names.set("a".to_string());
        numbers.set(2);

        let numbers = number_changes.drain_sequenced();
        let names = name_changes.drain_sequenced();
        assert_eq!(numbers.len(), 2);
        assert!(numbers[0].0 < names[0].0);
        assert!(names[0].0 < numbers[1].0);
        assert_eq!(names[0].1, "a");
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let cell = Observable::new(1);
        let subscription = cell.subscribe();
        drop(subscription);

        cell.set(2);
        assert!(cell.inner.subscribers.lock().is_empty());
    }
}
