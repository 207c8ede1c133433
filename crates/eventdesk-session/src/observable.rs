//! Watchable draft fields.
//!
//! Editors bind to an [`Observable`] and get notified whenever the session
//! changes its value. Every write replaces the whole value, so a receiver
//! never sees a partially updated one.

use std::sync::Arc;

use tokio::sync::watch;

/// A value the session owns and editors can watch.
#[derive(Debug)]
pub struct Observable<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Observable<T> {
    /// Creates an observable holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(value)),
        }
    }

    /// Replaces the value and notifies watchers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Derives a new value from the current one and stores it.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.tx.send_modify(|current| *current = f(current));
    }

    /// Returns a receiver that sees every later change.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone> Observable<T> {
    /// Returns a copy of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
