//! Per-key change notifications.
//!
//! The cache emits a plain ping whenever a key's state changes; the
//! rendering collaborator subscribes and re-reads whatever it needs.
//! Nothing here knows about any UI framework's diffing mechanism.

use std::collections::HashMap;
use std::rc::Rc;

/// Callback registry keyed by serialized query key.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    subscribers: HashMap<String, Vec<(u64, Rc<dyn Fn()>)>>,
}

impl ObserverRegistry {
    pub fn insert(&mut self, id: &str, callback: Rc<dyn Fn()>) -> u64 {
        let token = self.next_id;
        self.next_id += 1;
        self.subscribers
            .entry(id.to_string())
            .or_default()
            .push((token, callback));
        token
    }

    pub fn remove(&mut self, id: &str, token: u64) {
        if let Some(callbacks) = self.subscribers.get_mut(id) {
            callbacks.retain(|(t, _)| *t != token);
            if callbacks.is_empty() {
                self.subscribers.remove(id);
            }
        }
    }

    /// Snapshot the callbacks for a key so they can be invoked without
    /// holding the registry borrow.
    pub fn callbacks_for(&self, id: &str) -> Vec<Rc<dyn Fn()>> {
        self.subscribers
            .get(id)
            .map(|cbs| cbs.iter().map(|(_, cb)| Rc::clone(cb)).collect())
            .unwrap_or_default()
    }
}

/// Handle for an active subscription; unsubscribes when dropped.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unsubscribe explicitly (equivalent to dropping the handle).
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}
