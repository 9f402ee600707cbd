//! Route-change event registration.
//!
//! A plain callback registry standing between the cache and whatever
//! router the host application uses: the router calls
//! [`NavigationEvents::notify_complete`] when a navigation finishes,
//! and interested parties register callbacks with scoped handles that
//! release themselves on drop.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Default)]
struct Registry {
    next_id: u64,
    callbacks: Vec<(u64, Rc<dyn Fn()>)>,
}

/// Navigation-complete event source.
#[derive(Clone, Default)]
pub struct NavigationEvents {
    inner: Rc<RefCell<Registry>>,
}

impl NavigationEvents {
    /// Create a new event source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback fired after each completed navigation.
    pub fn on_navigation_complete(&self, callback: impl Fn() + 'static) -> NavigationSubscription {
        let mut registry = self.inner.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.push((id, Rc::new(callback)));
        NavigationSubscription {
            registry: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Fire all registered callbacks.
    pub fn notify_complete(&self) {
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .inner
            .borrow()
            .callbacks
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in callbacks {
            callback();
        }
    }
}

/// Scoped registration handle; unregisters on drop.
pub struct NavigationSubscription {
    registry: Weak<RefCell<Registry>>,
    id: u64,
}

impl Drop for NavigationSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().callbacks.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_notify_fires_registered_callbacks() {
        let events = NavigationEvents::new();
        let fired = Rc::new(Cell::new(0u32));

        let fired_cb = Rc::clone(&fired);
        let sub = events.on_navigation_complete(move || fired_cb.set(fired_cb.get() + 1));

        events.notify_complete();
        events.notify_complete();
        assert_eq!(fired.get(), 2);

        drop(sub);
        events.notify_complete();
        assert_eq!(fired.get(), 2);
    }
}
