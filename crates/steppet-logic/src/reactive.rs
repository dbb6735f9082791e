//! Observable values with synchronous, replay-one delivery.
//!
//! A [`Reactive`] holds exactly one value. Subscribers run on the caller's
//! thread inside [`Reactive::set`], in the order they subscribed, and each
//! new subscriber is handed the current value immediately.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use steppet_logic::reactive::Reactive;
//!
//! let wallet = Reactive::new(0u64);
//! let seen = Rc::new(Cell::new(0));
//! let sink = Rc::clone(&seen);
//! let _sub = wallet.subscribe(move |v| sink.set(*v));
//! assert_eq!(seen.get(), 0); // replayed on subscribe
//!
//! wallet.set(40);
//! assert_eq!(seen.get(), 40);
//! ```
//!
//! Everything here is single-threaded (`Rc`/`RefCell`). Presentation code
//! gets a [`ReadOnly`] handle so only the owning component can write.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct Slot<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<(u64, Callback<T>)>>,
    next_id: Cell<u64>,
}

impl<T> Slot<T> {
    fn is_subscribed(&self, id: u64) -> bool {
        self.subscribers.borrow().iter().any(|(sid, _)| *sid == id)
    }

    fn remove(&self, id: u64) {
        self.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
    }
}

/// A value that notifies subscribers when it changes.
pub struct Reactive<T> {
    slot: Rc<Slot<T>>,
}

impl<T: Clone + PartialEq + 'static> Reactive<T> {
    pub fn new(value: T) -> Self {
        Self {
            slot: Rc::new(Slot {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Current value (cloned).
    pub fn get(&self) -> T {
        self.slot.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.slot.value.borrow())
    }

    /// Store `value` and notify subscribers if it differs from the current
    /// value. Returns whether a notification went out.
    pub fn set(&self, value: T) -> bool {
        if *self.slot.value.borrow() == value {
            return false;
        }
        self.replace(value);
        true
    }

    /// Store `value` and notify unconditionally.
    ///
    /// Used for snapshot collections, where publishing a freshly built list
    /// is itself the event even when its contents compare equal.
    pub fn replace(&self, value: T) {
        *self.slot.value.borrow_mut() = value;
        self.notify();
    }

    /// Register `f`, call it once with the current value, and return the
    /// handle that removes it again.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let id = self.slot.next_id.get();
        self.slot.next_id.set(id + 1);

        let callback: Callback<T> = Rc::new(f);
        self.slot
            .subscribers
            .borrow_mut()
            .push((id, Rc::clone(&callback)));

        // Clone out so the callback may read or write this container.
        let current = self.get();
        callback(&current);

        let weak: Weak<Slot<T>> = Rc::downgrade(&self.slot);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(slot) = weak.upgrade() {
                    slot.remove(id);
                }
            })),
        }
    }

    /// A handle that can observe but not write.
    pub fn read_only(&self) -> ReadOnly<T> {
        ReadOnly {
            slot: Rc::clone(&self.slot),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.slot.subscribers.borrow().len()
    }

    fn notify(&self) {
        let callbacks: Vec<(u64, Callback<T>)> = self
            .slot
            .subscribers
            .borrow()
            .iter()
            .map(|(id, cb)| (*id, Rc::clone(cb)))
            .collect();
        let current = self.get();
        for (id, callback) in callbacks {
            // A callback earlier in this pass may have disposed a later one.
            if self.slot.is_subscribed(id) {
                callback(&current);
            }
        }
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Reactive<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Reactive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("value", &*self.slot.value.borrow())
            .field("subscribers", &self.slot.subscribers.borrow().len())
            .finish()
    }
}

/// Read/subscribe view of a [`Reactive`] owned elsewhere.
pub struct ReadOnly<T> {
    slot: Rc<Slot<T>>,
}

impl<T: Clone + PartialEq + 'static> ReadOnly<T> {
    pub fn get(&self) -> T {
        self.slot.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.slot.value.borrow())
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        Reactive {
            slot: Rc::clone(&self.slot),
        }
        .subscribe(f)
    }
}

impl<T> Clone for ReadOnly<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadOnly<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnly")
            .field(&*self.slot.value.borrow())
            .finish()
    }
}

/// Handle returned by `subscribe`. Dropping it unsubscribes.
///
/// [`Subscription::dispose`] may be called any number of times, including
/// after the observed container has been dropped.
#[must_use = "dropping a Subscription unsubscribes it"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn dispose(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.unsubscribe.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
