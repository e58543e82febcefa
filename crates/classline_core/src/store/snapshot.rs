//! Observable copy-on-write store.
//!
//! # Responsibility
//! - Hold one immutable snapshot of a value and replace it atomically.
//! - Notify subscribers after each replacement.
//!
//! # Invariants
//! - Readers always observe a fully-formed snapshot.
//! - Subscribers run outside the value lock, one delivery at a time.
//! - Delivered versions strictly increase; the last delivery is the latest
//!   snapshot. Replacements racing a running delivery may be coalesced.

use log::warn;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(0);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by `Store::subscribe`; unique across all stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listeners<T> = Vec<(SubscriptionId, Listener<T>)>;

struct Versioned<T> {
    version: u64,
    snapshot: Arc<T>,
}

#[derive(Default)]
struct Dispatch {
    /// A thread is currently running the delivery loop.
    running: bool,
    /// A replacement happened while the loop was running.
    dirty: bool,
    delivered: u64,
}

/// Typed container exposing `get`/`set` over shared snapshots.
pub struct Store<T> {
    value: RwLock<Versioned<T>>,
    listeners: Mutex<Listeners<T>>,
    dispatch: Mutex<Dispatch>,
}

impl<T> Store<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: RwLock::new(Versioned {
                version: 0,
                snapshot: Arc::new(initial),
            }),
            listeners: Mutex::new(Vec::new()),
            dispatch: Mutex::new(Dispatch::default()),
        }
    }

    /// Returns the current snapshot.
    pub fn get(&self) -> Arc<T> {
        self.current().1
    }

    /// Atomically replaces the snapshot and notifies subscribers.
    pub fn set(&self, next: T) {
        self.replace(next);
        self.notify();
    }

    /// Atomically replaces the snapshot without notifying.
    ///
    /// Callers that hold their own lock across several stores replace first
    /// and call `notify` once that lock is released.
    pub(crate) fn replace(&self, next: T) -> Arc<T> {
        let snapshot = Arc::new(next);
        let mut guard = match self.value.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("event=store_set module=store status=recovered reason=poisoned_lock");
                poisoned.into_inner()
            }
        };
        guard.version += 1;
        guard.snapshot = Arc::clone(&snapshot);
        snapshot
    }

    /// Registers a change callback.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let listener: Listener<T> = Arc::new(listener);
        let id = SubscriptionId(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, listener));
        id
    }

    /// Removes a change callback; returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(entry_id, _)| *entry_id != id);
        listeners.len() != before
    }

    /// Delivers the latest snapshot to subscribers.
    ///
    /// When another thread (or an enclosing callback on this thread) is
    /// already delivering, this only marks the store dirty; the running loop
    /// re-reads and delivers the newer snapshot before it exits.
    pub(crate) fn notify(&self) {
        {
            let mut dispatch = self.lock_dispatch();
            if dispatch.running {
                dispatch.dirty = true;
                return;
            }
            dispatch.running = true;
            dispatch.dirty = false;
        }
        let _unwind = ResetOnUnwind(&self.dispatch);

        loop {
            let (version, snapshot) = self.current();
            let delivered = self.lock_dispatch().delivered;
            if version > delivered {
                // Cloned out so callbacks may subscribe/unsubscribe re-entrantly.
                let current = self
                    .lock_listeners()
                    .iter()
                    .map(|(_, listener)| Arc::clone(listener))
                    .collect::<Vec<_>>();
                for listener in current {
                    listener(&snapshot);
                }
            }

            let mut dispatch = self.lock_dispatch();
            dispatch.delivered = dispatch.delivered.max(version);
            if !dispatch.dirty {
                dispatch.running = false;
                return;
            }
            dispatch.dirty = false;
        }
    }

    fn current(&self) -> (u64, Arc<T>) {
        let guard = match self.value.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        (guard.version, Arc::clone(&guard.snapshot))
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Listeners<T>> {
        match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_dispatch(&self) -> MutexGuard<'_, Dispatch> {
        match self.dispatch.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Clears `running` if a subscriber panics mid-delivery.
struct ResetOnUnwind<'a>(&'a Mutex<Dispatch>);

impl Drop for ResetOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut dispatch = match self.0.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            dispatch.running = false;
        }
    }
}

impl<T: Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::Store;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn subscription_ids_are_unique_across_stores() {
        let first = Store::new(());
        let second = Store::new(());
        let a = first.subscribe(|_| {});
        let b = second.subscribe(|_| {});
        assert_ne!(a, b);
        assert!(!first.unsubscribe(b));
        assert!(second.unsubscribe(b));
    }

    #[test]
    fn nested_set_from_callback_is_delivered_after_outer() {
        let store = Arc::new(Store::new(0_u32));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let inner = Arc::clone(&store);
        store.subscribe(move |value| {
            sink.lock().unwrap().push(*value);
            if *value == 1 {
                inner.set(2);
            }
        });

        store.set(1);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(*store.get(), 2);
    }

    #[test]
    fn panicking_subscriber_does_not_block_later_deliveries() {
        let store = Arc::new(Store::new(0_u32));
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        store.subscribe(move |value| {
            sink.store(*value as usize, Ordering::SeqCst);
            if *value == 1 {
                panic!("subscriber failure");
            }
        });

        let panicking = Arc::clone(&store);
        assert!(std::thread::spawn(move || panicking.set(1)).join().is_err());

        store.set(2);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn set_replaces_snapshot_without_touching_old_readers() {
        let store = Store::new(vec![1, 2, 3]);
        let before = store.get();

        store.set(vec![1]);

        assert_eq!(*before, vec![1, 2, 3]);
        assert_eq!(*store.get(), vec![1]);
    }

    #[test]
    fn subscribers_see_new_value_until_unsubscribed() {
        let store = Store::new(0_u32);
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        let id = store.subscribe(move |value| {
            sink.store(*value as usize, Ordering::SeqCst);
        });

        store.set(7);
        assert_eq!(seen.load(Ordering::SeqCst), 7);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set(9);
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }
}
