//! Favorite membership used to annotate results.
//!
//! The core only reads favorites. Change notification is an explicit
//! subscription: [`FavoriteIndex::subscribe`] returns a [`Subscription`] that
//! unregisters the callback when dropped or when `unsubscribe` is called.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

/// Callback invoked after the favorite set changes.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Read-only view of the favorites store.
pub trait FavoriteIndex: Send + Sync {
    fn is_favorite(&self, id: i64) -> bool;

    /// Register `on_change`; it stays registered while the handle lives.
    fn subscribe(&self, on_change: ChangeCallback) -> Subscription;
}

/// Handle for a registered change callback.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self { unsubscribe: Some(Box::new(unsubscribe)) }
    }

    /// A handle with nothing to unregister.
    pub fn noop() -> Self {
        Self { unsubscribe: None }
    }

    pub fn unsubscribe(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("active", &self.unsubscribe.is_some()).finish()
    }
}

/// Favorites that never change. Useful when annotation is not wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFavorites;

impl FavoriteIndex for NoFavorites {
    fn is_favorite(&self, _id: i64) -> bool {
        false
    }

    fn subscribe(&self, _on_change: ChangeCallback) -> Subscription {
        Subscription::noop()
    }
}

#[derive(Default)]
struct Listeners {
    next_id: AtomicU64,
    callbacks: Mutex<HashMap<u64, ChangeCallback>>,
}

/// In-memory favorites with change notification.
#[derive(Clone, Default)]
pub struct FavoriteSet {
    ids: Arc<RwLock<HashSet<i64>>>,
    listeners: Arc<Listeners>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as a favorite. Subscribers are notified if the set changed.
    pub fn insert(&self, id: i64) -> bool {
        let changed = self.ids.write().unwrap_or_else(PoisonError::into_inner).insert(id);
        if changed {
            self.notify();
        }
        changed
    }

    pub fn remove(&self, id: i64) -> bool {
        let changed = self.ids.write().unwrap_or_else(PoisonError::into_inner).remove(&id);
        if changed {
            self.notify();
        }
        changed
    }

    pub fn ids(&self) -> HashSet<i64> {
        self.ids.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.callbacks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn notify(&self) {
        // Call outside the lock so a callback may subscribe or unsubscribe.
        let callbacks: Vec<ChangeCallback> = self
            .listeners
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for callback in callbacks {
            callback();
        }
    }
}

impl FavoriteIndex for FavoriteSet {
    fn is_favorite(&self, id: i64) -> bool {
        self.ids.read().unwrap_or_else(PoisonError::into_inner).contains(&id)
    }

    fn subscribe(&self, on_change: ChangeCallback) -> Subscription {
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, on_change);

        let listeners: Weak<Listeners> = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.callbacks.lock().unwrap_or_else(PoisonError::into_inner).remove(&id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, ChangeCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_membership() {
        let favorites = FavoriteSet::new();
        assert!(!favorites.is_favorite(1));
        assert!(favorites.insert(1));
        assert!(favorites.is_favorite(1));
        assert!(favorites.remove(1));
        assert!(!favorites.is_favorite(1));
    }

    #[test]
    fn test_subscriber_notified_on_change_only() {
        let favorites = FavoriteSet::new();
        let (count, callback) = counter();
        let _subscription = favorites.subscribe(callback);

        favorites.insert(1);
        favorites.insert(1);
        favorites.remove(1);

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let favorites = FavoriteSet::new();
        let (count, callback) = counter();
        let subscription = favorites.subscribe(callback);
        subscription.unsubscribe();

        favorites.insert(1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(favorites.subscriber_count(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let favorites = FavoriteSet::new();
        let (_count, callback) = counter();
        {
            let _subscription = favorites.subscribe(callback);
            assert_eq!(favorites.subscriber_count(), 1);
        }
        assert_eq!(favorites.subscriber_count(), 0);
    }

    #[test]
    fn test_subscription_outlives_store() {
        let favorites = FavoriteSet::new();
        let (_count, callback) = counter();
        let subscription = favorites.subscribe(callback);
        drop(favorites);
        subscription.unsubscribe();
    }
}
