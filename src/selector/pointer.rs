//! Document-level pointer events and scoped listeners

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Identifier of a node in the rendered tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a process-unique node id
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A pointer-down event, described by the path from the tree root to the
/// node under the pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointerDown {
    path: Vec<NodeId>,
}

impl PointerDown {
    pub fn on(path: impl Into<Vec<NodeId>>) -> Self {
        Self { path: path.into() }
    }

    /// Pointer-down on the bare background
    pub fn background() -> Self {
        Self::default()
    }

    /// Whether the target is `node` or one of its descendants
    pub fn is_within(&self, node: NodeId) -> bool {
        self.path.contains(&node)
    }
}

type Listener = Arc<dyn Fn(&PointerDown) + Send + Sync>;

#[derive(Default)]
struct HubInner {
    next_key: u64,
    listeners: BTreeMap<u64, Listener>,
}

/// Fan-out point for pointer-down events.
///
/// Cloning yields another handle to the same hub.
#[derive(Clone, Default)]
pub struct PointerHub {
    inner: Arc<Mutex<HubInner>>,
}

fn lock(inner: &Mutex<HubInner>) -> MutexGuard<'_, HubInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl PointerHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned
    /// subscription is dropped.
    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn subscribe(
        &self,
        listener: impl Fn(&PointerDown) + Send + Sync + 'static,
    ) -> PointerSubscription {
        let mut inner = lock(&self.inner);
        let key = inner.next_key;
        inner.next_key += 1;
        inner.listeners.insert(key, Arc::new(listener));
        PointerSubscription {
            hub: Arc::downgrade(&self.inner),
            key,
        }
    }

    /// Deliver an event to every registered listener
    pub fn dispatch(&self, event: &PointerDown) {
        // Snapshot so listeners may subscribe or unsubscribe while running
        let listeners: Vec<Listener> = lock(&self.inner).listeners.values().cloned().collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }
}

/// Registration handle returned by [`PointerHub::subscribe`]
pub struct PointerSubscription {
    hub: Weak<Mutex<HubInner>>,
    key: u64,
}

impl Drop for PointerSubscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            lock(&hub).listeners.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_dispatch_reaches_listener_until_dropped() {
        let hub = PointerHub::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let sub = hub.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hub.listener_count(), 1);

        hub.dispatch(&PointerDown::background());
        drop(sub);
        hub.dispatch(&PointerDown::background());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_hub_is_harmless() {
        let hub = PointerHub::new();
        let sub = hub.subscribe(|_| {});
        drop(hub);
        drop(sub);
    }

    #[test]
    fn test_is_within_checks_path() {
        let root = NodeId::next();
        let child = NodeId::next();
        let other = NodeId::next();
        assert!(PointerDown::on(vec![root, child]).is_within(root));
        assert!(!PointerDown::on(vec![other]).is_within(root));
        assert!(!PointerDown::background().is_within(root));
    }
}
