//! Pub/Sub Event Bus with explicit subscription lifetimes.
//!
//! Architecture:
//! - Components subscribe to event types with callbacks (immediate invocation)
//! - `subscribe()` returns a `SubscriptionId`; `unsubscribe(id)` removes exactly that callback
//! - `subscribe_scoped()` returns a `Subscription` guard that unsubscribes on drop,
//!   so a listener is removed on every exit path
//!
//! Callback order: FIFO (first-subscribed, first-called) within same event type.
//! Cross-type order undefined - don't rely on ordering between different event types.
//!
//! Callbacks run after the subscriber lock is released, so a handler may
//! subscribe or unsubscribe (including dropping its own guard) without deadlock.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use log::trace;

/// Marker trait for events. Events must be Send + Sync + 'static.
pub trait Event: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

// Blanket impl for all qualifying types
impl<T: Any + Send + Sync + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Type-erased callback
type Callback = Arc<dyn Fn(&dyn Any) + Send + Sync>;

type SubscriberMap = HashMap<TypeId, Vec<(SubscriptionId, Callback)>>;

/// Handle identifying one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Pub/Sub Event Bus.
///
/// Cloning shares the subscriber table, so hosts and components can each hold
/// a handle.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<RwLock<SubscriberMap>>,
    next_id: Arc<AtomicU64>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_types", &self.subscribers.read().map(|s| s.len()).unwrap_or(0))
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Subscribe to events of type E.
    ///
    /// Callback is invoked synchronously when emit() is called.
    /// Use Arc<Mutex<State>> in the callback for state mutations.
    ///
    /// # Example
    /// ```ignore
    /// let state = Arc::new(Mutex::new(MyState::default()));
    /// let state_clone = Arc::clone(&state);
    /// let id = event_bus.subscribe::<MyEvent, _>(move |e| {
    ///     state_clone.lock().unwrap().handle(e);
    /// });
    /// // later
    /// event_bus.unsubscribe(id);
    /// ```
    pub fn subscribe<E, F>(&self, callback: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let type_id = TypeId::of::<E>();
        let wrapped: Callback = Arc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                callback(event);
            }
        });
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(type_id)
            .or_default()
            .push((id, wrapped));
        trace!("EventBus: {:?} subscribed to {}", id, std::any::type_name::<E>());
        id
    }

    /// Subscribe and get a guard that unsubscribes when dropped.
    pub fn subscribe_scoped<E, F>(&self, callback: F) -> Subscription
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.subscribe::<E, F>(callback);
        Subscription {
            bus: self.clone(),
            id: Some(id),
        }
    }

    /// Remove one subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        let mut removed = false;
        subs.retain(|_, list| {
            let before = list.len();
            list.retain(|(sid, _)| *sid != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        if removed {
            trace!("EventBus: {:?} unsubscribed", id);
        }
        removed
    }

    /// Emit event: invoke all callbacks for its type immediately.
    pub fn emit<E: Event>(&self, event: E) {
        let type_id = TypeId::of::<E>();

        // Snapshot callbacks so handlers may (un)subscribe while running
        let callbacks: Vec<Callback> = match self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&type_id)
        {
            Some(list) => list.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
            None => return,
        };

        for cb in callbacks {
            cb(event.as_any());
        }
    }

    /// Clear subscribers for type E
    pub fn unsubscribe_all<E: Event>(&self) {
        self.subscribers.write().unwrap_or_else(|e| e.into_inner()).remove(&TypeId::of::<E>());
    }

    /// Clear all subscribers
    pub fn clear(&self) {
        self.subscribers.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Check if there are subscribers for event type E
    pub fn has_subscribers<E: Event>(&self) -> bool {
        self.subscriber_count::<E>() > 0
    }

    /// Number of live subscriptions for event type E
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<E>())
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

/// Scoped subscription: unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: EventBus,
    id: Option<SubscriptionId>,
}

impl Subscription {
    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    /// Unsubscribe now instead of at drop.
    pub fn cancel(&mut self) {
        if let Some(id) = self.id.take() {
            self.bus.unsubscribe(id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Debug)]
    struct TestEvent { value: i32 }

    #[derive(Clone, Debug)]
    struct OtherEvent;

    #[test]
    fn test_subscribe_emit_immediate() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);

        bus.subscribe::<TestEvent, _>(move |e| {
            c.fetch_add(e.value, Ordering::SeqCst);
        });

        bus.emit(TestEvent { value: 10 });
        assert_eq!(counter.load(Ordering::SeqCst), 10);

        bus.emit(TestEvent { value: 5 });
        assert_eq!(counter.load(Ordering::SeqCst), 15);

        // Unrelated type does not reach the callback
        bus.emit(OtherEvent);
        assert_eq!(counter.load(Ordering::SeqCst), 15);
    }

    #[test]
    fn test_multiple_subscribers_fifo() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        bus.subscribe::<TestEvent, _>(move |_| o1.lock().unwrap().push(1));
        let o2 = Arc::clone(&order);
        bus.subscribe::<TestEvent, _>(move |_| o2.lock().unwrap().push(2));

        bus.emit(TestEvent { value: 0 });
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_unsubscribe_by_id() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));

        let c1 = Arc::clone(&counter);
        let id1 = bus.subscribe::<TestEvent, _>(move |e| {
            c1.fetch_add(e.value, Ordering::SeqCst);
        });
        let c2 = Arc::clone(&counter);
        let _id2 = bus.subscribe::<TestEvent, _>(move |e| {
            c2.fetch_add(e.value * 100, Ordering::SeqCst);
        });

        assert!(bus.unsubscribe(id1));
        assert!(!bus.unsubscribe(id1));
        assert_eq!(bus.subscriber_count::<TestEvent>(), 1);

        bus.emit(TestEvent { value: 1 });
        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }

    /// Test: Guard removes its callback when dropped
    #[test]
    fn test_scoped_subscription_drop() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);

        {
            let _sub = bus.subscribe_scoped::<TestEvent, _>(move |e| {
                c.fetch_add(e.value, Ordering::SeqCst);
            });
            bus.emit(TestEvent { value: 3 });
            assert!(bus.has_subscribers::<TestEvent>());
        }

        bus.emit(TestEvent { value: 3 });
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(!bus.has_subscribers::<TestEvent>());
    }

    #[test]
    fn test_scoped_subscription_cancel() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe_scoped::<TestEvent, _>(|_| {});
        assert!(sub.id().is_some());
        sub.cancel();
        assert!(sub.id().is_none());
        assert_eq!(bus.subscriber_count::<TestEvent>(), 0);
        drop(sub);
    }

    /// Test: A handler can unsubscribe itself mid-emit
    #[test]
    fn test_unsubscribe_inside_callback() {
        let bus = EventBus::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicI32::new(0));

        let slot_cb = Arc::clone(&slot);
        let hits_cb = Arc::clone(&hits);
        let sub = bus.subscribe_scoped::<TestEvent, _>(move |_| {
            hits_cb.fetch_add(1, Ordering::SeqCst);
            slot_cb.lock().unwrap().take();
        });
        *slot.lock().unwrap() = Some(sub);

        bus.emit(TestEvent { value: 0 });
        bus.emit(TestEvent { value: 0 });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_all_and_clear() {
        let bus = EventBus::new();
        bus.subscribe::<TestEvent, _>(|_| {});
        bus.subscribe::<OtherEvent, _>(|_| {});

        bus.unsubscribe_all::<TestEvent>();
        assert!(!bus.has_subscribers::<TestEvent>());
        assert!(bus.has_subscribers::<OtherEvent>());

        bus.clear();
        assert!(!bus.has_subscribers::<OtherEvent>());
    }

    #[test]
    fn test_clones_share_table() {
        let bus = EventBus::new();
        let other = bus.clone();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);
        bus.subscribe::<TestEvent, _>(move |e| {
            c.fetch_add(e.value, Ordering::SeqCst);
        });
        other.emit(TestEvent { value: 7 });
        assert_eq!(counter.load(Ordering::SeqCst), 7);
    }
}
