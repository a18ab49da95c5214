//! Synchronous pub/sub event bus
//!
//! One handler list per event type, at most 256 event types. `publish`
//! invokes every handler in subscription order, synchronously, on the
//! caller's thread. The bus has no interaction with entity storage.

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

/// Maximum number of distinct event types.
pub const MAX_EVENT_TYPES: usize = 256;

type Handler = Box<dyn FnMut(&dyn Any)>;

/// Central event bus for pub/sub communication
pub struct EventBus {
    handlers: FxHashMap<TypeId, Vec<Handler>>,
    published: u64,
}

impl EventBus {
    /// Create new event bus
    pub fn new() -> Self {
        Self {
            handlers: FxHashMap::default(),
            published: 0,
        }
    }

    /// Subscribe to events of type `E`. Handlers run in subscription order.
    ///
    /// # Panics
    /// Panics when a 257th distinct event type is introduced.
    pub fn subscribe<E: 'static>(&mut self, mut handler: impl FnMut(&E) + 'static) {
        let type_id = TypeId::of::<E>();
        if !self.handlers.contains_key(&type_id) && self.handlers.len() >= MAX_EVENT_TYPES {
            panic!("event type limit exceeded (max {MAX_EVENT_TYPES})");
        }

        self.handlers.entry(type_id).or_default().push(Box::new(
            move |event: &dyn Any| {
                if let Some(event) = event.downcast_ref::<E>() {
                    handler(event);
                }
            },
        ));
    }

    /// Invoke every handler subscribed to `E`, in subscription order, on the
    /// caller's thread.
    pub fn publish<E: 'static>(&mut self, event: &E) {
        if let Some(handlers) = self.handlers.get_mut(&TypeId::of::<E>()) {
            for handler in handlers.iter_mut() {
                handler(event);
            }
        }
        self.published += 1;
    }

    /// Get subscriber count for event type
    pub fn subscriber_count<E: 'static>(&self) -> usize {
        self.handlers
            .get(&TypeId::of::<E>())
            .map(|handlers| handlers.len())
            .unwrap_or(0)
    }

    /// Number of distinct event types with at least one subscriber.
    pub fn event_type_count(&self) -> usize {
        self.handlers.len()
    }

    /// Total publish calls so far.
    pub fn published_count(&self) -> u64 {
        self.published
    }

    /// Remove all subscribers
    pub fn clear_subscribers(&mut self) {
        self.handlers.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
