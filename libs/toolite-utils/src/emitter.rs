//! Topic-based event bus
//!
//! Handlers are snapshotted under the lock and invoked after it is released,
//! so a handler may subscribe, unsubscribe or emit on the same emitter.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Handle returned by [`Emitter::on`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Handler<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Event bus keyed by topic name, carrying payloads of type `P`
pub struct Emitter<P = serde_json::Value> {
    topics: RwLock<HashMap<String, Vec<(SubscriptionId, Handler<P>)>>>,
}

impl<P> Default for Emitter<P> {
    fn default() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
        }
    }
}

impl<P> fmt::Debug for Emitter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self.topics.read();
        let counts: HashMap<&str, usize> = topics
            .iter()
            .map(|(topic, handlers)| (topic.as_str(), handlers.len()))
            .collect();
        f.debug_struct("Emitter").field("topics", &counts).finish()
    }
}

impl<P> Emitter<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`
    pub fn on<F>(&self, topic: impl Into<String>, handler: F) -> SubscriptionId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        let topic = topic.into();
        let id = SubscriptionId::new();
        debug!("Subscribed {} to '{}'", id, topic);
        self.topics
            .write()
            .entry(topic)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut topics = self.topics.write();
        let mut removed = false;
        topics.retain(|_, handlers| {
            let before = handlers.len();
            handlers.retain(|(existing, _)| *existing != id);
            removed |= handlers.len() != before;
            !handlers.is_empty()
        });
        if removed {
            debug!("Unsubscribed {}", id);
        }
        removed
    }

    /// Remove every handler of `topic`
    pub fn off_topic(&self, topic: &str) -> usize {
        self.topics
            .write()
            .remove(topic)
            .map_or(0, |handlers| handlers.len())
    }

    /// Call every handler of `topic` in subscription order. Returns how many ran.
    pub fn emit(&self, topic: &str, payload: &P) -> usize {
        let handlers: Vec<Handler<P>> = match self.topics.read().get(topic) {
            Some(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => return 0,
        };
        trace!("Emitting '{}' to {} handler(s)", topic, handlers.len());
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    /// Number of handlers registered for `topic`
    pub fn listener_count(&self, topic: &str) -> usize {
        self.topics.read().get(topic).map_or(0, Vec::len)
    }

    /// Drop every subscription
    pub fn clear(&self) {
        self.topics.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_emit_reaches_topic_handlers_in_order() {
        let emitter: Emitter<u32> = Emitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b"] {
            let seen = Arc::clone(&seen);
            emitter.on("tick", move |n: &u32| seen.lock().push((tag, *n)));
        }
        let other = Arc::clone(&seen);
        emitter.on("other", move |n: &u32| other.lock().push(("other", *n)));

        assert_eq!(emitter.emit("tick", &7), 2);
        assert_eq!(*seen.lock(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_emit_unknown_topic() {
        let emitter: Emitter = Emitter::new();
        assert_eq!(emitter.emit("nobody", &serde_json::json!({"x": 1})), 0);
    }

    #[test]
    fn test_off_removes_single_subscription() {
        let emitter: Emitter<()> = Emitter::new();
        let first = emitter.on("t", |_| {});
        emitter.on("t", |_| {});

        assert!(emitter.off(first));
        assert!(!emitter.off(first));
        assert_eq!(emitter.listener_count("t"), 1);
        assert_eq!(emitter.emit("t", &()), 1);
    }

    #[test]
    fn test_off_topic_and_clear() {
        let emitter: Emitter<()> = Emitter::new();
        emitter.on("a", |_| {});
        emitter.on("a", |_| {});
        emitter.on("b", |_| {});

        assert_eq!(emitter.off_topic("a"), 2);
        assert_eq!(emitter.listener_count("a"), 0);

        emitter.clear();
        assert_eq!(emitter.emit("b", &()), 0);
    }

    #[test]
    fn test_handler_may_reenter_emitter() {
        let emitter: Arc<Emitter<u32>> = Arc::new(Emitter::new());
        let hits = Arc::new(Mutex::new(Vec::new()));

        let inner_hits = Arc::clone(&hits);
        emitter.on("inner", move |n: &u32| inner_hits.lock().push(*n));

        let bus = Arc::downgrade(&emitter);
        emitter.on("outer", move |n: &u32| {
            if let Some(bus) = bus.upgrade() {
                bus.emit("inner", &(n + 1));
                bus.on("late", |_| {});
            }
        });

        emitter.emit("outer", &1);
        assert_eq!(*hits.lock(), vec![2]);
        assert_eq!(emitter.listener_count("late"), 1);
    }
}
