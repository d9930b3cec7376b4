//! Live channel: topic subscriptions over a persistent push connection.
//!
//! DESIGN
//! ======
//! The core depends on [`LiveChannel`] only. A channel exposes its
//! connection state as a `watch` value and routes every published message to
//! the handlers registered for its topic. Handlers for one topic are additive
//! and run in registration order. Registration returns a [`Subscription`]
//! guard; dropping it removes exactly that handler.
//!
//! [`TopicRegistry`] is the handler table shared by every implementation. It
//! never holds its lock while a handler runs, so a handler may subscribe or
//! unsubscribe without deadlocking the dispatcher.

pub mod merge;
pub mod merge_parse;
pub mod socket;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::watch;

pub use merge::LiveMerge;
pub use merge_parse::MalformedPushMessage;
pub use socket::SocketChannel;

/// Callback invoked with the parsed payload of a published message.
pub type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Connected,
    Disconnecting,
    Disconnected,
}

impl ChannelState {
    #[must_use]
    pub fn is_down(self) -> bool {
        matches!(self, Self::Disconnecting | Self::Disconnected)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
            Self::Disconnected => "disconnected",
        };
        f.write_str(label)
    }
}

/// Push transport consumed by the live-update merge.
pub trait LiveChannel: Send + Sync {
    /// Start connecting. Calling it again while running has no effect.
    fn connect(&self);

    fn state(&self) -> ChannelState;

    fn watch_state(&self) -> watch::Receiver<ChannelState>;

    /// Register `handler` for `topic`. The handler stays registered until
    /// the returned guard is dropped or cancelled.
    fn subscribe(&self, topic: &str, handler: Handler) -> Subscription;
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Guard for one registered handler.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    topic: String,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self { topic: topic.into(), cancel: Some(Box::new(cancel)) }
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Unsubscribe now.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("topic", &self.topic).finish_non_exhaustive()
    }
}

// =============================================================================
// TOPIC REGISTRY
// =============================================================================

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    topics: HashMap<String, Vec<(u64, Handler)>>,
}

/// Handler table keyed by topic.
#[derive(Clone, Default)]
pub struct TopicRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl TopicRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a handler. Returns its id and whether it is the first
    /// handler for the topic.
    pub fn add(&self, topic: &str, handler: Handler) -> (u64, bool) {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        let handlers = inner.topics.entry(topic.to_owned()).or_default();
        handlers.push((id, handler));
        (id, handlers.len() == 1)
    }

    /// Remove one handler. Returns `true` when the topic has no handlers
    /// left and was dropped from the table.
    pub fn remove(&self, topic: &str, id: u64) -> bool {
        let mut inner = self.lock();
        let Some(handlers) = inner.topics.get_mut(topic) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        if handlers.len() == before || !handlers.is_empty() {
            return false;
        }
        inner.topics.remove(topic);
        true
    }

    /// Topics with at least one handler, sorted.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.lock().topics.keys().cloned().collect();
        topics.sort();
        topics
    }

    #[must_use]
    pub fn handler_count(&self, topic: &str) -> usize {
        self.lock().topics.get(topic).map_or(0, Vec::len)
    }

    /// Run every handler for `topic` in registration order. Returns how many
    /// ran.
    pub fn dispatch(&self, topic: &str, payload: &Value) -> usize {
        let handlers: Vec<Handler> = self
            .lock()
            .topics
            .get(topic)
            .map(|handlers| handlers.iter().map(|(_, handler)| Arc::clone(handler)).collect())
            .unwrap_or_default();
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }
}

#[cfg(test)]
pub mod test_helpers {
    use std::sync::{Arc, Mutex};

    use serde_json::Value;
    use tokio::sync::watch;

    use super::{ChannelState, Handler, LiveChannel, Subscription, TopicRegistry};

    /// In-memory channel. Tests publish directly and drive state changes.
    pub struct FakeChannel {
        pub registry: TopicRegistry,
        pub state: watch::Sender<ChannelState>,
        pub connects: Mutex<usize>,
    }

    impl FakeChannel {
        pub fn new(initial: ChannelState) -> Arc<Self> {
            let (state, _) = watch::channel(initial);
            Arc::new(Self { registry: TopicRegistry::new(), state, connects: Mutex::new(0) })
        }

        pub fn publish(&self, topic: &str, payload: &Value) -> usize {
            self.registry.dispatch(topic, payload)
        }

        pub fn set_state(&self, state: ChannelState) {
            self.state.send_replace(state);
        }
    }

    impl LiveChannel for FakeChannel {
        fn connect(&self) {
            *self.connects.lock().unwrap() += 1;
        }

        fn state(&self) -> ChannelState {
            *self.state.borrow()
        }

        fn watch_state(&self) -> watch::Receiver<ChannelState> {
            self.state.subscribe()
        }

        fn subscribe(&self, topic: &str, handler: Handler) -> Subscription {
            let (id, _) = self.registry.add(topic, handler);
            let registry = self.registry.clone();
            let owned = topic.to_owned();
            Subscription::new(topic, move || {
                registry.remove(&owned, id);
            })
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
