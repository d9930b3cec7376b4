//! WebSocket implementation of [`LiveChannel`].
//!
//! SYSTEM CONTEXT
//! ==============
//! The dispatch backend exposes one push socket per console. Control traffic
//! (`subscribe`, `unsubscribe`, `get_topics`) and published topic messages
//! share it as JSON text frames; the heartbeat uses bare `ping`/`pong` text.
//!
//! DESIGN
//! ======
//! `connect()` spawns a supervisor task that owns the reconnect loop. Each
//! connection runs one `select!` loop over the outbound queue, the heartbeat
//! timer, the heartbeat deadline, and the inbound stream. On every (re)connect
//! all topics with at least one handler are subscribed again, so handlers
//! survive reconnects without re-registering.
//!
//! ERROR HANDLING
//! ==============
//! Transport and heartbeat failures end the current connection only; the
//! supervisor logs them, waits with doubling backoff, and reconnects.
//! Undecodable inbound frames are logged and dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at, sleep, sleep_until};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use wire::{ClientMessage, ServerMessage};

use super::{ChannelState, Handler, LiveChannel, Subscription, TopicRegistry};
use crate::config::LiveTimings;

#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket transport failed: {0}")]
    Transport(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("no heartbeat reply within {0:?}")]
    HeartbeatTimeout(Duration),
}

/// Next reconnect delay: doubled, capped at `max`.
#[must_use]
pub fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

// =============================================================================
// SHARED STATE
// =============================================================================

struct Shared {
    url: String,
    timings: LiveTimings,
    registry: TopicRegistry,
    state: watch::Sender<ChannelState>,
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    server_topics: Mutex<Vec<String>>,
}

impl Shared {
    fn outbound(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<Message>>> {
        self.outbound.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: ChannelState) {
        let changed = self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
        if changed {
            debug!(url = %self.url, state = %next, "live channel state");
        }
    }

    /// Queue a control message on the current connection, if any.
    fn send_control(&self, message: &ClientMessage) {
        let text = match wire::encode_client_message(message) {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "control message encode failed");
                return;
            }
        };
        if let Some(tx) = self.outbound().as_ref() {
            let _ = tx.send(Message::text(text));
        }
    }

    fn handle_text(&self, text: &str) {
        match wire::decode_server_message(text) {
            Ok(ServerMessage::Pong) => {}
            Ok(ServerMessage::SubscribeAck { topic, success }) => {
                if success {
                    debug!(%topic, "subscribed");
                } else {
                    warn!(%topic, "subscription refused by server");
                }
            }
            Ok(ServerMessage::UnsubscribeAck { topic, success }) => {
                debug!(%topic, success, "unsubscribed");
            }
            Ok(ServerMessage::Topics(topics)) => {
                debug!(?topics, "server topic list");
                *self.server_topics.lock().unwrap_or_else(PoisonError::into_inner) = topics;
            }
            Ok(ServerMessage::Publish { topics, payload }) => {
                for topic in topics {
                    if self.registry.dispatch(&topic, &payload) == 0 {
                        debug!(%topic, "message for topic without handlers");
                    }
                }
            }
            Err(err) => warn!(error = %err, "dropping undecodable live message"),
        }
    }

    /// Serve one open connection until it closes or fails.
    async fn serve<S>(&self, stream: S) -> Result<(), SocketError>
    where
        S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
            + Unpin,
    {
        let (mut sink, mut source) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        *self.outbound() = Some(tx);
        self.set_state(ChannelState::Connected);

        for topic in self.registry.topics() {
            self.send_control(&ClientMessage::Subscribe { topic });
        }
        self.send_control(&ClientMessage::GetTopics);

        let period = self.timings.heartbeat_interval;
        let mut heartbeat = interval_at(Instant::now() + period, period);
        let mut deadline: Option<Instant> = None;

        loop {
            let pending_deadline = deadline;
            let expiry = async move {
                match pending_deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                Some(message) = rx.recv() => {
                    sink.send(message).await.map_err(|e| SocketError::Transport(Box::new(e)))?;
                }
                _ = heartbeat.tick() => {
                    let ping = Message::text(wire::PING.to_owned());
                    sink.send(ping).await.map_err(|e| SocketError::Transport(Box::new(e)))?;
                    deadline.get_or_insert(Instant::now() + self.timings.heartbeat_timeout);
                }
                () = expiry => {
                    let _ = sink.close().await;
                    return Err(SocketError::HeartbeatTimeout(self.timings.heartbeat_timeout));
                }
                inbound = source.next() => {
                    let Some(inbound) = inbound else {
                        return Ok(());
                    };
                    deadline = None;
                    match inbound.map_err(|e| SocketError::Transport(Box::new(e)))? {
                        Message::Text(text) => self.handle_text(text.as_str()),
                        Message::Close(_) => return Ok(()),
                        _ => {}
                    }
                }
            }
        }
    }
}

/// Reconnect loop; runs until aborted.
async fn supervise(shared: Arc<Shared>) {
    let mut backoff = shared.timings.reconnect_initial;
    loop {
        shared.set_state(ChannelState::Connecting);

        match connect_async(shared.url.as_str()).await {
            Ok((stream, _)) => {
                info!(url = %shared.url, "live channel connected");
                backoff = shared.timings.reconnect_initial;
                match shared.serve(stream).await {
                    Ok(()) => info!(url = %shared.url, "live channel closed"),
                    Err(err) => warn!(url = %shared.url, error = %err, "live channel dropped"),
                }
            }
            Err(err) => {
                let err = SocketError::Connect(Box::new(err));
                warn!(url = %shared.url, error = %err, "live channel connect failed");
            }
        }

        *shared.outbound() = None;
        shared.set_state(ChannelState::Disconnected);
        debug!(delay_ms = backoff.as_millis(), "live channel reconnect scheduled");
        sleep(backoff).await;
        backoff = next_backoff(backoff, shared.timings.reconnect_max);
    }
}

// =============================================================================
// CHANNEL
// =============================================================================

pub struct SocketChannel {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SocketChannel {
    #[must_use]
    pub fn new(url: impl Into<String>, timings: LiveTimings) -> Self {
        let (state, _) = watch::channel(ChannelState::Disconnected);
        let shared = Shared {
            url: url.into(),
            timings,
            registry: TopicRegistry::new(),
            state,
            outbound: Mutex::new(None),
            server_topics: Mutex::new(Vec::new()),
        };
        Self { shared: Arc::new(shared), task: Mutex::new(None) }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    /// Topics the server last reported for this connection.
    #[must_use]
    pub fn server_topics(&self) -> Vec<String> {
        self.shared.server_topics.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Stop the reconnect loop and close the socket.
    pub fn disconnect(&self) {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(task) = task else {
            return;
        };
        self.shared.set_state(ChannelState::Disconnecting);
        task.abort();
        *self.shared.outbound() = None;
        self.shared.set_state(ChannelState::Disconnected);
        info!(url = %self.shared.url, "live channel disconnected");
    }
}

impl Drop for SocketChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl LiveChannel for SocketChannel {
    /// Spawns the supervisor on the current tokio runtime.
    fn connect(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        *task = Some(tokio::spawn(supervise(Arc::clone(&self.shared))));
    }

    fn state(&self) -> ChannelState {
        *self.shared.state.borrow()
    }

    fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.shared.state.subscribe()
    }

    fn subscribe(&self, topic: &str, handler: Handler) -> Subscription {
        let (id, first) = self.shared.registry.add(topic, handler);
        if first {
            self.shared.send_control(&ClientMessage::Subscribe { topic: topic.to_owned() });
        }

        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let owned = topic.to_owned();
        Subscription::new(topic, move || {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            if shared.registry.remove(&owned, id) {
                shared.send_control(&ClientMessage::Unsubscribe { topic: owned });
            }
        })
    }
}

#[cfg(test)]
#[path = "socket_test.rs"]
mod socket_test;
