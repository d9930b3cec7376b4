//! Live-update merge: apply pushed changes to a mounted board.
//!
//! SYSTEM CONTEXT
//! ==============
//! Attached to one [`BoardStore`] for one dispatch center. Completion updates
//! overwrite card counters in place; overview signals and reconnects trigger
//! a full re-fetch that replaces the board.
//!
//! DESIGN
//! ======
//! Channel handlers never touch the store. They parse their payload and
//! queue a [`MergeCommand`]; a single worker task drains the queue in arrival
//! order, so commands are applied exactly in delivery order and a refresh
//! that awaits the backend never interleaves with a later completion update.
//! Completion updates are field overwrites, so re-delivery is harmless.
//!
//! Re-subscription after a reconnect is the channel's job: registrations
//! outlive connections. The merge only observes the state transition and
//! re-fetches once, since nothing missed while offline is replayed. A channel
//! that is not yet Connected at attach time counts as offline, so the first
//! connection also re-fetches.
//!
//! ERROR HANDLING
//! ==============
//! A malformed payload is logged by the handler that received it and
//! dropped; other handlers and later messages are unaffected.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::merge_parse::parse_completion_update;
use super::{ChannelState, Handler, LiveChannel, Subscription};
use crate::board::{BoardStore, Completion};
use crate::remote::{RemoteAuthority, load_board};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeCommand {
    ApplyCompletion { event: u64, completion: Completion },
    Refresh { reason: RefreshReason },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshReason {
    OverviewChanged,
    Reconnected,
}

impl RefreshReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OverviewChanged => "overview changed",
            Self::Reconnected => "reconnected",
        }
    }
}

/// Whether a state transition ends an outage.
#[must_use]
pub fn is_recovery(was_down: bool, now: ChannelState) -> bool {
    was_down && now == ChannelState::Connected
}

// =============================================================================
// MERGE
// =============================================================================

pub struct LiveMerge {
    subscriptions: Vec<Subscription>,
    worker: JoinHandle<()>,
    watcher: JoinHandle<()>,
}

impl LiveMerge {
    /// Subscribe the board for `center` to its topics and start merging.
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach(
        channel: &dyn LiveChannel,
        store: BoardStore,
        remote: Arc<dyn RemoteAuthority>,
        center: impl Into<String>,
    ) -> Self {
        let center = center.into();
        let (commands, queue) = mpsc::unbounded_channel();

        let subscriptions = vec![
            channel.subscribe(&wire::central_topic(&center), refresh_handler(&commands)),
            channel.subscribe(wire::TASK_COMPLETION_MAP_UPDATE, completion_handler(&commands)),
            channel.subscribe(wire::EVENT_UPDATES, refresh_handler(&commands)),
        ];

        let watcher = tokio::spawn(watch_reconnects(channel.watch_state(), commands));
        let worker = tokio::spawn(run_worker(queue, store, remote, center.clone()));
        info!(%center, "live merge attached");

        Self { subscriptions, worker, watcher }
    }

    /// Unsubscribe and stop merging. Commands still queued are discarded.
    pub fn detach(self) {
        drop(self);
    }
}

impl Drop for LiveMerge {
    fn drop(&mut self) {
        self.subscriptions.clear();
        self.watcher.abort();
        self.worker.abort();
        debug!("live merge detached");
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

fn completion_handler(commands: &mpsc::UnboundedSender<MergeCommand>) -> Handler {
    let commands = commands.clone();
    Arc::new(move |payload: &Value| match parse_completion_update(payload) {
        Ok(pairs) => {
            for (event, completion) in pairs {
                let _ = commands.send(MergeCommand::ApplyCompletion { event, completion });
            }
        }
        Err(err) => warn!(topic = wire::TASK_COMPLETION_MAP_UPDATE, error = %err, "ignoring malformed push message"),
    })
}

fn refresh_handler(commands: &mpsc::UnboundedSender<MergeCommand>) -> Handler {
    let commands = commands.clone();
    Arc::new(move |_: &Value| {
        let _ = commands.send(MergeCommand::Refresh { reason: RefreshReason::OverviewChanged });
    })
}

// =============================================================================
// TASKS
// =============================================================================

async fn watch_reconnects(
    mut state: watch::Receiver<ChannelState>,
    commands: mpsc::UnboundedSender<MergeCommand>,
) {
    // Not yet Connected at attach counts as an outage.
    let mut was_down = *state.borrow_and_update() != ChannelState::Connected;
    while state.changed().await.is_ok() {
        let now = *state.borrow_and_update();
        if is_recovery(was_down, now) {
            info!("live channel recovered; re-syncing board");
            if commands.send(MergeCommand::Refresh { reason: RefreshReason::Reconnected }).is_err() {
                return;
            }
        }
        if now.is_down() {
            was_down = true;
        } else if now == ChannelState::Connected {
            was_down = false;
        }
    }
}

async fn run_worker(
    mut queue: mpsc::UnboundedReceiver<MergeCommand>,
    store: BoardStore,
    remote: Arc<dyn RemoteAuthority>,
    center: String,
) {
    while let Some(command) = queue.recv().await {
        match command {
            MergeCommand::ApplyCompletion { event, completion } => {
                let matched = store.update_completion(event, completion);
                debug!(
                    event,
                    completed = completion.completed,
                    total = completion.total,
                    matched,
                    "completion merged"
                );
            }
            MergeCommand::Refresh { reason } => {
                let lanes = load_board(remote.as_ref(), &center).await;
                store.initialize(lanes);
                info!(%center, reason = reason.as_str(), "board refreshed");
            }
        }
    }
}

#[cfg(test)]
#[path = "merge_test.rs"]
mod merge_test;
