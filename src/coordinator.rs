//! Move coordinator: one card move, end to end.
//!
//! SYSTEM CONTEXT
//! ==============
//! A drag-and-drop gesture (or an explicit command) produces a
//! [`MoveIntent`]. The coordinator locates the card, asks the resolver
//! whether the move escalates or de-escalates, persists that decision with
//! the remote authority, and only after confirmation touches the board.
//!
//! DESIGN
//! ======
//! Each move goes Pending -> Committed | Rejected. Under the default
//! [`RejectionPolicy::Restore`] the card stays at its origin while Pending;
//! the classification runs against the store's current content and the
//! board is mutated once, atomically, on commit. A rejected move therefore
//! leaves the card exactly where it was. [`RejectionPolicy::Detach`] detaches
//! the card before the remote call and re-inserts it only on commit; a
//! rejected card stays off the board until the next full refresh.
//!
//! Moves of different cards may run concurrently. A second move of a card
//! that is still Pending is refused.
//!
//! ERROR HANDLING
//! ==============
//! A missing card is logged only; nothing changed. Resolution failures and
//! rejected or failed remote calls raise an operator notification and are
//! returned to the caller. No retry is attempted.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::board::{BoardStore, Placement, StoreError};
use crate::escalation::{self, Direction, MoveIntent, Resolution, ResolutionError};
use crate::notify::{Notifications, Priority};
use crate::remote::{RemoteAuthority, RemoteError};

pub const ESCALATION_FAILED: &str = "Errore durante l'escalation";
pub const INVALID_DESTINATION: &str = "Destinazione non valida";

// =============================================================================
// TYPES
// =============================================================================

/// What happens to a card whose move the backend refuses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RejectionPolicy {
    /// The card never leaves its origin until the move commits.
    #[default]
    Restore,
    /// The card is detached before the remote call and stays detached on
    /// rejection until the board is refreshed.
    Detach,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The card was dropped where it already was; nothing was sent.
    Noop,
    Committed { from: Placement, to: Placement, direction: Direction },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("card not found: {0}")]
    CardNotFound(String),
    #[error("card {0} already has a move in flight")]
    AlreadyPending(String),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("escalation rejected for card {card_id}")]
    Rejected { card_id: String, cause: Option<RemoteError> },
    #[error("confirmed move could not be applied: {0}")]
    Store(#[from] StoreError),
}

// =============================================================================
// COORDINATOR
// =============================================================================

#[derive(Clone)]
pub struct MoveCoordinator {
    store: BoardStore,
    remote: Arc<dyn RemoteAuthority>,
    notifications: Notifications,
    policy: RejectionPolicy,
    pending: Arc<Mutex<HashSet<String>>>,
}

impl MoveCoordinator {
    #[must_use]
    pub fn new(store: BoardStore, remote: Arc<dyn RemoteAuthority>, notifications: Notifications) -> Self {
        Self { store, remote, notifications, policy: RejectionPolicy::default(), pending: Arc::default() }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RejectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn policy(&self) -> RejectionPolicy {
        self.policy
    }

    /// Whether `card_id` has a move awaiting confirmation.
    #[must_use]
    pub fn is_pending(&self, card_id: &str) -> bool {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).contains(card_id)
    }

    /// Run one move to completion.
    ///
    /// # Errors
    ///
    /// - [`MoveError::CardNotFound`] if the card is not on the board.
    /// - [`MoveError::AlreadyPending`] if the card is already being moved.
    /// - [`MoveError::Resolution`] if the destination cannot be resolved.
    /// - [`MoveError::Rejected`] if the backend refused or the call failed.
    /// - [`MoveError::Store`] if the destination vanished before commit.
    pub async fn move_card(&self, intent: MoveIntent) -> Result<MoveOutcome, MoveError> {
        let Some(_pending) = PendingMove::acquire(&self.pending, &intent.card_id) else {
            warn!(card_id = %intent.card_id, "move already in flight");
            return Err(MoveError::AlreadyPending(intent.card_id));
        };

        let Some(located) = self.store.find(&intent.card_id) else {
            warn!(card_id = %intent.card_id, "card not found in any lane");
            return Err(MoveError::CardNotFound(intent.card_id));
        };

        let resolution = self
            .store
            .read(|lanes| escalation::resolve(lanes, &located.card, &located.placement, &intent.lane, intent.section));
        let (destination, payload) = match resolution {
            Ok(Resolution::Noop) => {
                debug!(card_id = %intent.card_id, placement = %located.placement, "no move occurred");
                return Ok(MoveOutcome::Noop);
            }
            Ok(Resolution::Move { destination, payload }) => (destination, payload),
            Err(err) => {
                self.notifications.push(format!("{INVALID_DESTINATION}: {err}"), Priority::Error);
                return Err(err.into());
            }
        };

        if self.policy == RejectionPolicy::Detach {
            self.store.remove(&intent.card_id);
        }

        let direction = payload.direction;
        debug!(
            card_id = %intent.card_id,
            from = %located.placement,
            to = %destination,
            direction = direction.as_str(),
            "escalation pending"
        );

        let cause = match self.remote.escalate(&payload).await {
            Ok(true) => None,
            Ok(false) => Some(None),
            Err(err) => Some(Some(err)),
        };
        if let Some(cause) = cause {
            warn!(
                card_id = %intent.card_id,
                event = payload.event_number,
                error = cause.as_ref().map(ToString::to_string),
                "escalation rejected"
            );
            self.notifications.push(ESCALATION_FAILED, Priority::Error);
            return Err(MoveError::Rejected { card_id: intent.card_id, cause });
        }

        if let Err(err) = self.store.relocate(located.card, &destination) {
            warn!(card_id = %intent.card_id, error = %err, "confirmed move could not be applied");
            self.notifications.push(ESCALATION_FAILED, Priority::Error);
            return Err(err.into());
        }

        info!(
            card_id = %intent.card_id,
            event = payload.event_number,
            to = %destination,
            direction = direction.as_str(),
            "escalation committed"
        );
        Ok(MoveOutcome::Committed { from: located.placement, to: destination, direction })
    }
}

/// Marks a card as Pending for as long as it is held.
struct PendingMove {
    pending: Arc<Mutex<HashSet<String>>>,
    card_id: String,
}

impl PendingMove {
    fn acquire(pending: &Arc<Mutex<HashSet<String>>>, card_id: &str) -> Option<Self> {
        let inserted = pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(card_id.to_owned());
        inserted.then(|| Self { pending: Arc::clone(pending), card_id: card_id.to_owned() })
    }
}

impl Drop for PendingMove {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.card_id);
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod coordinator_test;
