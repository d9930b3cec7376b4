//! Mounted board views: one center's assessment board and the global
//! quadrant overview.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AssessmentView` is what an operator console mounts for the selected
//! center: it owns the board store, fetches the initial board, coordinates
//! moves, and (when a live channel is available) keeps the board current
//! through a [`LiveMerge`]. Tearing the view down drops its subscriptions.
//!
//! `GlobalOverview` backs the read-only four-quadrant screen. It is rebuilt
//! from a single fetch and keeps one auto-scroll cursor per quadrant.

use std::sync::Arc;

use tracing::info;

use crate::board::aggregate::{CenterBoard, KNOWN_CENTERS, aggregate_by_center};
use crate::board::scroll::QuadrantScroller;
use crate::board::{BoardStore, Lane};
use crate::coordinator::{MoveCoordinator, MoveError, MoveOutcome, RejectionPolicy};
use crate::escalation::MoveIntent;
use crate::live::{LiveChannel, LiveMerge};
use crate::notify::Notifications;
use crate::remote::{RemoteAuthority, load_board};

// =============================================================================
// ASSESSMENT VIEW
// =============================================================================

pub struct AssessmentView {
    center: String,
    store: BoardStore,
    remote: Arc<dyn RemoteAuthority>,
    coordinator: MoveCoordinator,
    merge: Option<LiveMerge>,
}

impl AssessmentView {
    /// Fetch the board for `center` and prepare it for moves.
    ///
    /// A failed fetch mounts the empty lane skeleton.
    pub async fn mount(
        center: impl Into<String>,
        remote: Arc<dyn RemoteAuthority>,
        notifications: Notifications,
        policy: RejectionPolicy,
    ) -> Self {
        let center = center.into();
        let store = BoardStore::new();
        store.initialize(load_board(remote.as_ref(), &center).await);
        let coordinator = MoveCoordinator::new(store.clone(), Arc::clone(&remote), notifications).with_policy(policy);
        info!(%center, "assessment view mounted");
        Self { center, store, remote, coordinator, merge: None }
    }

    /// Start merging live updates from `channel`. Replaces any previous
    /// attachment.
    pub fn attach_live(&mut self, channel: &dyn LiveChannel) {
        self.merge = None;
        self.merge = Some(LiveMerge::attach(channel, self.store.clone(), Arc::clone(&self.remote), &self.center));
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.merge.is_some()
    }

    #[must_use]
    pub fn center(&self) -> &str {
        &self.center
    }

    #[must_use]
    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    #[must_use]
    pub fn coordinator(&self) -> &MoveCoordinator {
        &self.coordinator
    }

    #[must_use]
    pub fn lanes(&self) -> Vec<Lane> {
        self.store.snapshot()
    }

    /// Run one coordinated move.
    ///
    /// # Errors
    ///
    /// See [`MoveCoordinator::move_card`].
    pub async fn move_card(&self, intent: MoveIntent) -> Result<MoveOutcome, MoveError> {
        self.coordinator.move_card(intent).await
    }

    /// Re-fetch and replace the whole board.
    pub async fn refresh(&self) {
        self.store.initialize(load_board(self.remote.as_ref(), &self.center).await);
    }

    /// Drop live subscriptions. The store handle stays usable by clones.
    pub fn teardown(mut self) {
        self.merge = None;
        info!(center = %self.center, "assessment view torn down");
    }
}

// =============================================================================
// GLOBAL OVERVIEW
// =============================================================================

pub struct GlobalOverview {
    boards: Vec<CenterBoard>,
    scrollers: Vec<QuadrantScroller>,
}

impl Default for GlobalOverview {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalOverview {
    /// Four empty quadrants in [`KNOWN_CENTERS`] order.
    #[must_use]
    pub fn new() -> Self {
        Self {
            boards: KNOWN_CENTERS.iter().map(|center| CenterBoard::empty(center)).collect(),
            scrollers: vec![QuadrantScroller::new(); KNOWN_CENTERS.len()],
        }
    }

    /// Rebuild every quadrant from one board and rewind the cursors.
    pub fn apply(&mut self, lanes: &[Lane]) {
        self.boards = aggregate_by_center(lanes);
        for scroller in &mut self.scrollers {
            scroller.reset();
        }
    }

    /// Fetch once and rebuild every quadrant. A failed fetch empties them.
    pub async fn refresh(&mut self, remote: &dyn RemoteAuthority, center: &str) {
        let lanes = load_board(remote, center).await;
        self.apply(&lanes);
    }

    #[must_use]
    pub fn boards(&self) -> &[CenterBoard] {
        &self.boards
    }

    #[must_use]
    pub fn board(&self, center: &str) -> Option<&CenterBoard> {
        self.boards.iter().find(|board| board.center == center)
    }

    /// Current cursor of each quadrant.
    #[must_use]
    pub fn cursors(&self) -> Vec<usize> {
        self.scrollers.iter().map(|scroller| scroller.index()).collect()
    }

    /// Advance every quadrant's cursor by one auto-scroll step.
    ///
    /// A quadrant shows `window` cards starting at its cursor; the rest count
    /// as hidden. Returns the new cursor per quadrant, `None` when empty.
    pub fn tick(&mut self, window: usize) -> Vec<Option<usize>> {
        self.boards
            .iter()
            .zip(self.scrollers.iter_mut())
            .map(|(board, scroller)| {
                let start = scroller.index();
                let end = start.saturating_add(window);
                scroller.advance(board.card_count(), |idx| idx >= start && idx < end)
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "assessment_test.rs"]
mod assessment_test;
