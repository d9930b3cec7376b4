//! Board store: the single owner of lane, section, and card membership.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `BoardStore` backs one mounted assessment view. The move coordinator
//! places and removes cards; the live-update merge overwrites completion
//! counters and replaces the whole board on refresh. Nothing else mutates it.
//!
//! DESIGN
//! ======
//! The store is a cheap `Clone` handle over shared state. Every mutation runs
//! under one lock acquisition, so a concurrent reader never observes a
//! half-updated lane. Each mutation bumps a revision counter published on a
//! `watch` channel, including completion updates that matched no card, so
//! observers can always diff by revision.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use super::types::{Card, Completion, Lane, Placement, SectionId};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("lane not found: {0}")]
    LaneNotFound(String),
    #[error("section {section} not found in lane {lane_id}")]
    SectionNotFound { lane_id: String, section: SectionId },
}

/// A card together with the placement it was found at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub card: Card,
    pub placement: Placement,
}

#[derive(Clone)]
pub struct BoardStore {
    lanes: Arc<Mutex<Vec<Lane>>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardStore {
    /// Create an empty store with no lanes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lanes(Vec::new())
    }

    #[must_use]
    pub fn with_lanes(lanes: Vec<Lane>) -> Self {
        let (revision, _) = watch::channel(0);
        Self { lanes: Arc::new(Mutex::new(lanes)), revision: Arc::new(revision) }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Lane>> {
        self.lanes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Clone the current board.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Lane> {
        self.lock().clone()
    }

    /// Run `f` against the current board without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&[Lane]) -> R) -> R {
        f(&self.lock())
    }

    /// Current mutation revision.
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Watch the mutation revision.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Locate the first card with `card_id`, by lane order then section order.
    #[must_use]
    pub fn find(&self, card_id: &str) -> Option<Located> {
        let lanes = self.lock();
        find_in(&lanes, card_id).map(|(card, placement)| Located { card: card.clone(), placement })
    }

    /// Number of places `card_id` currently appears.
    #[must_use]
    pub fn occurrences(&self, card_id: &str) -> usize {
        self.lock()
            .iter()
            .flat_map(Lane::all_cards)
            .filter(|card| card.id == card_id)
            .count()
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Replace the entire board content.
    pub fn initialize(&self, lanes: Vec<Lane>) {
        *self.lock() = lanes;
        self.bump();
    }

    /// Detach the card `find` would locate. Returns `None` if absent.
    pub fn remove(&self, card_id: &str) -> Option<Located> {
        let removed = remove_from(&mut self.lock(), card_id);
        if removed.is_some() {
            self.bump();
        }
        removed
    }

    /// Append `card` to the target lane, or to one of its sections.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lane or section does not exist; the
    /// store is left unchanged.
    pub fn insert(&self, card: Card, placement: &Placement) -> Result<(), StoreError> {
        insert_into(&mut self.lock(), card, placement)?;
        self.bump();
        Ok(())
    }

    /// Move `card` to `placement` in one step.
    ///
    /// Every existing copy of the card id is removed before the insert, so a
    /// relocation landing after a full refresh still leaves exactly one copy.
    /// The live copy is preferred over `card` when present, keeping any
    /// completion counters merged since the move started.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the destination does not exist; the store is
    /// left unchanged.
    pub fn relocate(&self, card: Card, placement: &Placement) -> Result<(), StoreError> {
        let mut lanes = self.lock();
        check_placement(&lanes, placement)?;

        let mut live = None;
        while let Some(located) = remove_from(&mut lanes, &card.id) {
            live.get_or_insert(located.card);
        }
        insert_into(&mut lanes, live.unwrap_or(card), placement)?;
        drop(lanes);

        self.bump();
        Ok(())
    }

    /// Overwrite the completion counters of every card for `event`.
    ///
    /// Returns how many cards matched. The revision is bumped even when no
    /// card matched.
    pub fn update_completion(&self, event: u64, completion: Completion) -> usize {
        let matched = for_each_event_card(&mut self.lock(), event, |card| card.completion = Some(completion));
        self.bump();
        matched
    }
}

// =============================================================================
// BOARD HELPERS
// =============================================================================

fn find_in<'a>(lanes: &'a [Lane], card_id: &str) -> Option<(&'a Card, Placement)> {
    for lane in lanes {
        if let Some(card) = lane.cards.iter().find(|card| card.id == card_id) {
            return Some((card, Placement::lane(lane.id.clone())));
        }
        for section in lane.sections.iter().flatten() {
            if let Some(card) = section.cards.iter().find(|card| card.id == card_id) {
                return Some((card, Placement::section(lane.id.clone(), section.id)));
            }
        }
    }
    None
}

fn remove_from(lanes: &mut [Lane], card_id: &str) -> Option<Located> {
    for lane in lanes.iter_mut() {
        if let Some(idx) = lane.cards.iter().position(|card| card.id == card_id) {
            let card = lane.cards.remove(idx);
            return Some(Located { card, placement: Placement::lane(lane.id.clone()) });
        }
        for section in lane.sections.iter_mut().flatten() {
            if let Some(idx) = section.cards.iter().position(|card| card.id == card_id) {
                let card = section.cards.remove(idx);
                return Some(Located { card, placement: Placement::section(lane.id.clone(), section.id) });
            }
        }
    }
    None
}

fn check_placement(lanes: &[Lane], placement: &Placement) -> Result<(), StoreError> {
    let lane = lanes
        .iter()
        .find(|lane| lane.id == placement.lane_id)
        .ok_or_else(|| StoreError::LaneNotFound(placement.lane_id.clone()))?;
    if let Some(section) = placement.section
        && lane.section(section).is_none()
    {
        return Err(StoreError::SectionNotFound { lane_id: lane.id.clone(), section });
    }
    Ok(())
}

fn insert_into(lanes: &mut [Lane], card: Card, placement: &Placement) -> Result<(), StoreError> {
    let lane = lanes
        .iter_mut()
        .find(|lane| lane.id == placement.lane_id)
        .ok_or_else(|| StoreError::LaneNotFound(placement.lane_id.clone()))?;
    match placement.section {
        Some(section_id) => {
            let lane_id = lane.id.clone();
            let section = lane
                .section_mut(section_id)
                .ok_or(StoreError::SectionNotFound { lane_id, section: section_id })?;
            section.cards.push(card);
        }
        None => lane.cards.push(card),
    }
    Ok(())
}

fn for_each_event_card(lanes: &mut [Lane], event: u64, mut apply: impl FnMut(&mut Card)) -> usize {
    let mut matched = 0;
    for lane in lanes.iter_mut() {
        let sections = lane.sections.iter_mut().flatten().flat_map(|section| section.cards.iter_mut());
        for card in lane.cards.iter_mut().chain(sections) {
            if card.event == event {
                apply(card);
                matched += 1;
            }
        }
    }
    matched
}

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;
