//! Per-center projection of a board for the read-only quadrant overview.
//!
//! DESIGN
//! ======
//! The quadrant screen shows one column per known dispatch center. Each
//! column is a flat list of display lanes: top-level lanes keep their name,
//! Incidente sections become lanes of their own (`Incidente - Rossa`, id
//! `3-rossa`) tagged with the section for colouring. Display lanes appear in
//! discovery order and only when they hold at least one card.

use serde::Serialize;

use super::types::{Card, Lane, LaneKind, SectionId};

/// Dispatch centers shown on the quadrant screen, in display order.
pub const KNOWN_CENTERS: [&str; 4] = ["SRA", "SRL", "SRM", "SRP"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuadrantLane {
    pub id: String,
    pub name: String,
    pub center: String,
    #[serde(skip)]
    pub kind: Option<LaneKind>,
    #[serde(rename = "swimlane", skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionId>,
    pub cards: Vec<Card>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CenterBoard {
    pub center: String,
    pub lanes: Vec<QuadrantLane>,
}

impl CenterBoard {
    #[must_use]
    pub fn empty(center: &str) -> Self {
        Self { center: center.to_owned(), lanes: Vec::new() }
    }

    /// Cards in display order across all lanes.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.lanes.iter().flat_map(|lane| lane.cards.iter())
    }

    #[must_use]
    pub fn card_count(&self) -> usize {
        self.lanes.iter().map(|lane| lane.cards.len()).sum()
    }

    fn lane_for(
        &mut self,
        id: String,
        name: String,
        kind: Option<LaneKind>,
        section: Option<SectionId>,
    ) -> &mut QuadrantLane {
        let idx = match self.lanes.iter().position(|lane| lane.name == name) {
            Some(idx) => idx,
            None => {
                let center = self.center.clone();
                self.lanes.push(QuadrantLane { id, name, center, kind, section, cards: Vec::new() });
                self.lanes.len() - 1
            }
        };
        &mut self.lanes[idx]
    }
}

/// Split a board into one [`CenterBoard`] per known center.
///
/// Always returns [`KNOWN_CENTERS`] in order. Cards whose center is missing
/// or unknown are dropped.
#[must_use]
pub fn aggregate_by_center(lanes: &[Lane]) -> Vec<CenterBoard> {
    let mut boards: Vec<CenterBoard> = KNOWN_CENTERS.iter().map(|center| CenterBoard::empty(center)).collect();

    for lane in lanes {
        let kind = lane.kind();
        for card in &lane.cards {
            if let Some(board) = board_for(&mut boards, card) {
                board
                    .lane_for(lane.id.clone(), lane.name.clone(), kind, None)
                    .cards
                    .push(card.clone());
            }
        }
        for section in lane.sections.iter().flatten() {
            for card in &section.cards {
                if let Some(board) = board_for(&mut boards, card) {
                    let id = format!("{}-{}", lane.id, section.id);
                    let name = format!("{} - {}", lane.name, section.name);
                    board.lane_for(id, name, kind, Some(section.id)).cards.push(card.clone());
                }
            }
        }
    }

    boards
}

/// Regroup every center's display lanes by severity kind.
#[must_use]
pub fn organize_by_kind(lanes: &[Lane]) -> Vec<(LaneKind, Vec<QuadrantLane>)> {
    let mut groups: Vec<(LaneKind, Vec<QuadrantLane>)> =
        LaneKind::ALL.into_iter().map(|kind| (kind, Vec::new())).collect();
    for board in aggregate_by_center(lanes) {
        for lane in board.lanes {
            if let Some(kind) = lane.kind
                && let Some((_, group)) = groups.iter_mut().find(|(group_kind, _)| *group_kind == kind)
            {
                group.push(lane);
            }
        }
    }
    groups
}

fn board_for<'a>(boards: &'a mut [CenterBoard], card: &Card) -> Option<&'a mut CenterBoard> {
    let center = card.central_id.as_deref()?;
    boards.iter_mut().find(|board| board.center == center)
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod aggregate_test;
