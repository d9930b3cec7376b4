//! Swimlane board model, store, and projections.

pub mod aggregate;
pub mod scroll;
pub mod store;
pub mod transform;
pub mod types;

pub use store::{BoardStore, Located, StoreError};
pub use types::{Card, Completion, Lane, LaneKind, Placement, Section, SectionId, Severity, default_lanes};

#[cfg(test)]
pub mod test_helpers {
    use super::types::{Card, Lane, SectionId, default_lanes};

    pub fn card(id: &str, event: u64) -> Card {
        Card {
            id: id.to_owned(),
            event,
            location: "Como".to_owned(),
            location_detail: String::new(),
            kind: "stradale".to_owned(),
            central_id: None,
            completion: None,
        }
    }

    pub fn card_in(id: &str, event: u64, center: &str) -> Card {
        Card { central_id: Some(center.to_owned()), ..card(id, event) }
    }

    /// Allarme holds `c2` (200), Emergenza holds `c1` (100), Incidente/rossa
    /// holds `c3` (300).
    pub fn sample_board() -> Vec<Lane> {
        let mut lanes = default_lanes();
        lanes[0].cards.push(card("c2", 200));
        lanes[1].cards.push(card("c1", 100));
        if let Some(rossa) = lanes[2].section_mut(SectionId::Rossa) {
            rossa.cards.push(card("c3", 300));
        }
        lanes
    }
}
