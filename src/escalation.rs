//! Escalation resolver: classify a card move and build its backend payload.
//!
//! DESIGN
//! ======
//! Pure decision logic over a board snapshot. Both sides of a move are mapped
//! onto the global severity order (Allarme < Emergenza < Bianca < Verde <
//! Gialla < Rossa). A destination on the Incidente lane always resolves to a
//! section, defaulting to bianca; a section requested on any other lane is
//! ignored. A move whose normalized destination equals the source placement
//! is a no-op. Otherwise a strictly higher destination escalates and anything
//! else de-escalates.
//!
//! ERROR HANDLING
//! ==============
//! Lookup failures surface as [`ResolutionError`] before any remote call is
//! made, so the caller can abort with the board untouched.

use serde::{Deserialize, Serialize};

use crate::board::{Card, Lane, LaneKind, Placement, SectionId};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Escalate,
    Deescalate,
}

impl Direction {
    /// Path segment of the escalation endpoint.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Escalate => "escalate",
            Self::Deescalate => "deescalate",
        }
    }
}

/// Body of the remote escalate/de-escalate call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalatePayload {
    pub event_number: u64,
    pub new_level: String,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_level: Option<SectionId>,
}

/// Outcome of resolving a move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Destination equals the current placement.
    Noop,
    /// The move must be confirmed remotely before it is applied.
    Move { destination: Placement, payload: EscalatePayload },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("unknown destination lane: {0}")]
    UnknownLane(String),
    #[error("card sits in unknown lane: {0}")]
    UnknownSourceLane(String),
    #[error("lane {lane_id} has no section {section}")]
    UnknownSection { lane_id: String, section: SectionId },
}

/// Requested relocation of one card. Consumed by the move coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveIntent {
    pub card_id: String,
    /// Destination lane id, or lane name matched case-insensitively.
    pub lane: String,
    pub section: Option<SectionId>,
}

impl MoveIntent {
    #[must_use]
    pub fn new(card_id: impl Into<String>, lane: impl Into<String>, section: Option<SectionId>) -> Self {
        Self { card_id: card_id.into(), lane: lane.into(), section }
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Find a lane by id, falling back to a case-insensitive name match.
#[must_use]
pub fn resolve_lane<'a>(lanes: &'a [Lane], key: &str) -> Option<&'a Lane> {
    let key = key.trim();
    lanes
        .iter()
        .find(|lane| lane.id == key)
        .or_else(|| lanes.iter().find(|lane| lane.name.eq_ignore_ascii_case(key)))
}

/// Normalize the requested destination against the board.
///
/// # Errors
///
/// Returns [`ResolutionError::UnknownLane`] when `lane_key` names no lane of
/// a known level, and [`ResolutionError::UnknownSection`] when the Incidente
/// lane lacks the requested section.
pub fn destination(
    lanes: &[Lane],
    lane_key: &str,
    section: Option<SectionId>,
) -> Result<(Placement, LaneKind), ResolutionError> {
    let lane = resolve_lane(lanes, lane_key).ok_or_else(|| ResolutionError::UnknownLane(lane_key.to_owned()))?;
    let kind = lane.kind().ok_or_else(|| ResolutionError::UnknownLane(lane_key.to_owned()))?;

    let section = match kind {
        LaneKind::Incidente => {
            let section = section.unwrap_or(SectionId::DEFAULT);
            if lane.section(section).is_none() {
                return Err(ResolutionError::UnknownSection { lane_id: lane.id.clone(), section });
            }
            Some(section)
        }
        LaneKind::Allarme | LaneKind::Emergenza => None,
    };

    Ok((Placement { lane_id: lane.id.clone(), section }, kind))
}

/// Classify moving `card` from `source` to the requested destination.
///
/// # Errors
///
/// See [`destination`]; additionally [`ResolutionError::UnknownSourceLane`]
/// when the card's current lane is not a known level.
pub fn resolve(
    lanes: &[Lane],
    card: &Card,
    source: &Placement,
    lane_key: &str,
    section: Option<SectionId>,
) -> Result<Resolution, ResolutionError> {
    let (destination, destination_kind) = destination(lanes, lane_key, section)?;
    if destination == *source {
        return Ok(Resolution::Noop);
    }

    let source_kind = lanes
        .iter()
        .find(|lane| lane.id == source.lane_id)
        .and_then(Lane::kind)
        .ok_or_else(|| ResolutionError::UnknownSourceLane(source.lane_id.clone()))?;

    let from = source_kind.severity(source.section);
    let to = destination_kind.severity(destination.section);
    let direction = if to > from { Direction::Escalate } else { Direction::Deescalate };

    let payload = EscalatePayload {
        event_number: card.event,
        new_level: destination_kind.level().to_owned(),
        direction,
        incident_level: destination.section,
    };
    Ok(Resolution::Move { destination, payload })
}

#[cfg(test)]
#[path = "escalation_test.rs"]
mod escalation_test;
