//! Board data model: lanes, sections, cards, and the severity order.
//!
//! DESIGN
//! ======
//! Event numbers are normalized to `u64` when a card is deserialized, whether
//! the feed carries them as JSON numbers or numeric strings. Every later
//! comparison (completion merge, escalation payload) is an exact integer
//! match on that single canonical value.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const ALLARME_LANE_ID: &str = "1";
pub const EMERGENZA_LANE_ID: &str = "2";
pub const INCIDENTE_LANE_ID: &str = "3";

// =============================================================================
// SEVERITY
// =============================================================================

/// Global severity order shared by lanes and Incidente sections.
///
/// Declaration order is severity order, so the derived `Ord` is the
/// escalation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Allarme,
    Emergenza,
    Bianca,
    Verde,
    Gialla,
    Rossa,
}

impl Severity {
    /// Numeric rank used by the dispatch backend.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Allarme => 10,
            Self::Emergenza => 20,
            Self::Bianca => 30,
            Self::Verde => 40,
            Self::Gialla => 50,
            Self::Rossa => 60,
        }
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

/// Incidente sub-level, keyed by casualty count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Rossa,
    Gialla,
    Verde,
    Bianca,
}

impl SectionId {
    /// Display order of the Incidente sections, most severe first.
    pub const ALL: [Self; 4] = [Self::Rossa, Self::Gialla, Self::Verde, Self::Bianca];

    /// Sub-level assumed when an Incidente placement names none.
    pub const DEFAULT: Self = Self::Bianca;

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rossa => "rossa",
            Self::Gialla => "gialla",
            Self::Verde => "verde",
            Self::Bianca => "bianca",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Rossa => "Rossa",
            Self::Gialla => "Gialla",
            Self::Verde => "Verde",
            Self::Bianca => "Bianca",
        }
    }

    /// Parse a section id, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|id| id.as_str().eq_ignore_ascii_case(raw))
    }

    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::Rossa => Severity::Rossa,
            Self::Gialla => Severity::Gialla,
            Self::Verde => Severity::Verde,
            Self::Bianca => Severity::Bianca,
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// LANES
// =============================================================================

/// Top-level severity bucket, derived from a lane's display name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneKind {
    Allarme,
    Emergenza,
    Incidente,
}

impl LaneKind {
    pub const ALL: [Self; 3] = [Self::Allarme, Self::Emergenza, Self::Incidente];

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// Display name, e.g. `"Emergenza"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Allarme => "Allarme",
            Self::Emergenza => "Emergenza",
            Self::Incidente => "Incidente",
        }
    }

    /// Lowercase level name used on the wire, e.g. `"emergenza"`.
    #[must_use]
    pub fn level(self) -> &'static str {
        match self {
            Self::Allarme => "allarme",
            Self::Emergenza => "emergenza",
            Self::Incidente => "incidente",
        }
    }

    /// Lane id used by the fixed board skeleton.
    #[must_use]
    pub fn default_id(self) -> &'static str {
        match self {
            Self::Allarme => ALLARME_LANE_ID,
            Self::Emergenza => EMERGENZA_LANE_ID,
            Self::Incidente => INCIDENTE_LANE_ID,
        }
    }

    /// Severity of a placement in a lane of this kind.
    ///
    /// Incidente placements rank by section; a card sitting directly on the
    /// Incidente lane ranks as the default section.
    #[must_use]
    pub fn severity(self, section: Option<SectionId>) -> Severity {
        match self {
            Self::Allarme => Severity::Allarme,
            Self::Emergenza => Severity::Emergenza,
            Self::Incidente => section.unwrap_or(SectionId::DEFAULT).severity(),
        }
    }
}

/// Task completion counters for one event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    #[serde(alias = "Completed")]
    pub completed: u32,
    #[serde(alias = "Total")]
    pub total: u32,
}

impl Completion {
    /// Rounded completion percentage; zero when no tasks exist.
    #[must_use]
    pub fn percent(self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let scaled = u64::from(self.completed) * 200 + u64::from(self.total);
        let percent = scaled / (u64::from(self.total) * 2);
        u32::try_from(percent).unwrap_or(u32::MAX)
    }
}

/// One tracked incident placed on the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    #[serde(deserialize_with = "deserialize_event_number", serialize_with = "serialize_event_number")]
    pub event: u64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub location_detail: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<Completion>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Section {
    #[must_use]
    pub fn empty(id: SectionId) -> Self {
        Self { id, name: id.display_name().to_owned(), cards: Vec::new() }
    }
}

/// Top-level swimlane. Only the Incidente lane carries sections.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<Section>>,
}

impl Lane {
    /// Empty lane of the given kind with the fixed skeleton id.
    #[must_use]
    pub fn empty(kind: LaneKind) -> Self {
        let sections = (kind == LaneKind::Incidente).then(|| SectionId::ALL.into_iter().map(Section::empty).collect());
        Self { id: kind.default_id().to_owned(), name: kind.name().to_owned(), cards: Vec::new(), sections }
    }

    #[must_use]
    pub fn kind(&self) -> Option<LaneKind> {
        LaneKind::from_name(&self.name)
    }

    #[must_use]
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.as_ref()?.iter().find(|section| section.id == id)
    }

    pub fn section_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sections.as_mut()?.iter_mut().find(|section| section.id == id)
    }

    /// Every card in the lane: top-level first, then each section in order.
    pub fn all_cards(&self) -> impl Iterator<Item = &Card> {
        self.cards
            .iter()
            .chain(self.sections.iter().flatten().flat_map(|section| section.cards.iter()))
    }
}

/// Where a card sits: a lane, optionally narrowed to one of its sections.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    pub lane_id: String,
    pub section: Option<SectionId>,
}

impl Placement {
    #[must_use]
    pub fn lane(lane_id: impl Into<String>) -> Self {
        Self { lane_id: lane_id.into(), section: None }
    }

    #[must_use]
    pub fn section(lane_id: impl Into<String>, section: SectionId) -> Self {
        Self { lane_id: lane_id.into(), section: Some(section) }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.section {
            Some(section) => write!(f, "{}/{section}", self.lane_id),
            None => f.write_str(&self.lane_id),
        }
    }
}

/// Fixed board skeleton: Allarme, Emergenza, and Incidente with its four
/// sections, all empty.
#[must_use]
pub fn default_lanes() -> Vec<Lane> {
    LaneKind::ALL.into_iter().map(Lane::empty).collect()
}

// =============================================================================
// EVENT NUMBER SERDE
// =============================================================================

/// Parse an event number carried as a JSON number or a numeric string.
#[must_use]
pub fn parse_event_number(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(number) => number.as_u64(),
        serde_json::Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

fn deserialize_event_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    parse_event_number(&value).ok_or_else(|| D::Error::custom(format!("invalid event number: {value}")))
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_event_number<S>(event: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&event.to_string())
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
