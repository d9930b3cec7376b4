//! Build a board from the backend's flat overview feed.
//!
//! The overview endpoint returns one row per monitored event with its level
//! as a lowercase string; completion counters come from a separate endpoint
//! keyed by event number. Rows are grouped into the fixed lane skeleton and
//! the counters folded into each card at construction time.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::types::{Card, Completion, Lane, LaneKind, SectionId, default_lanes, parse_event_number};

pub type CompletionMap = HashMap<u64, Completion>;

/// One row of the escalation overview feed.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OverviewRow {
    pub uuid: String,
    #[serde(deserialize_with = "deserialize_row_event")]
    pub event_number: u64,
    pub level: String,
    #[serde(default)]
    pub incident_level: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub location_detail: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub central_id: Option<String>,
}

fn deserialize_row_event<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;
    let value = Value::deserialize(deserializer)?;
    parse_event_number(&value).ok_or_else(|| D::Error::custom(format!("invalid event_number: {value}")))
}

/// Group overview rows into the fixed lane skeleton.
///
/// Incidente rows land in the section named by `incident_level`, defaulting
/// to bianca. Rows whose level names no lane are dropped.
#[must_use]
pub fn transform(rows: &[OverviewRow], completion: &CompletionMap) -> Vec<Lane> {
    let mut lanes = default_lanes();

    for row in rows {
        let Some(kind) = LaneKind::from_name(&row.level) else {
            warn!(uuid = %row.uuid, level = %row.level, "overview row has unknown level; skipping");
            continue;
        };
        let card = Card {
            id: row.uuid.clone(),
            event: row.event_number,
            location: row.location.clone(),
            location_detail: row.location_detail.clone(),
            kind: row.kind.clone(),
            central_id: row.central_id.clone().filter(|center| !center.is_empty()),
            completion: completion.get(&row.event_number).copied(),
        };

        let Some(lane) = lanes.iter_mut().find(|lane| lane.kind() == Some(kind)) else {
            continue;
        };
        if kind == LaneKind::Incidente {
            let section_id = row
                .incident_level
                .as_deref()
                .and_then(SectionId::parse)
                .unwrap_or(SectionId::DEFAULT);
            if let Some(section) = lane.section_mut(section_id) {
                section.cards.push(card);
                continue;
            }
        }
        lane.cards.push(card);
    }

    lanes
}

/// Parse the completion aggregation map, skipping malformed entries.
#[must_use]
pub fn parse_completion_map(value: &Value) -> CompletionMap {
    let Some(entries) = value.as_object() else {
        warn!("completion aggregation is not an object; ignoring");
        return CompletionMap::new();
    };

    entries
        .iter()
        .filter_map(|(key, entry)| {
            let event = key.trim().parse::<u64>().ok()?;
            let completion = serde_json::from_value::<Completion>(entry.clone()).ok()?;
            Some((event, completion))
        })
        .collect()
}

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;
