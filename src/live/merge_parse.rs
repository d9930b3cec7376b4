//! Parsing helpers for live-update payloads.

use serde_json::Value;

use crate::board::Completion;
use crate::board::types::parse_event_number;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedPushMessage {
    #[error("payload has no data object")]
    MissingData,
    #[error("event number is missing or invalid")]
    InvalidEventNumber,
    #[error("event {0} carries no valid completion counters")]
    InvalidCounters(u64),
}

/// Extract `(event, completion)` pairs from a completion update.
///
/// Two shapes are accepted under `data`: a single event
/// (`{event_number, info: {Completed, Total}}`) or a bulk map keyed by event
/// number. Bulk entries that cannot be read are skipped; counters where
/// `completed > total` are treated as unreadable.
///
/// # Errors
///
/// Returns [`MalformedPushMessage`] when `data` is absent or not an object,
/// or when a single-event update is unreadable.
pub fn parse_completion_update(payload: &Value) -> Result<Vec<(u64, Completion)>, MalformedPushMessage> {
    let data = payload
        .get("data")
        .filter(|data| data.is_object())
        .ok_or(MalformedPushMessage::MissingData)?;

    if let Some(raw_event) = data.get("event_number") {
        let event = parse_event_number(raw_event).ok_or(MalformedPushMessage::InvalidEventNumber)?;
        let completion = data
            .get("info")
            .and_then(parse_counters)
            .ok_or(MalformedPushMessage::InvalidCounters(event))?;
        return Ok(vec![(event, completion)]);
    }

    let Some(entries) = data.as_object() else {
        return Err(MalformedPushMessage::MissingData);
    };
    Ok(entries
        .iter()
        .filter_map(|(key, counters)| {
            let event = key.trim().parse::<u64>().ok()?;
            Some((event, parse_counters(counters)?))
        })
        .collect())
}

fn parse_counters(value: &Value) -> Option<Completion> {
    let completion: Completion = serde_json::from_value(value.clone()).ok()?;
    (completion.completed <= completion.total).then_some(completion)
}

#[cfg(test)]
#[path = "merge_parse_test.rs"]
mod merge_parse_test;
