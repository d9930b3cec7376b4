use serde_json::json;

use super::*;

#[test]
fn single_event_update() {
    let payload = json!({"data": {"event_number": "100", "info": {"Completed": 3, "Total": 10}}});
    assert_eq!(
        parse_completion_update(&payload),
        Ok(vec![(100, Completion { completed: 3, total: 10 })])
    );
}

#[test]
fn bulk_update_reads_every_entry() {
    let payload = json!({"data": {
        "100": {"Completed": 4, "Total": 10},
        "200": {"completed": 10, "total": 10}
    }});
    let mut pairs = parse_completion_update(&payload).expect("bulk");
    pairs.sort_by_key(|(event, _)| *event);
    assert_eq!(
        pairs,
        vec![(100, Completion { completed: 4, total: 10 }), (200, Completion { completed: 10, total: 10 })]
    );
}

#[test]
fn bulk_update_skips_unreadable_entries() {
    let payload = json!({"data": {
        "100": {"Completed": 1, "Total": 2},
        "Event 7": {"Completed": 1, "Total": 2},
        "300": {"Completed": 1},
        "400": {"Completed": 5, "Total": 2}
    }});
    assert_eq!(parse_completion_update(&payload), Ok(vec![(100, Completion { completed: 1, total: 2 })]));
}

#[test]
fn missing_data_is_malformed() {
    assert_eq!(parse_completion_update(&json!({})), Err(MalformedPushMessage::MissingData));
    assert_eq!(parse_completion_update(&json!({"data": [1, 2]})), Err(MalformedPushMessage::MissingData));
    assert_eq!(parse_completion_update(&json!("text")), Err(MalformedPushMessage::MissingData));
}

#[test]
fn single_event_without_counters_is_malformed() {
    let payload = json!({"data": {"event_number": 7, "info": {"Completed": "x"}}});
    assert_eq!(parse_completion_update(&payload), Err(MalformedPushMessage::InvalidCounters(7)));

    let payload = json!({"data": {"event_number": "seven", "info": {"Completed": 1, "Total": 1}}});
    assert_eq!(parse_completion_update(&payload), Err(MalformedPushMessage::InvalidEventNumber));
}
