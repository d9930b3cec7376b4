use super::*;
use crate::board::SectionId;
use crate::escalation::Direction;
use crate::events::{self, EventDraft};
use crate::notify::Notifications;
use crate::session::{Session, SessionState};
use crate::remote::load_board;

#[tokio::test]
async fn mock_board_places_fixture_events() {
    let mock = MockAuthority::new();
    let lanes = load_board(&mock, "SRL").await;

    assert_eq!(lanes[0].cards.len(), 1);
    assert_eq!(lanes[0].cards[0].event, 243_112_345);
    assert_eq!(lanes[1].cards.len(), 2);
    let bianca = lanes[2].section(SectionId::Bianca).expect("bianca");
    assert_eq!(bianca.cards[0].location_detail, "Fiocchi munizioni");
    assert!(lanes.iter().flat_map(|lane| lane.all_cards()).all(|card| card.central_id.as_deref() == Some("SRL")));
}

#[tokio::test]
async fn mock_accepts_escalations() {
    let mock = MockAuthority::new();
    let payload = EscalatePayload {
        event_number: 1,
        new_level: "emergenza".to_owned(),
        direction: Direction::Escalate,
        incident_level: None,
    };
    assert!(mock.escalate(&payload).await.expect("escalate"));
}

#[tokio::test]
async fn mock_task_updates_persist() {
    let mock = MockAuthority::new();
    let tasks = mock.fetch_tasks("SRA", 42).await.expect("tasks");
    assert!(tasks.iter().all(|task| task.central_id == "SRA" && task.event_number == 42));

    let target = tasks.iter().find(|task| task.status != TaskStatus::Done).expect("open task");
    let update = TaskUpdate { uuid: target.uuid.clone(), status: TaskStatus::Done, modified_by: "mario".to_owned() };
    assert!(mock.update_task_status(&update).await.expect("update"));

    let tasks = mock.fetch_tasks("SRA", 42).await.expect("tasks");
    let updated = tasks.iter().find(|task| task.uuid == update.uuid).expect("task");
    assert_eq!(updated.status, TaskStatus::Done);
    assert_eq!(updated.modified_by, "mario");
}

#[tokio::test]
async fn mock_rejects_unknown_task() {
    let mock = MockAuthority::new();
    let update = TaskUpdate { uuid: "nope".to_owned(), status: TaskStatus::Done, modified_by: String::new() };
    assert!(!mock.update_task_status(&update).await.expect("update"));
}

#[tokio::test]
async fn mock_lists_fixture_active_events_and_categories() {
    let mock = MockAuthority::new();
    let active = mock.fetch_active_events("SRA").await.expect("events");
    assert_eq!(active, ActiveEvents::Multiple(vec![2_430_110_112, 2_430_110_113, 2_430_110_114]));
    assert_eq!(mock.fetch_categories().await.expect("categories"), vec!["SRL", "SRM", "HQ"]);
}

#[tokio::test]
async fn mock_created_event_joins_active_list_and_board() {
    let mock = MockAuthority::new();
    let mut session = Session::in_memory(SessionState {
        username: Some("mario".to_owned()),
        central: Some("SRA".to_owned()),
        event_nr: Some(2_430_110_112),
        ..SessionState::default()
    });
    session.open_new_event(crate::board::LaneKind::Incidente, Some(SectionId::Rossa)).expect("open");
    let categories = events::select_categories(&mock.fetch_categories().await.expect("categories"), Some("SRM"))
        .expect("select");
    let draft = EventDraft {
        event_number: 77,
        location: "Lecco".to_owned(),
        location_detail: "Porto".to_owned(),
        categories,
    };

    let notifications = Notifications::default();
    let created = events::create_event(&mock, &mut session, &notifications, "SRA", &draft).await.expect("create");
    assert!(created.overview_created);
    assert!(mock.fetch_active_events("SRA").await.expect("events").events().contains(&77));

    let lanes = load_board(&mock, "SRA").await;
    let rossa = lanes[2].section(SectionId::Rossa).expect("rossa");
    assert_eq!(rossa.cards.len(), 1);
    assert_eq!(rossa.cards[0].event, 77);
    assert_eq!(rossa.cards[0].kind, "SRM");
    assert!(load_board(&mock, "SRL").await[2].section(SectionId::Rossa).expect("rossa").cards.is_empty());
}
