use super::*;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("dogeplus-session-{name}-{}.json", uuid::Uuid::new_v4()))
}

#[test]
fn steps_follow_configuration_order() {
    let mut session = Session::in_memory(SessionState::default());
    assert_eq!(session.next_step(), ConfigStep::Username);
    session.set_username(Some("mario".to_owned())).expect("username");
    assert_eq!(session.next_step(), ConfigStep::Central);
    session.set_central(Some("SRA".to_owned())).expect("central");
    assert_eq!(session.next_step(), ConfigStep::EventNr);
    session.set_event_nr(Some(243_112_345)).expect("event");
    assert_eq!(session.next_step(), ConfigStep::Finished);
    session.set_new_event(true).expect("new event");
    assert_eq!(session.next_step(), ConfigStep::NewEvent);
}

#[test]
fn changing_central_clears_event_and_categories() {
    let mut session = Session::in_memory(SessionState {
        username: Some("mario".to_owned()),
        central: Some("SRA".to_owned()),
        event_nr: Some(7),
        categories: Some(vec!["stradale".to_owned()]),
        ..SessionState::default()
    });
    session.set_central(Some("SRL".to_owned())).expect("central");
    assert_eq!(session.central(), Some("SRL"));
    assert!(session.state().event_nr.is_none());
    assert!(session.state().categories.is_none());
    assert_eq!(session.state().username.as_deref(), Some("mario"));
}

#[test]
fn reselecting_same_central_keeps_event() {
    let mut session = Session::in_memory(SessionState {
        central: Some("SRA".to_owned()),
        event_nr: Some(7),
        ..SessionState::default()
    });
    session.set_central(Some("SRA".to_owned())).expect("central");
    assert_eq!(session.state().event_nr, Some(7));
}

#[test]
fn missing_file_loads_empty_session() {
    let session = Session::load(temp_path("missing")).expect("load");
    assert_eq!(session.state(), &SessionState::default());
}

#[test]
fn saved_session_round_trips_through_file() {
    let path = temp_path("persist");
    {
        let mut session = Session::load(&path).expect("load");
        session.set_username(Some("luigi".to_owned())).expect("username");
        session.set_central(Some("SRM".to_owned())).expect("central");
        session.set_incident_level(Some(SectionId::Gialla)).expect("level");
    }
    let raw = std::fs::read_to_string(&path).expect("file written");
    assert!(raw.contains("\"store_central\": \"SRM\""));
    assert!(raw.contains("\"store_incident_level\": \"gialla\""));

    let reloaded = Session::load(&path).expect("reload");
    assert_eq!(reloaded.central(), Some("SRM"));
    assert_eq!(reloaded.state().incident_level, Some(SectionId::Gialla));
    let _ = std::fs::remove_file(path);
}

#[test]
fn corrupt_file_is_an_error() {
    let path = temp_path("corrupt");
    std::fs::write(&path, "{not json").expect("write");
    let err = Session::load(&path).expect_err("corrupt");
    assert!(matches!(err, SessionError::Json(_)));
    let _ = std::fs::remove_file(path);
}

#[test]
fn new_event_request_keeps_section_only_for_incidente() {
    let mut session = Session::in_memory(SessionState::default());
    session.open_new_event(LaneKind::Incidente, Some(SectionId::Verde)).expect("open");
    assert!(session.state().new_event);
    assert_eq!(session.state().escalation, Some(LaneKind::Incidente));
    assert_eq!(session.state().incident_level, Some(SectionId::Verde));

    session.open_new_event(LaneKind::Emergenza, Some(SectionId::Verde)).expect("open");
    assert_eq!(session.state().escalation, Some(LaneKind::Emergenza));
    assert_eq!(session.state().incident_level, None);
}

#[test]
fn finishing_new_event_returns_to_event_selection() {
    let mut session = Session::in_memory(SessionState {
        username: Some("mario".to_owned()),
        central: Some("SRA".to_owned()),
        event_nr: Some(7),
        ..SessionState::default()
    });
    session.open_new_event(LaneKind::Incidente, Some(SectionId::Rossa)).expect("open");
    assert_eq!(session.next_step(), ConfigStep::NewEvent);

    session.finish_new_event().expect("finish");
    assert_eq!(session.next_step(), ConfigStep::EventNr);
    assert!(!session.state().new_event);
    assert_eq!(session.state().incident_level, None);
}

#[test]
fn cancelling_new_event_keeps_selected_event() {
    let mut session = Session::in_memory(SessionState {
        username: Some("mario".to_owned()),
        central: Some("SRA".to_owned()),
        event_nr: Some(7),
        ..SessionState::default()
    });
    session.open_new_event(LaneKind::Allarme, None).expect("open");
    session.cancel_new_event().expect("cancel");
    assert_eq!(session.next_step(), ConfigStep::Finished);
    assert_eq!(session.state().event_nr, Some(7));
}

#[test]
fn escalation_is_stored_under_browser_key() {
    let raw = r#"{"store_escalation": "incidente", "store_incident_level": "bianca", "store_newevent": true}"#;
    let state: SessionState = serde_json::from_str(raw).expect("state");
    assert_eq!(state.escalation, Some(LaneKind::Incidente));
    assert_eq!(state.incident_level, Some(SectionId::Bianca));
    assert!(state.new_event);
}
