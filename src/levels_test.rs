use super::*;

#[test]
fn every_lane_and_section_has_a_definition() {
    for kind in LaneKind::ALL {
        assert!(definition_for(kind, None).is_some(), "{kind:?}");
    }
    for section in SectionId::ALL {
        let def = definition_for(LaneKind::Incidente, Some(section)).expect("section definition");
        assert_eq!(def.name, section.display_name());
    }
    assert_eq!(definitions().len(), 7);
}

#[test]
fn sections_exist_only_under_incidente() {
    assert!(definition_for(LaneKind::Emergenza, Some(SectionId::Rossa)).is_none());
    assert!(definitions().iter().filter(|def| def.section.is_some()).all(|def| def.kind == LaneKind::Incidente));
}

#[test]
fn sub_level_ranges_are_contiguous() {
    let verde = definition_for(LaneKind::Incidente, Some(SectionId::Verde)).expect("verde");
    let gialla = definition_for(LaneKind::Incidente, Some(SectionId::Gialla)).expect("gialla");
    assert_eq!(verde.description, "Da 11 a 20 coinvolti");
    assert_eq!(gialla.description, "Da 21 a 50 coinvolti");
}

#[test]
fn definitions_serialize_with_lowercase_kind() {
    let json = serde_json::to_value(definition_for(LaneKind::Incidente, Some(SectionId::Rossa))).expect("json");
    assert_eq!(json["kind"], "incidente");
    assert_eq!(json["section"], "rossa");
    let json = serde_json::to_value(definition_for(LaneKind::Allarme, None)).expect("json");
    assert!(json.get("section").is_none());
}
