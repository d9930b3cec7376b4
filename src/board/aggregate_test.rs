use super::*;
use crate::board::test_helpers::card_in;
use crate::board::types::default_lanes;

fn mixed_board() -> Vec<Lane> {
    let mut lanes = default_lanes();
    lanes[0].cards.push(card_in("a1", 1, "SRA"));
    lanes[0].cards.push(card_in("l1", 2, "SRL"));
    lanes[1].cards.push(card_in("a2", 3, "SRA"));
    let incidente = &mut lanes[2];
    incidente.section_mut(SectionId::Rossa).expect("rossa").cards.push(card_in("a3", 4, "SRA"));
    incidente.section_mut(SectionId::Bianca).expect("bianca").cards.push(card_in("p1", 5, "SRP"));
    incidente.section_mut(SectionId::Bianca).expect("bianca").cards.push(card_in("x1", 6, "SRX"));
    lanes
}

#[test]
fn always_returns_known_centers_in_order() {
    let boards = aggregate_by_center(&default_lanes());
    let centers: Vec<_> = boards.iter().map(|board| board.center.as_str()).collect();
    assert_eq!(centers, KNOWN_CENTERS.to_vec());
    assert!(boards.iter().all(|board| board.lanes.is_empty()));
}

#[test]
fn splits_cards_by_center() {
    let boards = aggregate_by_center(&mixed_board());
    let sra = &boards[0];
    assert_eq!(sra.card_count(), 3);
    let names: Vec<_> = sra.lanes.iter().map(|lane| lane.name.as_str()).collect();
    assert_eq!(names, vec!["Allarme", "Emergenza", "Incidente - Rossa"]);
    assert_eq!(boards[1].card_count(), 1);
    assert_eq!(boards[2].card_count(), 0);
    assert_eq!(boards[3].card_count(), 1);
}

#[test]
fn section_lanes_are_flattened_and_tagged() {
    let boards = aggregate_by_center(&mixed_board());
    let rossa = &boards[0].lanes[2];
    assert_eq!(rossa.id, "3-rossa");
    assert_eq!(rossa.section, Some(SectionId::Rossa));
    assert_eq!(rossa.kind, Some(LaneKind::Incidente));
    assert_eq!(rossa.center, "SRA");
}

#[test]
fn unknown_center_cards_are_dropped() {
    let boards = aggregate_by_center(&mixed_board());
    let total: usize = boards.iter().map(CenterBoard::card_count).sum();
    assert_eq!(total, 5);
    assert!(boards.iter().flat_map(CenterBoard::cards).all(|card| card.id != "x1"));
}

#[test]
fn organize_by_kind_groups_lanes_across_centers() {
    let groups = organize_by_kind(&mixed_board());
    let (kind, allarme) = &groups[0];
    assert_eq!(*kind, LaneKind::Allarme);
    let centers: Vec<_> = allarme.iter().map(|lane| lane.center.as_str()).collect();
    assert_eq!(centers, vec!["SRA", "SRL"]);

    let (kind, incidente) = &groups[2];
    assert_eq!(*kind, LaneKind::Incidente);
    assert_eq!(incidente.len(), 2);
}
