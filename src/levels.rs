//! Escalation level definitions shown as operator tooltips.

use serde::Serialize;

use crate::board::{LaneKind, SectionId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LevelDefinition {
    pub kind: LaneKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionId>,
    pub name: &'static str,
    pub description: &'static str,
}

const DEFINITIONS: [LevelDefinition; 7] = [
    LevelDefinition {
        kind: LaneKind::Allarme,
        section: None,
        name: "Allarme",
        description: "Evento che NON presenti immediatamente caratteristiche tali da configurare una situazione di \
                      maxiemergenza o per il quale non vi siano notizie dirette immediatamente disponibili",
    },
    LevelDefinition {
        kind: LaneKind::Emergenza,
        section: None,
        name: "Emergenza",
        description: "Evento CON notizie dirette da cui si desume uno stato di potenziale pericolo e la presenza di \
                      soggetti coinvolti ma che necessita di una conferma",
    },
    LevelDefinition {
        kind: LaneKind::Incidente,
        section: None,
        name: "Incidente",
        description: "Evento dannoso per i soggetti coinvolti in cui si rende necessario attivare il PIM \
                      (Piano Interno Maxiemergenza)",
    },
    LevelDefinition {
        kind: LaneKind::Incidente,
        section: Some(SectionId::Bianca),
        name: "Bianca",
        description: "Fino a ( <= ) 10 coinvolti",
    },
    LevelDefinition {
        kind: LaneKind::Incidente,
        section: Some(SectionId::Verde),
        name: "Verde",
        description: "Da 11 a 20 coinvolti",
    },
    LevelDefinition {
        kind: LaneKind::Incidente,
        section: Some(SectionId::Gialla),
        name: "Gialla",
        description: "Da 21 a 50 coinvolti",
    },
    LevelDefinition {
        kind: LaneKind::Incidente,
        section: Some(SectionId::Rossa),
        name: "Rossa",
        description: "Oltre ( > ) 50 coinvolti",
    },
];

/// Every level, lanes first, then Incidente sub-levels from least severe.
#[must_use]
pub fn definitions() -> &'static [LevelDefinition] {
    &DEFINITIONS
}

/// Definition for a lane, or for an Incidente sub-level.
#[must_use]
pub fn definition_for(kind: LaneKind, section: Option<SectionId>) -> Option<&'static LevelDefinition> {
    DEFINITIONS.iter().find(|def| def.kind == kind && def.section == section)
}

#[cfg(test)]
#[path = "levels_test.rs"]
mod levels_test;
