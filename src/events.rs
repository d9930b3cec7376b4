//! Active events: picking one to work, or opening a new one.
//!
//! SYSTEM CONTEXT
//! ==============
//! After choosing a center the operator either selects one of its active
//! events or requests a new event from a lane of the board. The request is
//! recorded in the [`Session`] (level, optional Incidente section, pending
//! flag); [`create_event`] then posts the event, posts its overview row, and
//! sends the operator back to event selection.
//!
//! ERROR HANDLING
//! ==============
//! A refused or failed event post aborts creation with an operator
//! notification and leaves the request pending. A failed overview post only
//! notifies, since the event itself already exists.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::board::types::parse_event_number;
use crate::board::{LaneKind, SectionId};
use crate::notify::{Notifications, Priority};
use crate::remote::RemoteError;
use crate::session::{Session, SessionError};
use crate::tasks::parse_tasks;

/// Always-selected base category. Never posted as the event's category.
pub const BASE_CATEGORY: &str = "PRO22";

pub const EVENT_CREATION_FAILED: &str = "Errore durante la creazione evento";
pub const OVERVIEW_CREATION_FAILED: &str = "Errore durante la creazione overview";
pub const EVENT_CREATED: &str = "Evento creato con successo";

const MULTIPLE_EVENTS_FOUND: &str = "Multiple events found";
const EVENT_FOUND: &str = "Event Found";

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event number must be greater than zero")]
    InvalidEventNumber,
    #[error("select at least one category")]
    NoCategory,
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("event {event} was not created")]
    Rejected { event: u64, cause: Option<RemoteError> },
    #[error("active events unavailable: {0}")]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "found", content = "events", rename_all = "lowercase")]
pub enum ActiveEvents {
    /// Several events are open and the operator has to pick one.
    Multiple(Vec<u64>),
    /// Exactly one event is open.
    Single(u64),
    None,
}

impl ActiveEvents {
    /// The event to select without asking, if there is exactly one.
    #[must_use]
    pub fn auto_selection(&self) -> Option<u64> {
        match self {
            Self::Single(event) => Some(*event),
            Self::Multiple(_) | Self::None => None,
        }
    }

    #[must_use]
    pub fn events(&self) -> Vec<u64> {
        match self {
            Self::Multiple(events) => events.clone(),
            Self::Single(event) => vec![*event],
            Self::None => Vec::new(),
        }
    }
}

/// Body of the event creation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub categories: Option<String>,
    pub event_number: u64,
    pub central_id: String,
    pub escalation_level: Option<String>,
    pub incident_level: Option<SectionId>,
}

/// Body of the overview row creation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOverview {
    pub central_id: String,
    pub event_number: u64,
    pub location: String,
    pub location_detail: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub level: Option<String>,
    pub incident_level: Option<SectionId>,
}

/// Operator input for a new event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub event_number: u64,
    pub location: String,
    pub location_detail: String,
    /// Selected categories, base category included.
    pub categories: Vec<String>,
}

/// Outcome of a successful [`create_event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EventCreated {
    pub event: u64,
    pub overview_created: bool,
}

#[async_trait::async_trait]
pub trait EventAuthority: Send + Sync {
    async fn fetch_active_events(&self, center: &str) -> Result<ActiveEvents, RemoteError>;

    async fn fetch_categories(&self) -> Result<Vec<String>, RemoteError>;

    /// `Ok(false)` means the backend refused the event.
    async fn create_event(&self, event: &NewEvent) -> Result<bool, RemoteError>;

    /// `Ok(false)` means the backend refused the overview row.
    async fn create_overview(&self, overview: &NewOverview) -> Result<bool, RemoteError>;
}

// =============================================================================
// SELECTION
// =============================================================================

/// Lane or section a new event is requested from.
///
/// A section name means Incidente at that section; a lane name means that
/// lane with no section.
#[must_use]
pub fn new_event_target(raw: &str) -> Option<(LaneKind, Option<SectionId>)> {
    if let Some(section) = SectionId::parse(raw) {
        return Some((LaneKind::Incidente, Some(section)));
    }
    LaneKind::from_name(raw).map(|kind| (kind, None))
}

/// Category selection for `picked`: the base category when offered, plus
/// the picked one.
///
/// # Errors
///
/// Returns [`EventError::UnknownCategory`] if `picked` is not offered.
pub fn select_categories(available: &[String], picked: Option<&str>) -> Result<Vec<String>, EventError> {
    let mut selected: Vec<String> = available.iter().filter(|c| *c == BASE_CATEGORY).cloned().collect();
    if let Some(picked) = picked {
        if !available.iter().any(|c| c == picked) {
            return Err(EventError::UnknownCategory(picked.to_owned()));
        }
        if picked != BASE_CATEGORY {
            selected.push(picked.to_owned());
        }
    }
    Ok(selected)
}

/// The one category sent to the backend: the first non-base selection.
#[must_use]
pub fn category_to_post(selected: &[String]) -> Option<String> {
    selected.iter().find(|c| *c != BASE_CATEGORY).cloned()
}

/// Fetch the active events of `center` and select the event when exactly
/// one is open.
///
/// # Errors
///
/// Returns the fetch or session failure.
pub async fn load_active_events(
    authority: &dyn EventAuthority,
    session: &mut Session,
    center: &str,
) -> Result<ActiveEvents, EventError> {
    let events = authority.fetch_active_events(center).await?;
    if let Some(event) = events.auto_selection() {
        info!(%center, event, "single active event selected");
        session.set_event_nr(Some(event))?;
    }
    Ok(events)
}

// =============================================================================
// CREATION
// =============================================================================

/// Create the event requested in `session` for `center` from `draft`.
///
/// Posts the event, then its overview row. On success the pending request
/// and the selected event are cleared so the operator picks the event anew.
///
/// # Errors
///
/// - [`EventError::InvalidEventNumber`] / [`EventError::NoCategory`] for an
///   incomplete draft, before any call.
/// - [`EventError::Rejected`] if the event post was refused or failed.
/// - [`EventError::Session`] if the session cannot be written.
pub async fn create_event(
    authority: &dyn EventAuthority,
    session: &mut Session,
    notifications: &Notifications,
    center: &str,
    draft: &EventDraft,
) -> Result<EventCreated, EventError> {
    if draft.event_number == 0 {
        return Err(EventError::InvalidEventNumber);
    }
    if draft.categories.is_empty() {
        return Err(EventError::NoCategory);
    }
    let category = category_to_post(&draft.categories);
    session.set_categories(Some(category.iter().cloned().collect()))?;

    let level = session.state().escalation;
    let incident_level = session.state().incident_level.filter(|_| level == Some(LaneKind::Incidente));
    let level = level.map(|kind| kind.level().to_owned());

    let event = NewEvent {
        categories: category.clone(),
        event_number: draft.event_number,
        central_id: center.to_owned(),
        escalation_level: level.clone(),
        incident_level,
    };
    let cause = match authority.create_event(&event).await {
        Ok(true) => None,
        Ok(false) => Some(None),
        Err(err) => Some(Some(err)),
    };
    if let Some(cause) = cause {
        warn!(
            event = draft.event_number,
            error = cause.as_ref().map(ToString::to_string),
            "event creation rejected"
        );
        notifications.push(EVENT_CREATION_FAILED, Priority::Error);
        return Err(EventError::Rejected { event: draft.event_number, cause });
    }

    let overview = NewOverview {
        central_id: center.to_owned(),
        event_number: draft.event_number,
        location: draft.location.clone(),
        location_detail: draft.location_detail.clone(),
        kind: category,
        level,
        incident_level,
    };
    let overview_created = match authority.create_overview(&overview).await {
        Ok(created) => created,
        Err(err) => {
            warn!(event = draft.event_number, error = %err, "overview creation failed");
            false
        }
    };
    if !overview_created {
        notifications.push(OVERVIEW_CREATION_FAILED, Priority::Error);
    }

    session.finish_new_event()?;
    notifications.push(EVENT_CREATED, Priority::Success);
    info!(event = draft.event_number, overview_created, "event created");
    Ok(EventCreated { event: draft.event_number, overview_created })
}

// =============================================================================
// PARSING
// =============================================================================

/// Parse an active-events body: `{Result, Events}` or `{Result, Tasks}`.
///
/// # Errors
///
/// Returns [`RemoteError::Parse`] for invalid JSON or a malformed task list.
pub fn parse_active_events(text: &str) -> Result<ActiveEvents, RemoteError> {
    let body: Value = serde_json::from_str(text).map_err(|e| RemoteError::Parse(e.to_string()))?;
    match body.get("Result").and_then(Value::as_str) {
        Some(MULTIPLE_EVENTS_FOUND) => {
            let events = body
                .get("Events")
                .and_then(Value::as_array)
                .map(|list| list.iter().filter_map(parse_event_number).collect())
                .unwrap_or_default();
            Ok(ActiveEvents::Multiple(events))
        }
        Some(EVENT_FOUND) => {
            let tasks = parse_tasks(text)?;
            Ok(tasks.first().map_or(ActiveEvents::None, |task| ActiveEvents::Single(task.event_number)))
        }
        _ => Ok(ActiveEvents::None),
    }
}

/// Parse a category list body: `{data: [...], result}`.
///
/// # Errors
///
/// Returns [`RemoteError::Parse`] for invalid JSON or a missing list.
pub fn parse_categories(text: &str) -> Result<Vec<String>, RemoteError> {
    let body: Value = serde_json::from_str(text).map_err(|e| RemoteError::Parse(e.to_string()))?;
    let data = body
        .get("data")
        .cloned()
        .ok_or_else(|| RemoteError::Parse("categories have no data".to_owned()))?;
    serde_json::from_value(data).map_err(|e| RemoteError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;
