//! Fixture-backed authority for running the console without a backend.

use std::sync::{Mutex, PoisonError};

use tracing::info;

use super::{RemoteAuthority, RemoteError};
use crate::board::transform::{CompletionMap, OverviewRow};
use crate::escalation::EscalatePayload;
use crate::events::{ActiveEvents, EventAuthority, NewEvent, NewOverview};
use crate::tasks::{Task, TaskAuthority, TaskStatus, TaskUpdate};

const FIXTURE_ACTIVE_EVENTS: [u64; 3] = [2_430_110_112, 2_430_110_113, 2_430_110_114];
const FIXTURE_CATEGORIES: [&str; 3] = ["SRL", "SRM", "HQ"];

/// Serves four sample events and accepts every escalation.
///
/// Every event shares one fixture checklist, whose statuses persist across
/// updates for the lifetime of the authority. Created events join the active
/// list, and their overview rows join the board of their center.
pub struct MockAuthority {
    tasks: Mutex<Vec<Task>>,
    created_events: Mutex<Vec<u64>>,
    created_rows: Mutex<Vec<OverviewRow>>,
}

impl Default for MockAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAuthority {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(fixture_tasks()),
            created_events: Mutex::new(Vec::new()),
            created_rows: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl RemoteAuthority for MockAuthority {
    async fn fetch_overview(&self, center: &str) -> Result<Vec<OverviewRow>, RemoteError> {
        let created = self.created_rows.lock().unwrap_or_else(PoisonError::into_inner);
        let mut rows = fixture_rows(center);
        rows.extend(created.iter().filter(|row| row.central_id.as_deref() == Some(center)).cloned());
        Ok(rows)
    }

    async fn fetch_completion(&self) -> Result<CompletionMap, RemoteError> {
        Ok(CompletionMap::new())
    }

    async fn escalate(&self, payload: &EscalatePayload) -> Result<bool, RemoteError> {
        info!(event = payload.event_number, direction = payload.direction.as_str(), "mock escalation accepted");
        Ok(true)
    }
}

#[async_trait::async_trait]
impl TaskAuthority for MockAuthority {
    async fn fetch_tasks(&self, center: &str, event: u64) -> Result<Vec<Task>, RemoteError> {
        let tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(tasks
            .iter()
            .map(|task| Task { central_id: center.to_owned(), event_number: event, ..task.clone() })
            .collect())
    }

    async fn update_task_status(&self, update: &TaskUpdate) -> Result<bool, RemoteError> {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(task) = tasks.iter_mut().find(|task| task.uuid == update.uuid) else {
            return Ok(false);
        };
        task.status = update.status;
        task.modified_by.clone_from(&update.modified_by);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl EventAuthority for MockAuthority {
    async fn fetch_active_events(&self, _center: &str) -> Result<ActiveEvents, RemoteError> {
        let created = self.created_events.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(ActiveEvents::Multiple(FIXTURE_ACTIVE_EVENTS.into_iter().chain(created.iter().copied()).collect()))
    }

    async fn fetch_categories(&self) -> Result<Vec<String>, RemoteError> {
        Ok(FIXTURE_CATEGORIES.iter().map(|c| (*c).to_owned()).collect())
    }

    async fn create_event(&self, event: &NewEvent) -> Result<bool, RemoteError> {
        info!(event = event.event_number, center = %event.central_id, "mock event created");
        self.created_events.lock().unwrap_or_else(PoisonError::into_inner).push(event.event_number);
        Ok(true)
    }

    async fn create_overview(&self, overview: &NewOverview) -> Result<bool, RemoteError> {
        let row = OverviewRow {
            uuid: uuid::Uuid::new_v4().to_string(),
            event_number: overview.event_number,
            level: overview.level.clone().unwrap_or_default(),
            incident_level: overview.incident_level.map(|section| section.as_str().to_owned()),
            location: overview.location.clone(),
            location_detail: overview.location_detail.clone(),
            kind: overview.kind.clone().unwrap_or_default(),
            central_id: Some(overview.central_id.clone()),
        };
        self.created_rows.lock().unwrap_or_else(PoisonError::into_inner).push(row);
        Ok(true)
    }
}

fn row(uuid: &str, event: u64, level: &str, location: &str, detail: &str, kind: &str, center: &str) -> OverviewRow {
    OverviewRow {
        uuid: uuid.to_owned(),
        event_number: event,
        level: level.to_owned(),
        incident_level: None,
        location: location.to_owned(),
        location_detail: detail.to_owned(),
        kind: kind.to_owned(),
        central_id: Some(center.to_owned()),
    }
}

fn fixture_rows(center: &str) -> Vec<OverviewRow> {
    vec![
        row("card1", 243_112_345, "allarme", "Villa Guardia", "", "stradale", center),
        row("card2", 24_316_543, "emergenza", "Varese", "Via Gasparotto", "sociali", center),
        row("card3", 24_318_473, "emergenza", "Desio", "", "ferroviario", center),
        row("card4", 243_198_433, "incidente", "Lecco", "Fiocchi munizioni", "esplosione", center),
    ]
}

fn fixture_tasks() -> Vec<Task> {
    let task = |uuid: &str, priority: u32, title: &str, role: &str, status: TaskStatus| Task {
        uuid: uuid.to_owned(),
        event_number: 0,
        event_date: None,
        central_id: String::new(),
        priority,
        title: title.to_owned(),
        description: String::new(),
        role: role.to_owned(),
        status,
        modified_by: String::new(),
        ip_address: String::new(),
        timestamp: None,
    };
    vec![
        task("task1", 1, "Attivare PIM", "Medico", TaskStatus::Done),
        task("task2", 2, "Allertare ospedali", "Infermiere", TaskStatus::Working),
        task("task3", 3, "Inviare mezzi", "Operatore", TaskStatus::NotDone),
    ]
}

#[cfg(test)]
#[path = "mock_test.rs"]
mod mock_test;
