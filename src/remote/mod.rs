//! Remote dispatch authority: overview, completion, and escalation RPCs.
//!
//! DESIGN
//! ======
//! The console core talks to the backend only through [`RemoteAuthority`],
//! so tests and mock mode substitute scripted implementations. Responses are
//! parsed by pure functions that take the raw body text.
//!
//! ERROR HANDLING
//! ==============
//! A failed overview or completion fetch is a degraded result, not a fatal
//! one: [`load_board`] logs the cause and returns the empty lane skeleton.
//! A failed escalation surfaces to the move coordinator, which turns it into
//! an operator notification.

pub mod http;
pub mod mock;

use serde_json::Value;
use tracing::warn;

use crate::board::transform::{CompletionMap, OverviewRow, parse_completion_map, transform};
use crate::board::{Lane, default_lanes};
use crate::escalation::EscalatePayload;

pub use http::HttpAuthority;
pub use mock::MockAuthority;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP client could not be constructed.
    #[error("http client build failed: {0}")]
    ClientBuild(String),

    /// The request could not be sent or its body not read.
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}")]
    Status { status: u16, body: String },

    /// The body did not have the expected shape.
    #[error("response parse failed: {0}")]
    Parse(String),
}

/// Backend operations consumed by the board core.
#[async_trait::async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Overview rows for one dispatch center.
    async fn fetch_overview(&self, center: &str) -> Result<Vec<OverviewRow>, RemoteError>;

    /// Completion counters for every event, keyed by event number.
    async fn fetch_completion(&self) -> Result<CompletionMap, RemoteError>;

    /// Persist an escalation. `Ok(false)` means the backend refused it.
    async fn escalate(&self, payload: &EscalatePayload) -> Result<bool, RemoteError>;
}

/// Fetch and assemble the board for `center`.
///
/// # Errors
///
/// Returns the first [`RemoteError`] from either fetch.
pub async fn try_load_board(remote: &dyn RemoteAuthority, center: &str) -> Result<Vec<Lane>, RemoteError> {
    let rows = remote.fetch_overview(center).await?;
    let completion = remote.fetch_completion().await?;
    Ok(transform(&rows, &completion))
}

/// Fetch the board for `center`, substituting empty lanes on failure.
pub async fn load_board(remote: &dyn RemoteAuthority, center: &str) -> Vec<Lane> {
    match try_load_board(remote, center).await {
        Ok(lanes) => lanes,
        Err(err) => {
            warn!(%center, error = %err, "board fetch failed; showing empty board");
            default_lanes()
        }
    }
}

/// Interpret a backend `result` field.
///
/// Older endpoints answer with a status sentence instead of a boolean; any
/// non-empty string counts as success. A missing field defers to the HTTP
/// status, which already succeeded by the time the body is read.
#[must_use]
pub fn result_flag(body: &Value) -> bool {
    match body.get("result") {
        None | Some(Value::Null) => true,
        Some(Value::Bool(ok)) => *ok,
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(_) => false,
    }
}

/// Parse an overview response body: `{data: [row, ...], result}`.
///
/// # Errors
///
/// Returns [`RemoteError::Parse`] for invalid JSON, a false `result`, or a
/// missing or malformed `data` array.
pub fn parse_overview(text: &str) -> Result<Vec<OverviewRow>, RemoteError> {
    let body: Value = serde_json::from_str(text).map_err(|e| RemoteError::Parse(e.to_string()))?;
    if !result_flag(&body) {
        return Err(RemoteError::Parse("overview result is false".to_owned()));
    }
    let data = body
        .get("data")
        .cloned()
        .ok_or_else(|| RemoteError::Parse("overview has no data".to_owned()))?;
    serde_json::from_value(data).map_err(|e| RemoteError::Parse(e.to_string()))
}

/// Parse a completion aggregation body.
///
/// # Errors
///
/// Returns [`RemoteError::Parse`] for invalid JSON.
pub fn parse_completion(text: &str) -> Result<CompletionMap, RemoteError> {
    let body: Value = serde_json::from_str(text).map_err(|e| RemoteError::Parse(e.to_string()))?;
    Ok(parse_completion_map(&body))
}

/// Parse an acknowledgement body into its success flag.
///
/// # Errors
///
/// Returns [`RemoteError::Parse`] for invalid JSON. An empty body is success.
pub fn parse_ack(text: &str) -> Result<bool, RemoteError> {
    if text.trim().is_empty() {
        return Ok(true);
    }
    let body: Value = serde_json::from_str(text).map_err(|e| RemoteError::Parse(e.to_string()))?;
    Ok(result_flag(&body))
}

#[cfg(test)]
pub mod test_helpers {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use tokio::sync::Notify;

    use super::{RemoteAuthority, RemoteError};
    use crate::board::transform::{CompletionMap, OverviewRow};
    use crate::escalation::EscalatePayload;

    pub fn row(uuid: &str, event: u64, level: &str, incident_level: Option<&str>) -> OverviewRow {
        OverviewRow {
            uuid: uuid.to_owned(),
            event_number: event,
            level: level.to_owned(),
            incident_level: incident_level.map(str::to_owned),
            location: "Como".to_owned(),
            location_detail: String::new(),
            kind: "stradale".to_owned(),
            central_id: Some("SRA".to_owned()),
        }
    }

    /// Authority with scripted replies. Escalations succeed unless a reply
    /// is queued; an installed gate holds every escalation until notified.
    #[derive(Default)]
    pub struct ScriptedAuthority {
        pub overview: Mutex<Vec<OverviewRow>>,
        pub overview_error: Mutex<Option<RemoteError>>,
        pub completion: Mutex<CompletionMap>,
        pub escalate_replies: Mutex<VecDeque<Result<bool, RemoteError>>>,
        pub escalations: Mutex<Vec<EscalatePayload>>,
        pub overview_calls: AtomicUsize,
        pub gate: Mutex<Option<Arc<Notify>>>,
    }

    impl ScriptedAuthority {
        pub fn with_rows(rows: Vec<OverviewRow>) -> Self {
            Self { overview: Mutex::new(rows), ..Self::default() }
        }

        pub fn reply(&self, reply: Result<bool, RemoteError>) {
            self.escalate_replies.lock().unwrap().push_back(reply);
        }

        pub fn install_gate(&self) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            *self.gate.lock().unwrap() = Some(gate.clone());
            gate
        }

        pub fn escalation_count(&self) -> usize {
            self.escalations.lock().unwrap().len()
        }

        pub fn overview_count(&self) -> usize {
            self.overview_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl RemoteAuthority for ScriptedAuthority {
        async fn fetch_overview(&self, _center: &str) -> Result<Vec<OverviewRow>, RemoteError> {
            self.overview_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.overview_error.lock().unwrap().clone() {
                return Err(err);
            }
            Ok(self.overview.lock().unwrap().clone())
        }

        async fn fetch_completion(&self) -> Result<CompletionMap, RemoteError> {
            Ok(self.completion.lock().unwrap().clone())
        }

        async fn escalate(&self, payload: &EscalatePayload) -> Result<bool, RemoteError> {
            self.escalations.lock().unwrap().push(payload.clone());
            let gate = self.gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            self.escalate_replies.lock().unwrap().pop_front().unwrap_or(Ok(true))
        }
    }
}
