//! HTTP client for the dispatch backend.
//!
//! Thin `reqwest` wrapper; body parsing lives in the pure `parse_*`
//! functions of the parent module.

use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use super::{RemoteAuthority, RemoteError, parse_ack, parse_completion, parse_overview};
use crate::board::transform::{CompletionMap, OverviewRow};
use crate::config::ConsoleConfig;
use crate::escalation::EscalatePayload;
use crate::events::{ActiveEvents, EventAuthority, NewEvent, NewOverview, parse_active_events, parse_categories};
use crate::tasks::{Task, TaskAuthority, TaskUpdate, parse_tasks};

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpAuthority {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthority {
    /// # Errors
    ///
    /// Returns [`RemoteError::ClientBuild`] if the TLS backend cannot start.
    pub fn new(config: &ConsoleConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(config.http.request)
            .connect_timeout(config.http.connect)
            .build()
            .map_err(|e| RemoteError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.backend_url() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, RemoteError> {
        let url = format!("{}/{path}", self.base_url);
        debug!(%method, %url, "backend request");

        let mut request = self.http.request(method, &url).header("accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|e| RemoteError::Request(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| RemoteError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(RemoteError::Status { status: status.as_u16(), body: text });
        }
        Ok(text)
    }

    async fn get(&self, path: &str) -> Result<String, RemoteError> {
        self.request::<()>(Method::GET, path, None).await
    }
}

#[async_trait::async_trait]
impl RemoteAuthority for HttpAuthority {
    async fn fetch_overview(&self, center: &str) -> Result<Vec<OverviewRow>, RemoteError> {
        let text = self.get(&format!("escalation_aggregation/details/{center}")).await?;
        parse_overview(&text)
    }

    async fn fetch_completion(&self) -> Result<CompletionMap, RemoteError> {
        let text = self.get("completion_aggregation").await?;
        parse_completion(&text)
    }

    async fn escalate(&self, payload: &EscalatePayload) -> Result<bool, RemoteError> {
        let path = format!("escalation_aggregation/{}", payload.direction.as_str());
        let text = self.request(Method::POST, &path, Some(payload)).await?;
        parse_ack(&text)
    }
}

#[async_trait::async_trait]
impl TaskAuthority for HttpAuthority {
    async fn fetch_tasks(&self, center: &str, event: u64) -> Result<Vec<Task>, RemoteError> {
        let text = self.get(&format!("active-events/{center}/{event}")).await?;
        parse_tasks(&text)
    }

    async fn update_task_status(&self, update: &TaskUpdate) -> Result<bool, RemoteError> {
        let text = self.request(Method::PUT, "active-events", Some(update)).await?;
        parse_ack(&text)
    }
}

#[async_trait::async_trait]
impl EventAuthority for HttpAuthority {
    async fn fetch_active_events(&self, center: &str) -> Result<ActiveEvents, RemoteError> {
        // The backend answers a multi-event lookup with 300 Multiple Choices.
        let text = match self.get(&format!("active-events/{center}")).await {
            Ok(text) => text,
            Err(RemoteError::Status { status: 300, body }) => body,
            Err(err) => return Err(err),
        };
        parse_active_events(&text)
    }

    async fn fetch_categories(&self) -> Result<Vec<String>, RemoteError> {
        let text = self.get("tasks").await?;
        parse_categories(&text)
    }

    async fn create_event(&self, event: &NewEvent) -> Result<bool, RemoteError> {
        let text = self.request(Method::POST, "active-events", Some(event)).await?;
        parse_ack(&text)
    }

    async fn create_overview(&self, overview: &NewOverview) -> Result<bool, RemoteError> {
        let text = self.request(Method::POST, "active-events/overview", Some(overview)).await?;
        parse_ack(&text)
    }
}
