//! Operator session persisted across restarts.
//!
//! SYSTEM CONTEXT
//! ==============
//! The configuration flow collects, in order, the operator name, the dispatch
//! center, and the event being worked. The board core reads only the center,
//! to scope its overview fetch and its per-center live topic.
//!
//! Requesting a new event from a lane records the lane's level (and the
//! Incidente section) and raises the `newevent` flag until the event is
//! created or the request is cancelled.
//!
//! The file is a flat JSON object keyed by the same `store_*` names the
//! browser console kept in local storage, so state can be carried over.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{LaneKind, SectionId};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(rename = "store_username", default)]
    pub username: Option<String>,
    #[serde(rename = "store_central", default)]
    pub central: Option<String>,
    #[serde(rename = "store_eventnr", default)]
    pub event_nr: Option<u64>,
    #[serde(rename = "store_categories", default)]
    pub categories: Option<Vec<String>>,
    #[serde(rename = "store_newevent", default)]
    pub new_event: bool,
    #[serde(rename = "store_escalation", default)]
    pub escalation: Option<LaneKind>,
    #[serde(rename = "store_incident_level", default)]
    pub incident_level: Option<SectionId>,
}

/// Next piece of configuration the operator still has to provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigStep {
    Username,
    Central,
    EventNr,
    NewEvent,
    Finished,
}

#[derive(Debug)]
pub struct Session {
    path: Option<PathBuf>,
    state: SessionState,
}

impl Session {
    /// Session that is never written to disk.
    #[must_use]
    pub fn in_memory(state: SessionState) -> Self {
        Self { path: None, state }
    }

    /// Load the session at `path`; a missing file yields an empty session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the file exists but cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        let state = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no session file; starting fresh");
                SessionState::default()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path: Some(path), state })
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn central(&self) -> Option<&str> {
        self.state.central.as_deref()
    }

    #[must_use]
    pub fn next_step(&self) -> ConfigStep {
        let state = &self.state;
        if state.username.is_none() {
            ConfigStep::Username
        } else if state.central.is_none() {
            ConfigStep::Central
        } else if state.event_nr.is_none() {
            ConfigStep::EventNr
        } else if state.new_event {
            ConfigStep::NewEvent
        } else {
            ConfigStep::Finished
        }
    }

    /// # Errors
    ///
    /// Returns [`SessionError`] if the session cannot be written.
    pub fn set_username(&mut self, username: Option<String>) -> Result<(), SessionError> {
        self.state.username = username;
        self.save()
    }

    /// Select a dispatch center. Switching to a different center clears the
    /// selected event and categories, which belong to the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the session cannot be written.
    pub fn set_central(&mut self, central: Option<String>) -> Result<(), SessionError> {
        if central != self.state.central {
            self.state.event_nr = None;
            self.state.categories = None;
        }
        self.state.central = central;
        self.save()
    }

    /// # Errors
    ///
    /// Returns [`SessionError`] if the session cannot be written.
    pub fn set_event_nr(&mut self, event_nr: Option<u64>) -> Result<(), SessionError> {
        self.state.event_nr = event_nr;
        self.save()
    }

    /// # Errors
    ///
    /// Returns [`SessionError`] if the session cannot be written.
    pub fn set_categories(&mut self, categories: Option<Vec<String>>) -> Result<(), SessionError> {
        self.state.categories = categories;
        self.save()
    }

    /// # Errors
    ///
    /// Returns [`SessionError`] if the session cannot be written.
    pub fn set_new_event(&mut self, new_event: bool) -> Result<(), SessionError> {
        self.state.new_event = new_event;
        self.save()
    }

    /// # Errors
    ///
    /// Returns [`SessionError`] if the session cannot be written.
    pub fn set_incident_level(&mut self, level: Option<SectionId>) -> Result<(), SessionError> {
        self.state.incident_level = level;
        self.save()
    }

    /// Request a new event at `kind`. The section is kept only for Incidente.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the session cannot be written.
    pub fn open_new_event(&mut self, kind: LaneKind, section: Option<SectionId>) -> Result<(), SessionError> {
        self.state.escalation = Some(kind);
        self.state.incident_level = section.filter(|_| kind == LaneKind::Incidente);
        self.state.new_event = true;
        self.save()
    }

    /// Drop a pending new-event request.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the session cannot be written.
    pub fn cancel_new_event(&mut self) -> Result<(), SessionError> {
        self.state.new_event = false;
        self.state.incident_level = None;
        self.save()
    }

    /// Close a request whose event was created; the operator selects the
    /// event to work next.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the session cannot be written.
    pub fn finish_new_event(&mut self) -> Result<(), SessionError> {
        self.state.event_nr = None;
        self.cancel_new_event()
    }

    fn save(&self) -> Result<(), SessionError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let raw = serde_json::to_string_pretty(&self.state)?;
        fs::write(path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
