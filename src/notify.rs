//! Transient operator notifications.
//!
//! DESIGN
//! ======
//! A shared queue of short messages that expire after a fixed TTL. Expired
//! entries are pruned on read, so pushing never waits on a timer and never
//! blocks the caller. Every notification is also emitted as a tracing event
//! at a level matching its priority.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Neutral,
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub text: String,
    pub priority: Priority,
    pub created_at: Instant,
}

#[derive(Clone)]
pub struct Notifications {
    queue: Arc<Mutex<VecDeque<Notification>>>,
    ttl: Duration,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL)
    }
}

impl Notifications {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { queue: Arc::new(Mutex::new(VecDeque::new())), ttl }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a notification and return its id.
    pub fn push(&self, text: impl Into<String>, priority: Priority) -> Uuid {
        self.push_at(text, priority, Instant::now())
    }

    fn push_at(&self, text: impl Into<String>, priority: Priority, now: Instant) -> Uuid {
        let text = text.into();
        match priority {
            Priority::Error => error!(%text, "notification"),
            Priority::Warning => warn!(%text, "notification"),
            Priority::Neutral | Priority::Info | Priority::Success => info!(%text, ?priority, "notification"),
        }

        let id = Uuid::new_v4();
        self.lock().push_back(Notification { id, text, priority, created_at: now });
        id
    }

    /// Notifications that have not yet expired, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<Notification> {
        self.active_at(Instant::now())
    }

    fn active_at(&self, now: Instant) -> Vec<Notification> {
        let mut queue = self.lock();
        queue.retain(|n| now.saturating_duration_since(n.created_at) < self.ttl);
        queue.iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "notify_test.rs"]
mod notify_test;
