use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The authenticated administrator running the terminal for a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: String,
    pub name: String,
}

/// The event being staffed. Immutable once chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    pub id: String,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Confirmation returned by the session-start endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Open,
    Closed,
}

/// Upper bound accepted for `auto_close_minutes`.
pub const MAX_AUTO_CLOSE_MINUTES: i64 = 24 * 60;

/// Session lifecycle knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Minutes after start at which an open check-in session closes itself.
    pub auto_close_minutes: i64,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            auto_close_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInSession {
    pub id: String,
    pub event_id: String,
    pub operator_id: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_checked_in: u32,
    pub auto_close_at: DateTime<Utc>,
}

impl CheckInSession {
    pub fn open(
        info: SessionInfo,
        event: &EventContext,
        operator: &Operator,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            id: info.id,
            event_id: event.id.clone(),
            operator_id: operator.id.clone(),
            status: SessionStatus::Open,
            started_at: info.started_at,
            ended_at: None,
            total_checked_in: 0,
            auto_close_at: deadline_after(info.started_at, policy.auto_close_minutes),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    pub fn is_due_for_auto_close(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && now >= self.auto_close_at
    }

    /// Counts one verified check-in. Never decremented.
    pub(crate) fn record_check_in(&mut self) -> u32 {
        self.total_checked_in += 1;
        self.total_checked_in
    }

    pub(crate) fn close(&mut self, now: DateTime<Utc>) {
        if self.is_open() {
            self.status = SessionStatus::Closed;
            self.ended_at = Some(now);
        }
    }
}

// A deadline outside chrono's range means the session never closes itself.
fn deadline_after(started_at: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    Duration::try_minutes(minutes)
        .and_then(|delta| started_at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutSession {
    pub id: String,
    pub event_id: String,
    pub operator_id: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_checked_out: u32,
}

impl CheckOutSession {
    /// Opens a check-out window. Requires the check-in session of the same
    /// event; there is no other way to construct one.
    pub fn open(
        info: SessionInfo,
        event: &EventContext,
        operator: &Operator,
        check_in: &CheckInSession,
    ) -> Result<Self, ValidationError> {
        if check_in.event_id != event.id {
            return Err(ValidationError::EventMismatch {
                expected: event.id.clone(),
                actual: check_in.event_id.clone(),
            });
        }
        Ok(Self {
            id: info.id,
            event_id: event.id.clone(),
            operator_id: operator.id.clone(),
            status: SessionStatus::Open,
            started_at: info.started_at,
            ended_at: None,
            total_checked_out: 0,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Advisory only: the operator may end check-out at any count.
    pub fn all_checked_out(&self, check_in: &CheckInSession) -> bool {
        self.total_checked_out >= check_in.total_checked_in
    }

    pub(crate) fn record_check_out(&mut self) -> u32 {
        self.total_checked_out += 1;
        self.total_checked_out
    }

    pub(crate) fn close(&mut self, now: DateTime<Utc>) {
        if self.is_open() {
            self.status = SessionStatus::Closed;
            self.ended_at = Some(now);
        }
    }
}

/// End-of-session numbers shown on CheckInComplete and SessionEnded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub event_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub total_checked_in: u32,
    pub total_checked_out: Option<u32>,
}

impl SessionSummary {
    pub fn build(
        event: &EventContext,
        check_in: &CheckInSession,
        check_out: Option<&CheckOutSession>,
        now: DateTime<Utc>,
    ) -> Self {
        let ended_at = check_out
            .and_then(|s| s.ended_at)
            .or(check_in.ended_at)
            .unwrap_or(now);
        Self {
            event_name: event.name.clone(),
            started_at: check_in.started_at,
            ended_at,
            total_checked_in: check_in.total_checked_in,
            total_checked_out: check_out.map(|s| s.total_checked_out),
        }
    }

    /// Staff checked in but not yet checked out.
    pub fn still_on_site(&self) -> Option<u32> {
        self.total_checked_out
            .map(|out| self.total_checked_in.saturating_sub(out))
    }
}
