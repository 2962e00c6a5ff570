use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::candidate::{CapturedImage, CheckOutReceipt, StaffLookup};
use super::session::{EventContext, Operator, SessionInfo};
use crate::error::ServiceFailure;

/// Identifies one screen instance. Advances on every screen change; async
/// completions and countdown ticks carrying an older value are discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Everything the controller reacts to: operator input, device input, remote
/// completions, timers and connectivity changes.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // Operator / candidate input.
    LoginSubmitted { email: String, password: String },
    EventChosen { event_id: String },
    PinSubmitted { pin: String },
    Acknowledge,
    ConfirmPhoto,
    RejectPhoto,
    TryAgain,
    RetakePhoto,
    GetHelp,
    Cancel,
    ForgotPin,
    PinResetRequested { identifier: String },
    EndSession,
    FinishShift,
    BeginCheckOut,
    SelectAnotherEvent,
    Logout,

    // Camera device.
    PhotoCaptured { image: CapturedImage },
    CaptureFailed { message: String },

    // Remote completions.
    LoginCompleted {
        token: Generation,
        result: Result<Operator, ServiceFailure>,
    },
    EventsLoaded {
        token: Generation,
        result: Result<Vec<EventContext>, ServiceFailure>,
    },
    CheckInSessionStarted {
        token: Generation,
        result: Result<SessionInfo, ServiceFailure>,
    },
    StaffLookedUp {
        token: Generation,
        result: Result<StaffLookup, ServiceFailure>,
    },
    CheckInInitiated {
        token: Generation,
        result: Result<String, ServiceFailure>,
    },
    FaceVerified {
        token: Generation,
        result: Result<bool, ServiceFailure>,
    },
    PinResetCompleted {
        token: Generation,
        result: Result<(), ServiceFailure>,
    },
    CheckOutSessionStarted {
        token: Generation,
        result: Result<SessionInfo, ServiceFailure>,
    },
    CheckedOut {
        token: Generation,
        result: Result<CheckOutReceipt, ServiceFailure>,
    },
    SessionCloseConfirmed {
        session_id: String,
        result: Result<(), ServiceFailure>,
    },

    // Timers and signals.
    CountdownTick { token: Generation },
    AutoCloseDue { session_id: String },
    ConnectivityChanged { online: bool },
}

impl Event {
    /// Token of a remote completion, `None` for every other event.
    pub fn response_token(&self) -> Option<Generation> {
        match self {
            Event::LoginCompleted { token, .. }
            | Event::EventsLoaded { token, .. }
            | Event::CheckInSessionStarted { token, .. }
            | Event::StaffLookedUp { token, .. }
            | Event::CheckInInitiated { token, .. }
            | Event::FaceVerified { token, .. }
            | Event::PinResetCompleted { token, .. }
            | Event::CheckOutSessionStarted { token, .. }
            | Event::CheckedOut { token, .. } => Some(*token),
            _ => None,
        }
    }

    /// Inputs that issue a remote request. Ignored while one is in flight.
    pub fn issues_request(&self) -> bool {
        matches!(
            self,
            Event::LoginSubmitted { .. }
                | Event::EventChosen { .. }
                | Event::PinSubmitted { .. }
                | Event::ConfirmPhoto
                | Event::PinResetRequested { .. }
                | Event::BeginCheckOut
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::LoginSubmitted { .. } => "login_submitted",
            Event::EventChosen { .. } => "event_chosen",
            Event::PinSubmitted { .. } => "pin_submitted",
            Event::Acknowledge => "acknowledge",
            Event::ConfirmPhoto => "confirm_photo",
            Event::RejectPhoto => "reject_photo",
            Event::TryAgain => "try_again",
            Event::RetakePhoto => "retake_photo",
            Event::GetHelp => "get_help",
            Event::Cancel => "cancel",
            Event::ForgotPin => "forgot_pin",
            Event::PinResetRequested { .. } => "pin_reset_requested",
            Event::EndSession => "end_session",
            Event::FinishShift => "finish_shift",
            Event::BeginCheckOut => "begin_check_out",
            Event::SelectAnotherEvent => "select_another_event",
            Event::Logout => "logout",
            Event::PhotoCaptured { .. } => "photo_captured",
            Event::CaptureFailed { .. } => "capture_failed",
            Event::LoginCompleted { .. } => "login_completed",
            Event::EventsLoaded { .. } => "events_loaded",
            Event::CheckInSessionStarted { .. } => "check_in_session_started",
            Event::StaffLookedUp { .. } => "staff_looked_up",
            Event::CheckInInitiated { .. } => "check_in_initiated",
            Event::FaceVerified { .. } => "face_verified",
            Event::PinResetCompleted { .. } => "pin_reset_completed",
            Event::CheckOutSessionStarted { .. } => "check_out_session_started",
            Event::CheckedOut { .. } => "checked_out",
            Event::SessionCloseConfirmed { .. } => "session_close_confirmed",
            Event::CountdownTick { .. } => "countdown_tick",
            Event::AutoCloseDue { .. } => "auto_close_due",
            Event::ConnectivityChanged { .. } => "connectivity_changed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A non-blocking toast. Never changes the screen by itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Work the runtime performs on the controller's behalf. Every request
/// effect answers with exactly one event carrying the same token.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Authenticate {
        token: Generation,
        email: String,
        password: String,
    },
    LoadEvents {
        token: Generation,
    },
    StartCheckInSession {
        token: Generation,
        event_id: String,
        operator_id: String,
    },
    EndCheckInSession {
        session_id: String,
    },
    LookupStaff {
        token: Generation,
        pin: String,
        event_id: String,
    },
    InitiateCheckIn {
        token: Generation,
        staff_id: String,
        event_id: String,
        assignment_id: String,
    },
    VerifyFace {
        token: Generation,
        clock_entry_id: String,
        image: CapturedImage,
    },
    RequestPinReset {
        token: Generation,
        identifier: String,
    },
    StartCheckOutSession {
        token: Generation,
        event_id: String,
        operator_id: String,
    },
    CheckOut {
        token: Generation,
        pin: String,
        event_id: String,
        session_id: String,
    },
    EndCheckOutSession {
        session_id: String,
    },
    StartCountdown {
        token: Generation,
        secs: u32,
    },
    CancelCountdown,
    ScheduleAutoClose {
        session_id: String,
        at: DateTime<Utc>,
    },
    CancelAutoClose,
    Notify(Notice),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_advances() {
        let g = Generation::default();
        assert_eq!(g.value(), 0);
        assert_eq!(g.next().next().value(), 2);
        assert!(g.next() > g);
        assert_eq!(g.next().to_string(), "g1");
    }

    #[test]
    fn response_tokens() {
        let token = Generation::default().next();
        let event = Event::FaceVerified {
            token,
            result: Ok(true),
        };
        assert_eq!(event.response_token(), Some(token));
        assert_eq!(Event::Cancel.response_token(), None);
        assert_eq!(Event::CountdownTick { token }.response_token(), None);
    }

    #[test]
    fn request_inputs() {
        assert!(Event::ConfirmPhoto.issues_request());
        assert!(Event::PinSubmitted { pin: "1234".into() }.issues_request());
        assert!(!Event::Cancel.issues_request());
        assert!(!Event::RejectPhoto.issues_request());
    }
}
