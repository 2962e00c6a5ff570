use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::candidate::{Candidate, CapturedImage, CheckOutReceipt, ClockEntry, ErrorContext};
use super::session::{
    CheckInSession, CheckOutSession, EventContext, Operator, SessionSummary,
};
use crate::escalation::EscalationReason;

/// The seventeen kiosk screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Screen {
    AdminLogin,
    EventSelection,
    StaffCheckIn,
    PhotoConfirmation,
    Camera,
    FaceVerification,
    LateArrival,
    CheckInSuccess,
    CheckInError,
    AlreadyCheckedIn,
    AdminHelp,
    VerificationDenied,
    SessionEnded,
    CheckInComplete,
    ForgotPin,
    StaffCheckOut,
    CheckOutSuccess,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::AdminLogin => "ADMIN_LOGIN",
            Screen::EventSelection => "EVENT_SELECTION",
            Screen::StaffCheckIn => "STAFF_CHECK_IN",
            Screen::PhotoConfirmation => "PHOTO_CONFIRMATION",
            Screen::Camera => "CAMERA",
            Screen::FaceVerification => "FACE_VERIFICATION",
            Screen::LateArrival => "LATE_ARRIVAL",
            Screen::CheckInSuccess => "CHECK_IN_SUCCESS",
            Screen::CheckInError => "CHECK_IN_ERROR",
            Screen::AlreadyCheckedIn => "ALREADY_CHECKED_IN",
            Screen::AdminHelp => "ADMIN_HELP",
            Screen::VerificationDenied => "VERIFICATION_DENIED",
            Screen::SessionEnded => "SESSION_ENDED",
            Screen::CheckInComplete => "CHECK_IN_COMPLETE",
            Screen::ForgotPin => "FORGOT_PIN",
            Screen::StaffCheckOut => "STAFF_CHECK_OUT",
            Screen::CheckOutSuccess => "CHECK_OUT_SUCCESS",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    CheckIn,
    CheckOut,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::CheckIn => write!(f, "checkin"),
            Mode::CheckOut => write!(f, "checkout"),
        }
    }
}

/// What a retake needs: the candidate and the clock entry already opened
/// for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryContext {
    pub candidate: Candidate,
    pub clock_entry_id: String,
}

/// Per-screen data while a shift is active. The candidate, clock entry and
/// capture exist only inside the steps that need them, so returning to an
/// idle step drops them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    StaffCheckIn,
    ForgotPin,
    LateArrival {
        candidate: Candidate,
        minutes_late: i64,
    },
    PhotoConfirmation {
        candidate: Candidate,
    },
    Camera {
        candidate: Candidate,
        clock_entry_id: String,
    },
    FaceVerification {
        candidate: Candidate,
        clock_entry_id: String,
        capture: CapturedImage,
    },
    CheckInSuccess {
        name: String,
        entry: ClockEntry,
    },
    CheckInError {
        error: ErrorContext,
        retry: Option<RetryContext>,
    },
    AlreadyCheckedIn {
        name: String,
        checked_in_at: DateTime<Utc>,
    },
    AdminHelp {
        reason: EscalationReason,
    },
    VerificationDenied {
        name: String,
        error: ErrorContext,
    },
    CheckInComplete {
        summary: SessionSummary,
    },
    StaffCheckOut,
    CheckOutSuccess {
        receipt: CheckOutReceipt,
    },
}

impl Step {
    pub fn screen(&self) -> Screen {
        match self {
            Step::StaffCheckIn => Screen::StaffCheckIn,
            Step::ForgotPin => Screen::ForgotPin,
            Step::LateArrival { .. } => Screen::LateArrival,
            Step::PhotoConfirmation { .. } => Screen::PhotoConfirmation,
            Step::Camera { .. } => Screen::Camera,
            Step::FaceVerification { .. } => Screen::FaceVerification,
            Step::CheckInSuccess { .. } => Screen::CheckInSuccess,
            Step::CheckInError { .. } => Screen::CheckInError,
            Step::AlreadyCheckedIn { .. } => Screen::AlreadyCheckedIn,
            Step::AdminHelp { .. } => Screen::AdminHelp,
            Step::VerificationDenied { .. } => Screen::VerificationDenied,
            Step::CheckInComplete { .. } => Screen::CheckInComplete,
            Step::StaffCheckOut => Screen::StaffCheckOut,
            Step::CheckOutSuccess { .. } => Screen::CheckOutSuccess,
        }
    }

    /// The candidate currently being processed, if any.
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            Step::LateArrival { candidate, .. }
            | Step::PhotoConfirmation { candidate }
            | Step::Camera { candidate, .. }
            | Step::FaceVerification { candidate, .. } => Some(candidate),
            Step::CheckInError {
                retry: Some(retry), ..
            } => Some(&retry.candidate),
            _ => None,
        }
    }

    pub fn clock_entry_id(&self) -> Option<&str> {
        match self {
            Step::Camera { clock_entry_id, .. } | Step::FaceVerification { clock_entry_id, .. } => {
                Some(clock_entry_id)
            }
            Step::CheckInError {
                retry: Some(retry), ..
            } => Some(&retry.clock_entry_id),
            _ => None,
        }
    }
}

/// A shift in progress: operator and event are fixed, the check-in session
/// always exists, the check-out session only once opened from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveShift {
    pub operator: Operator,
    pub event: EventContext,
    pub check_in: CheckInSession,
    pub check_out: Option<CheckOutSession>,
    pub step: Step,
}

impl ActiveShift {
    pub fn mode(&self) -> Mode {
        if self.check_out.is_some() {
            Mode::CheckOut
        } else {
            Mode::CheckIn
        }
    }

    /// The resting step for the current mode.
    pub fn idle_step(&self) -> Step {
        match self.mode() {
            Mode::CheckIn => Step::StaffCheckIn,
            Mode::CheckOut => Step::StaffCheckOut,
        }
    }
}

/// Top-level state, one variant per phase of the terminal's day.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KioskState {
    #[default]
    AdminLogin,
    EventSelection {
        operator: Operator,
        events: Vec<EventContext>,
        chosen: Option<EventContext>,
    },
    Active(Box<ActiveShift>),
    SessionEnded {
        operator: Operator,
        summary: SessionSummary,
    },
}

impl KioskState {
    pub fn screen(&self) -> Screen {
        match self {
            KioskState::AdminLogin => Screen::AdminLogin,
            KioskState::EventSelection { .. } => Screen::EventSelection,
            KioskState::Active(shift) => shift.step.screen(),
            KioskState::SessionEnded { .. } => Screen::SessionEnded,
        }
    }

    pub fn operator(&self) -> Option<&Operator> {
        match self {
            KioskState::AdminLogin => None,
            KioskState::EventSelection { operator, .. }
            | KioskState::SessionEnded { operator, .. } => Some(operator),
            KioskState::Active(shift) => Some(&shift.operator),
        }
    }

    pub fn shift(&self) -> Option<&ActiveShift> {
        match self {
            KioskState::Active(shift) => Some(shift),
            _ => None,
        }
    }

    /// `checkin` until a check-out session has been opened.
    pub fn mode(&self) -> Mode {
        self.shift().map(ActiveShift::mode).unwrap_or(Mode::CheckIn)
    }
}
