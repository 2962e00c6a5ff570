//! Operator escalation and screen timeouts.
//!
//! When automation cannot resolve a candidate the terminal asks for a human.
//! Every waiting screen is bounded: on expiry the controller goes back to
//! the idle screen of the current mode, and an operator cancel always wins
//! over the timer.

use serde::{Deserialize, Serialize};

use crate::state_machine::{ErrorContext, ErrorKind, Screen};

pub const ADMIN_HELP_TIMEOUT_NOTICE: &str = "No administrator responded. Returning to the start screen.";

/// Why the terminal is waiting for an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscalationReason {
    CameraFailure(String),
    VerificationFailed(ErrorContext),
    RepeatedDenial,
    OperatorRequested,
}

impl EscalationReason {
    pub fn from_error(error: &ErrorContext) -> Self {
        match error.kind {
            ErrorKind::CameraFailure => EscalationReason::CameraFailure(error.message.clone()),
            _ => EscalationReason::VerificationFailed(error.clone()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            EscalationReason::CameraFailure(msg) => format!("Camera problem: {msg}"),
            EscalationReason::VerificationFailed(err) => {
                format!("Verification failed ({}): {}", err.kind, err.message)
            }
            EscalationReason::RepeatedDenial => "Identity could not be verified".to_string(),
            EscalationReason::OperatorRequested => "Assistance requested".to_string(),
        }
    }
}

/// Seconds each timed screen waits before returning to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    pub admin_help_secs: u32,
    pub error_return_secs: u32,
    pub success_advance_secs: u32,
    pub already_checked_in_secs: u32,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            admin_help_secs: 120,
            error_return_secs: 30,
            success_advance_secs: 5,
            already_checked_in_secs: 5,
        }
    }
}

impl EscalationPolicy {
    /// `None` for screens that wait indefinitely for input.
    pub fn timeout_for(&self, screen: Screen) -> Option<u32> {
        match screen {
            Screen::AdminHelp => Some(self.admin_help_secs),
            Screen::CheckInError | Screen::VerificationDenied => Some(self.error_return_secs),
            Screen::CheckInSuccess | Screen::CheckOutSuccess => Some(self.success_advance_secs),
            Screen::AlreadyCheckedIn => Some(self.already_checked_in_secs),
            _ => None,
        }
    }
}
