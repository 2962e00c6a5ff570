use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Staff record as returned by the lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Free text. Carries the assignment reference as `Assignment ID: <id>`.
    #[serde(default)]
    pub notes: Option<String>,
}

/// An attendance record already open for this staff member and event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenEntry {
    pub clock_entry_id: String,
    pub checked_in_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffLookup {
    pub staff: StaffRecord,
    #[serde(default)]
    pub open_entry: Option<OpenEntry>,
}

/// The person currently being processed. Lives for one verification cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub staff_id: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub assignment_id: String,
    /// Consecutive `verified = false` results in this cycle.
    pub face_attempts: u32,
}

/// One-shot camera capture.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl CapturedImage {
    pub fn new(bytes: Vec<u8>, captured_at: DateTime<Utc>) -> Self {
        Self { bytes, captured_at }
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("len", &self.bytes.len())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// Local view of an accepted attendance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockEntry {
    pub id: String,
    pub staff_id: String,
    pub event_id: String,
    pub checked_in_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutReceipt {
    pub clock_entry_id: String,
    pub staff_name: String,
    pub checked_out_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    FaceVerificationFailed,
    AlreadyCheckedIn,
    CameraFailure,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::FaceVerificationFailed => write!(f, "faceVerificationFailed"),
            ErrorKind::AlreadyCheckedIn => write!(f, "alreadyCheckedIn"),
            ErrorKind::CameraFailure => write!(f, "cameraFailure"),
            ErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A tagged pipeline failure, consumed by exactly one error screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorContext {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
