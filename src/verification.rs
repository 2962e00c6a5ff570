//! Verification pipeline rules.
//!
//! The controller walks a candidate through lookup → late check → photo
//! confirmation → capture → face match. This module holds the decisions made
//! along the way; it performs no I/O and holds no state of its own.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::{ServiceFailure, ValidationError};
use crate::state_machine::{
    Candidate, ErrorContext, ErrorKind, EventContext, StaffLookup, StaffRecord,
};

pub const FACE_VERIFICATION_FAILED_MESSAGE: &str =
    "Face verification failed. Please try again or get admin help.";

pub const VERIFICATION_DENIED_MESSAGE: &str =
    "We could not verify your identity. Please see an administrator.";

static ASSIGNMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)assignment\s+id\s*:\s*([A-Za-z0-9_-]+)").expect("assignment pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    /// Arrivals strictly later than this many minutes after start are late.
    pub late_threshold_minutes: i64,
    /// Consecutive face mismatches before the candidate is denied.
    pub max_face_attempts: u32,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            late_threshold_minutes: 15,
            max_face_attempts: 3,
        }
    }
}

/// What the lookup tells us to show next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupDecision {
    AlreadyCheckedIn {
        name: String,
        checked_in_at: DateTime<Utc>,
    },
    Late {
        candidate: Candidate,
        minutes_late: i64,
    },
    OnTime {
        candidate: Candidate,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaceOutcome {
    Verified,
    Rejected(ErrorContext),
    Denied(ErrorContext),
}

/// Pulls the assignment reference out of the staff notes field.
// TODO: drop once the staff lookup returns the assignment id as its own field.
pub fn parse_assignment_id(notes: &str) -> Option<String> {
    ASSIGNMENT_PATTERN
        .captures(notes)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whole minutes between the event start and `now`, rounded down.
pub fn minutes_late(starts_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - starts_at).num_seconds().div_euclid(60)
}

pub fn candidate_from_staff(staff: &StaffRecord) -> Result<Candidate, ValidationError> {
    let assignment_id = staff
        .notes
        .as_deref()
        .and_then(parse_assignment_id)
        .ok_or_else(|| ValidationError::MissingAssignment {
            staff_name: staff.name.clone(),
        })?;
    Ok(Candidate {
        staff_id: staff.id.clone(),
        name: staff.name.clone(),
        photo_url: staff.photo_url.clone(),
        assignment_id,
        face_attempts: 0,
    })
}

pub fn assess_lookup(
    lookup: &StaffLookup,
    event: &EventContext,
    now: DateTime<Utc>,
    policy: VerificationPolicy,
) -> Result<LookupDecision, ValidationError> {
    if let Some(entry) = &lookup.open_entry {
        return Ok(LookupDecision::AlreadyCheckedIn {
            name: lookup.staff.name.clone(),
            checked_in_at: entry.checked_in_at,
        });
    }

    let candidate = candidate_from_staff(&lookup.staff)?;
    let late = minutes_late(event.starts_at, now);
    if late > policy.late_threshold_minutes {
        Ok(LookupDecision::Late {
            candidate,
            minutes_late: late,
        })
    } else {
        Ok(LookupDecision::OnTime { candidate })
    }
}

/// Maps the face-match result. Only `Ok(true)` verifies; mismatches count
/// against the candidate and turn into a denial once the budget is spent.
pub fn classify_face_result(
    result: Result<bool, ServiceFailure>,
    candidate: &mut Candidate,
    policy: VerificationPolicy,
) -> FaceOutcome {
    match result {
        Ok(true) => FaceOutcome::Verified,
        Ok(false) => {
            candidate.face_attempts += 1;
            if candidate.face_attempts >= policy.max_face_attempts {
                FaceOutcome::Denied(ErrorContext::new(
                    ErrorKind::FaceVerificationFailed,
                    VERIFICATION_DENIED_MESSAGE,
                ))
            } else {
                FaceOutcome::Rejected(ErrorContext::new(
                    ErrorKind::FaceVerificationFailed,
                    FACE_VERIFICATION_FAILED_MESSAGE,
                ))
            }
        }
        Err(failure) => {
            FaceOutcome::Rejected(ErrorContext::new(ErrorKind::Unknown, failure.user_message()))
        }
    }
}
