//! Shared-terminal attendance kiosk.
//!
//! An operator signs in, picks an event and opens a check-in session; staff
//! then check themselves in one at a time with a PIN, a photo confirmation
//! and a face match. The [`state_machine::SessionController`] decides every
//! transition, and the [`kiosk::KioskRuntime`] performs the remote calls and
//! timers it asks for.

pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod connectivity;
pub mod countdown;
pub mod error;
pub mod escalation;
pub mod kiosk;
pub mod state_machine;
pub mod ui;
pub mod verification;
