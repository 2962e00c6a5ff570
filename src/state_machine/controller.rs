use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::candidate::ClockEntry;
use super::event::{Effect, Event, Generation, Notice};
use super::session::{
    CheckInSession, CheckOutSession, LifecyclePolicy, SessionSummary,
};
use super::state::{ActiveShift, KioskState, Mode, RetryContext, Screen, Step};
use crate::clock::Clock;
use crate::connectivity::ConnectivityStatus;
use crate::countdown::{Countdown, Tick};
use crate::error::ValidationError;
use crate::escalation::{ADMIN_HELP_TIMEOUT_NOTICE, EscalationPolicy, EscalationReason};
use crate::verification::{self, FaceOutcome, LookupDecision, VerificationPolicy};

const HISTORY_LIMIT: usize = 256;

/// All tunables of the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KioskPolicy {
    pub verification: VerificationPolicy,
    pub escalation: EscalationPolicy,
    pub lifecycle: LifecyclePolicy,
}

/// Owns the kiosk's only mutable state bag. [`SessionController::dispatch`]
/// is the single path that writes to it.
pub struct SessionController {
    state: KioskState,
    generation: Generation,
    in_flight: bool,
    countdown: Option<Countdown>,
    connectivity: ConnectivityStatus,
    history: VecDeque<Screen>,
    policy: KioskPolicy,
    clock: Box<dyn Clock>,
}

impl SessionController {
    pub fn new(policy: KioskPolicy, clock: impl Clock + 'static) -> Self {
        let mut history = VecDeque::with_capacity(HISTORY_LIMIT);
        history.push_back(Screen::AdminLogin);
        Self {
            state: KioskState::AdminLogin,
            generation: Generation::default(),
            in_flight: false,
            countdown: None,
            connectivity: ConnectivityStatus::default(),
            history,
            policy,
            clock: Box::new(clock),
        }
    }

    pub fn state(&self) -> &KioskState {
        &self.state
    }

    pub fn screen(&self) -> Screen {
        self.state.screen()
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// A remote request issued from the current screen has not answered yet.
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        self.countdown.as_ref()
    }

    pub fn connectivity(&self) -> ConnectivityStatus {
        self.connectivity
    }

    /// Screens visited, oldest first, bounded.
    pub fn history(&self) -> &VecDeque<Screen> {
        &self.history
    }

    pub fn policy(&self) -> &KioskPolicy {
        &self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Applies exactly one transition and returns the work the runtime must
    /// perform for it.
    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        let mut fx = Vec::new();
        let name = event.name();

        match &event {
            Event::ConnectivityChanged { online } => {
                self.on_connectivity(*online, &mut fx);
                return fx;
            }
            Event::SessionCloseConfirmed { session_id, result } => {
                if let Err(failure) = result {
                    warn!(session_id = %session_id, error = %failure, "Session close not confirmed");
                    fx.push(Effect::Notify(Notice::warning(format!(
                        "The server did not confirm closing the session: {}",
                        failure.user_message()
                    ))));
                }
                return fx;
            }
            _ => {}
        }

        if let Some(token) = event.response_token() {
            if !self.in_flight || token != self.generation {
                debug!(event = name, %token, current = %self.generation, "Discarding stale completion");
                return fx;
            }
            self.in_flight = false;
        } else if event.issues_request() && self.in_flight {
            debug!(event = name, "Request already in flight, input ignored");
            return fx;
        }

        let before = self.state.screen();
        let state = std::mem::take(&mut self.state);
        self.state = match event {
            Event::CountdownTick { token } => self.on_tick(state, token, &mut fx),
            event => self.apply(state, event, &mut fx),
        };

        let after = self.state.screen();
        if before != after {
            self.enter(before, after, &mut fx);
        }
        fx
    }

    fn on_connectivity(&mut self, online: bool, fx: &mut Vec<Effect>) {
        if self.connectivity.online == online {
            return;
        }
        self.connectivity.online = online;
        let notice = if online {
            Notice::info("Back online")
        } else {
            Notice::warning("Connection lost. Check-ins need a network connection.")
        };
        fx.push(Effect::Notify(notice));
    }

    /// Entry actions of the new screen. A new generation makes every pending
    /// completion and tick of the previous screen stale.
    fn enter(&mut self, from: Screen, to: Screen, fx: &mut Vec<Effect>) {
        self.generation = self.generation.next();
        self.in_flight = false;
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(to);
        info!(from = %from, to = %to, generation = %self.generation, "Screen transition");

        if self.countdown.take().is_some() {
            fx.push(Effect::CancelCountdown);
        }
        if let Some(secs) = self.policy.escalation.timeout_for(to) {
            self.countdown = Some(Countdown::new(self.generation, secs));
            fx.push(Effect::StartCountdown {
                token: self.generation,
                secs,
            });
        }

        match &self.state {
            KioskState::EventSelection { .. } => {
                self.in_flight = true;
                fx.push(Effect::LoadEvents {
                    token: self.generation,
                });
            }
            KioskState::Active(shift) => {
                if let Step::FaceVerification {
                    clock_entry_id,
                    capture,
                    ..
                } = &shift.step
                {
                    self.in_flight = true;
                    fx.push(Effect::VerifyFace {
                        token: self.generation,
                        clock_entry_id: clock_entry_id.clone(),
                        image: capture.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    fn on_tick(&mut self, state: KioskState, token: Generation, fx: &mut Vec<Effect>) -> KioskState {
        let Some(countdown) = self.countdown.as_mut() else {
            return state;
        };
        match countdown.tick(token) {
            Tick::Stale => {
                debug!(%token, current = %self.generation, "Discarding stale countdown tick");
                state
            }
            Tick::Remaining(_) => state,
            Tick::Expired => self.expire(state, fx),
        }
    }

    fn expire(&mut self, state: KioskState, fx: &mut Vec<Effect>) -> KioskState {
        match state {
            KioskState::Active(shift) => {
                let screen = shift.step.screen();
                info!(screen = %screen, "Screen timed out");
                if screen == Screen::AdminHelp {
                    warn!("Admin help request timed out");
                    fx.push(Effect::Notify(Notice::warning(ADMIN_HELP_TIMEOUT_NOTICE)));
                }
                self.return_to_idle(shift, fx)
            }
            other => other,
        }
    }

    fn apply(&mut self, state: KioskState, event: Event, fx: &mut Vec<Effect>) -> KioskState {
        match (state, event) {
            (KioskState::AdminLogin, Event::LoginSubmitted { email, password }) => {
                if email.trim().is_empty() || password.is_empty() {
                    fx.push(Effect::Notify(Notice::error("Email and password are required")));
                } else {
                    self.in_flight = true;
                    fx.push(Effect::Authenticate {
                        token: self.generation,
                        email: email.trim().to_string(),
                        password,
                    });
                }
                KioskState::AdminLogin
            }
            (KioskState::AdminLogin, Event::LoginCompleted { result, .. }) => match result {
                Ok(operator) => {
                    info!(operator_id = %operator.id, "Operator signed in");
                    KioskState::EventSelection {
                        operator,
                        events: Vec::new(),
                        chosen: None,
                    }
                }
                Err(failure) => {
                    fx.push(Effect::Notify(Notice::error(format!(
                        "Login failed: {}",
                        failure.user_message()
                    ))));
                    KioskState::AdminLogin
                }
            },

            (KioskState::EventSelection { operator, chosen, .. }, Event::EventsLoaded { result, .. }) => {
                let events = result.unwrap_or_else(|failure| {
                    fx.push(Effect::Notify(Notice::error(format!(
                        "Could not load events: {}",
                        failure.user_message()
                    ))));
                    Vec::new()
                });
                KioskState::EventSelection {
                    operator,
                    events,
                    chosen,
                }
            }
            // Reload after a failed listing.
            (KioskState::EventSelection { operator, chosen: None, .. }, Event::TryAgain)
                if !self.in_flight =>
            {
                self.in_flight = true;
                fx.push(Effect::LoadEvents {
                    token: self.generation,
                });
                KioskState::EventSelection {
                    operator,
                    events: Vec::new(),
                    chosen: None,
                }
            }
            (KioskState::EventSelection { operator, events, .. }, Event::EventChosen { event_id }) => {
                let Some(event) = events.iter().find(|e| e.id == event_id).cloned() else {
                    fx.push(Effect::Notify(Notice::error(
                        ValidationError::UnknownEvent(event_id).to_string(),
                    )));
                    return KioskState::EventSelection {
                        operator,
                        events,
                        chosen: None,
                    };
                };
                self.in_flight = true;
                fx.push(Effect::StartCheckInSession {
                    token: self.generation,
                    event_id: event.id.clone(),
                    operator_id: operator.id.clone(),
                });
                KioskState::EventSelection {
                    operator,
                    events,
                    chosen: Some(event),
                }
            }
            (
                KioskState::EventSelection {
                    operator,
                    events,
                    chosen,
                },
                Event::CheckInSessionStarted { result, .. },
            ) => match (result, chosen) {
                (Ok(info), Some(event)) => {
                    let check_in = CheckInSession::open(info, &event, &operator, self.policy.lifecycle);
                    info!(
                        session_id = %check_in.id,
                        event_id = %event.id,
                        auto_close_at = %check_in.auto_close_at,
                        "Check-in session opened"
                    );
                    fx.push(Effect::ScheduleAutoClose {
                        session_id: check_in.id.clone(),
                        at: check_in.auto_close_at,
                    });
                    fx.push(Effect::Notify(Notice::success(format!(
                        "Check-in started for {}",
                        event.name
                    ))));
                    KioskState::Active(Box::new(ActiveShift {
                        operator,
                        event,
                        check_in,
                        check_out: None,
                        step: Step::StaffCheckIn,
                    }))
                }
                (Err(failure), _) => {
                    warn!(error = %failure, "Check-in session start failed");
                    fx.push(Effect::Notify(Notice::error(format!(
                        "Failed to start check-in session: {}",
                        failure.user_message()
                    ))));
                    KioskState::EventSelection {
                        operator,
                        events,
                        chosen: None,
                    }
                }
                (Ok(_), None) => KioskState::EventSelection {
                    operator,
                    events,
                    chosen: None,
                },
            },
            (KioskState::EventSelection { .. }, Event::Logout) => KioskState::AdminLogin,

            (KioskState::Active(shift), event) => self.apply_active(shift, event, fx),

            (KioskState::SessionEnded { operator, .. }, Event::SelectAnotherEvent) => {
                KioskState::EventSelection {
                    operator,
                    events: Vec::new(),
                    chosen: None,
                }
            }
            (KioskState::SessionEnded { .. }, Event::Logout) => KioskState::AdminLogin,

            (state, event) => {
                debug!(screen = %state.screen(), event = event.name(), "Event ignored");
                state
            }
        }
    }

    fn apply_active(
        &mut self,
        mut shift: Box<ActiveShift>,
        event: Event,
        fx: &mut Vec<Effect>,
    ) -> KioskState {
        let now = self.clock.now();
        let token = self.generation;
        let step = std::mem::replace(&mut shift.step, Step::StaffCheckIn);

        match (step, event) {
            // Idle check-in screen.
            (Step::StaffCheckIn, Event::PinSubmitted { pin }) => {
                let pin = pin.trim().to_string();
                if pin.is_empty() {
                    fx.push(Effect::Notify(Notice::error(ValidationError::EmptyPin.to_string())));
                } else {
                    self.in_flight = true;
                    fx.push(Effect::LookupStaff {
                        token,
                        pin,
                        event_id: shift.event.id.clone(),
                    });
                }
                shift.step = Step::StaffCheckIn;
            }
            (Step::StaffCheckIn, Event::StaffLookedUp { result, .. }) => {
                shift.step = match result {
                    Err(failure) => {
                        fx.push(Effect::Notify(Notice::error(failure.user_message())));
                        Step::StaffCheckIn
                    }
                    Ok(lookup) => match verification::assess_lookup(
                        &lookup,
                        &shift.event,
                        now,
                        self.policy.verification,
                    ) {
                        Err(invalid) => {
                            fx.push(Effect::Notify(Notice::error(invalid.to_string())));
                            Step::StaffCheckIn
                        }
                        Ok(LookupDecision::AlreadyCheckedIn {
                            name,
                            checked_in_at,
                        }) => Step::AlreadyCheckedIn {
                            name,
                            checked_in_at,
                        },
                        Ok(LookupDecision::Late {
                            candidate,
                            minutes_late,
                        }) => {
                            info!(staff_id = %candidate.staff_id, minutes_late, "Late arrival");
                            Step::LateArrival {
                                candidate,
                                minutes_late,
                            }
                        }
                        Ok(LookupDecision::OnTime { candidate }) => {
                            Step::PhotoConfirmation { candidate }
                        }
                    },
                };
            }
            (Step::StaffCheckIn, Event::ForgotPin) => shift.step = Step::ForgotPin,
            (Step::StaffCheckIn, Event::EndSession) => {
                return self.close_check_in(shift, false, fx);
            }
            (Step::StaffCheckIn, Event::AutoCloseDue { session_id })
                if session_id == shift.check_in.id =>
            {
                return self.close_check_in(shift, true, fx);
            }
            (Step::StaffCheckIn | Step::StaffCheckOut, Event::GetHelp) => {
                shift.step = Step::AdminHelp {
                    reason: EscalationReason::OperatorRequested,
                };
            }

            // Credential recovery side path.
            (Step::ForgotPin, Event::PinResetRequested { identifier }) => {
                let identifier = identifier.trim().to_string();
                if identifier.is_empty() {
                    fx.push(Effect::Notify(Notice::error("Enter your email or phone number")));
                } else {
                    self.in_flight = true;
                    fx.push(Effect::RequestPinReset { token, identifier });
                }
                shift.step = Step::ForgotPin;
            }
            (Step::ForgotPin, Event::PinResetCompleted { result, .. }) => {
                let notice = match result {
                    Ok(()) => Notice::success("PIN reset requested. An administrator will follow up."),
                    Err(failure) => {
                        Notice::error(format!("PIN reset failed: {}", failure.user_message()))
                    }
                };
                fx.push(Effect::Notify(notice));
                return self.return_to_idle(shift, fx);
            }
            (Step::ForgotPin, Event::Cancel) => return self.return_to_idle(shift, fx),

            // Verification cycle.
            (Step::LateArrival { candidate, .. }, Event::Acknowledge) => {
                shift.step = Step::PhotoConfirmation { candidate };
            }
            (Step::PhotoConfirmation { candidate }, Event::ConfirmPhoto) => {
                self.in_flight = true;
                fx.push(Effect::InitiateCheckIn {
                    token,
                    staff_id: candidate.staff_id.clone(),
                    event_id: shift.event.id.clone(),
                    assignment_id: candidate.assignment_id.clone(),
                });
                shift.step = Step::PhotoConfirmation { candidate };
            }
            (Step::PhotoConfirmation { candidate }, Event::CheckInInitiated { result, .. }) => {
                shift.step = match result {
                    Ok(clock_entry_id) => {
                        debug!(staff_id = %candidate.staff_id, clock_entry_id = %clock_entry_id, "Check-in initiated");
                        Step::Camera {
                            candidate,
                            clock_entry_id,
                        }
                    }
                    Err(failure) => {
                        fx.push(Effect::Notify(Notice::error(format!(
                            "Could not start check-in: {}",
                            failure.user_message()
                        ))));
                        Step::PhotoConfirmation { candidate }
                    }
                };
            }
            (Step::PhotoConfirmation { .. }, Event::RejectPhoto) => {
                return self.return_to_idle(shift, fx);
            }
            (
                Step::Camera {
                    candidate,
                    clock_entry_id,
                },
                Event::PhotoCaptured { image },
            ) => {
                shift.step = Step::FaceVerification {
                    candidate,
                    clock_entry_id,
                    capture: image,
                };
            }
            (Step::Camera { .. }, Event::CaptureFailed { message }) => {
                warn!(error = %message, "Camera failure, escalating");
                fx.push(Effect::Notify(Notice::error("Camera unavailable. Requesting admin help.")));
                shift.step = Step::AdminHelp {
                    reason: EscalationReason::CameraFailure(message),
                };
            }
            (
                Step::FaceVerification {
                    mut candidate,
                    clock_entry_id,
                    ..
                },
                Event::FaceVerified { result, .. },
            ) => {
                shift.step = match verification::classify_face_result(
                    result,
                    &mut candidate,
                    self.policy.verification,
                ) {
                    FaceOutcome::Verified => {
                        let total = shift.check_in.record_check_in();
                        info!(staff_id = %candidate.staff_id, total_checked_in = total, "Check-in verified");
                        Step::CheckInSuccess {
                            name: candidate.name,
                            entry: ClockEntry {
                                id: clock_entry_id,
                                staff_id: candidate.staff_id,
                                event_id: shift.event.id.clone(),
                                checked_in_at: now,
                            },
                        }
                    }
                    FaceOutcome::Rejected(error) => {
                        warn!(staff_id = %candidate.staff_id, kind = %error.kind, "Check-in rejected");
                        Step::CheckInError {
                            error,
                            retry: Some(RetryContext {
                                candidate,
                                clock_entry_id,
                            }),
                        }
                    }
                    FaceOutcome::Denied(error) => {
                        warn!(staff_id = %candidate.staff_id, attempts = candidate.face_attempts, "Verification denied");
                        Step::VerificationDenied {
                            name: candidate.name,
                            error,
                        }
                    }
                };
            }

            // Outcome screens.
            (Step::CheckInSuccess { .. } | Step::CheckOutSuccess { .. }, Event::Acknowledge) => {
                return self.return_to_idle(shift, fx);
            }
            (Step::CheckInError { .. }, Event::TryAgain) => return self.return_to_idle(shift, fx),
            (
                Step::CheckInError {
                    retry: Some(retry), ..
                },
                Event::RetakePhoto,
            ) => {
                shift.step = Step::Camera {
                    candidate: retry.candidate,
                    clock_entry_id: retry.clock_entry_id,
                };
            }
            (Step::CheckInError { error, .. }, Event::GetHelp) => {
                shift.step = Step::AdminHelp {
                    reason: EscalationReason::from_error(&error),
                };
            }
            (Step::AlreadyCheckedIn { .. }, Event::TryAgain | Event::Acknowledge) => {
                return self.return_to_idle(shift, fx);
            }
            (Step::VerificationDenied { .. }, Event::GetHelp) => {
                shift.step = Step::AdminHelp {
                    reason: EscalationReason::RepeatedDenial,
                };
            }
            (Step::VerificationDenied { .. }, Event::TryAgain | Event::Acknowledge) => {
                return self.return_to_idle(shift, fx);
            }
            (Step::AdminHelp { .. }, Event::Acknowledge) => return self.return_to_idle(shift, fx),

            // Any in-progress screen can be abandoned. Idle screens ignore it.
            (
                Step::LateArrival { .. }
                | Step::PhotoConfirmation { .. }
                | Step::Camera { .. }
                | Step::FaceVerification { .. }
                | Step::CheckInSuccess { .. }
                | Step::CheckInError { .. }
                | Step::AlreadyCheckedIn { .. }
                | Step::AdminHelp { .. }
                | Step::VerificationDenied { .. }
                | Step::CheckOutSuccess { .. },
                Event::Cancel,
            ) => {
                debug!("Cycle canceled");
                return self.return_to_idle(shift, fx);
            }

            // Check-in summary and check-out.
            (Step::CheckInComplete { summary }, Event::BeginCheckOut) => {
                self.in_flight = true;
                fx.push(Effect::StartCheckOutSession {
                    token,
                    event_id: shift.event.id.clone(),
                    operator_id: shift.operator.id.clone(),
                });
                shift.step = Step::CheckInComplete { summary };
            }
            (Step::CheckInComplete { summary }, Event::CheckOutSessionStarted { result, .. }) => {
                let opened = result
                    .map_err(|failure| failure.user_message())
                    .and_then(|info| {
                        CheckOutSession::open(info, &shift.event, &shift.operator, &shift.check_in)
                            .map_err(|invalid| invalid.to_string())
                    });
                shift.step = match opened {
                    Ok(session) => {
                        info!(session_id = %session.id, event_id = %session.event_id, "Check-out session opened");
                        fx.push(Effect::Notify(Notice::success("Check-out started")));
                        shift.check_out = Some(session);
                        Step::StaffCheckOut
                    }
                    Err(message) => {
                        warn!(error = %message, "Check-out session start failed");
                        fx.push(Effect::Notify(Notice::error(format!(
                            "Failed to start check-out session: {message}"
                        ))));
                        Step::CheckInComplete { summary }
                    }
                };
            }
            (Step::CheckInComplete { summary }, Event::FinishShift) => {
                info!(total_checked_in = summary.total_checked_in, "Shift finished");
                return KioskState::SessionEnded {
                    operator: shift.operator,
                    summary,
                };
            }
            (Step::StaffCheckOut, Event::PinSubmitted { pin }) => {
                let pin = pin.trim().to_string();
                match &shift.check_out {
                    Some(session) if !pin.is_empty() => {
                        self.in_flight = true;
                        fx.push(Effect::CheckOut {
                            token,
                            pin,
                            event_id: shift.event.id.clone(),
                            session_id: session.id.clone(),
                        });
                    }
                    _ => fx.push(Effect::Notify(Notice::error(ValidationError::EmptyPin.to_string()))),
                }
                shift.step = Step::StaffCheckOut;
            }
            (Step::StaffCheckOut, Event::CheckedOut { result, .. }) => {
                shift.step = match (result, shift.check_out.as_mut()) {
                    (Ok(receipt), Some(session)) => {
                        let total = session.record_check_out();
                        info!(clock_entry_id = %receipt.clock_entry_id, total_checked_out = total, "Check-out recorded");
                        Step::CheckOutSuccess { receipt }
                    }
                    (Err(failure), _) => {
                        fx.push(Effect::Notify(Notice::error(format!(
                            "Check-out failed: {}",
                            failure.user_message()
                        ))));
                        Step::StaffCheckOut
                    }
                    (Ok(_), None) => Step::StaffCheckOut,
                };
            }
            (Step::StaffCheckOut, Event::EndSession) => return self.end_check_out(shift, fx),

            (step, event) => {
                debug!(screen = %step.screen(), event = event.name(), "Event ignored");
                shift.step = step;
            }
        }
        KioskState::Active(shift)
    }

    /// Drops the in-progress cycle. In check-in mode an expired session closes
    /// here instead.
    fn return_to_idle(&mut self, mut shift: Box<ActiveShift>, fx: &mut Vec<Effect>) -> KioskState {
        if shift.mode() == Mode::CheckIn && shift.check_in.is_due_for_auto_close(self.clock.now()) {
            return self.close_check_in(shift, true, fx);
        }
        shift.step = shift.idle_step();
        KioskState::Active(shift)
    }

    fn close_check_in(
        &mut self,
        mut shift: Box<ActiveShift>,
        automatic: bool,
        fx: &mut Vec<Effect>,
    ) -> KioskState {
        let now = self.clock.now();
        shift.check_in.close(now);
        info!(
            session_id = %shift.check_in.id,
            total_checked_in = shift.check_in.total_checked_in,
            automatic,
            "Check-in session closed"
        );
        fx.push(Effect::CancelAutoClose);
        fx.push(Effect::EndCheckInSession {
            session_id: shift.check_in.id.clone(),
        });
        if automatic {
            fx.push(Effect::Notify(Notice::info("Check-in session closed automatically")));
        }
        let summary = SessionSummary::build(&shift.event, &shift.check_in, None, now);
        shift.step = Step::CheckInComplete { summary };
        KioskState::Active(shift)
    }

    fn end_check_out(&mut self, shift: Box<ActiveShift>, fx: &mut Vec<Effect>) -> KioskState {
        let now = self.clock.now();
        let ActiveShift {
            operator,
            event,
            check_in,
            mut check_out,
            ..
        } = *shift;
        if let Some(session) = check_out.as_mut() {
            session.close(now);
            fx.push(Effect::EndCheckOutSession {
                session_id: session.id.clone(),
            });
        }
        let summary = SessionSummary::build(&event, &check_in, check_out.as_ref(), now);
        info!(
            total_checked_in = summary.total_checked_in,
            total_checked_out = ?summary.total_checked_out,
            "Check-out session closed"
        );
        KioskState::SessionEnded { operator, summary }
    }
}
