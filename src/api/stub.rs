//! In-memory attendance backend for `kiosk demo` and runtime tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use uuid::Uuid;

use super::error::ApiError;
use super::types::{InitiateCheckInResponse, VerifyFaceResponse};
use super::AttendanceService;
use crate::clock::Clock;
use crate::state_machine::{
    CheckOutReceipt, EventContext, OpenEntry, Operator, SessionInfo, StaffLookup, StaffRecord,
};

struct PendingEntry {
    staff_id: String,
    event_id: String,
}

/// Scripted backend. Face results are consumed from a queue and default to a
/// match once it is empty.
pub struct StubService {
    clock: Box<dyn Clock>,
    operator: Operator,
    password: String,
    events: Vec<EventContext>,
    staff: HashMap<String, StaffRecord>,
    pending: RefCell<HashMap<String, PendingEntry>>,
    open_entries: RefCell<HashMap<(String, String), OpenEntry>>,
    face_results: RefCell<VecDeque<bool>>,
    failures: RefCell<HashMap<&'static str, String>>,
    calls: RefCell<Vec<&'static str>>,
    online: Cell<bool>,
    latency: Cell<Duration>,
}

impl StubService {
    pub fn new(clock: impl Clock + 'static, operator: Operator, password: impl Into<String>) -> Self {
        Self {
            clock: Box::new(clock),
            operator,
            password: password.into(),
            events: Vec::new(),
            staff: HashMap::new(),
            pending: RefCell::new(HashMap::new()),
            open_entries: RefCell::new(HashMap::new()),
            face_results: RefCell::new(VecDeque::new()),
            failures: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
            online: Cell::new(true),
            latency: Cell::new(Duration::ZERO),
        }
    }

    /// One operator, one event starting at the clock's current time and a
    /// small roster. PINs: 1111 Dana Reyes, 2222 Lee Park, 3333 Ari Cohen
    /// (no assignment).
    pub fn demo(clock: impl Clock + 'static) -> Self {
        let now = clock.now();
        let mut stub = Self::new(
            clock,
            Operator {
                id: "op-1".into(),
                name: "Sam Ortiz".into(),
            },
            "demo",
        )
        .with_event(EventContext {
            id: "ev-1".into(),
            name: "Gala Dinner".into(),
            starts_at: now,
            ends_at: now + ChronoDuration::hours(5),
        });
        for (pin, id, name, notes) in [
            ("1111", "st-1", "Dana Reyes", Some("Server. Assignment ID: asg-11")),
            ("2222", "st-2", "Lee Park", Some("Bar. Assignment ID: asg-22")),
            ("3333", "st-3", "Ari Cohen", None),
        ] {
            stub = stub.with_staff(
                pin,
                StaffRecord {
                    id: id.into(),
                    name: name.into(),
                    photo_url: None,
                    notes: notes.map(String::from),
                },
            );
        }
        stub
    }

    pub fn with_event(mut self, event: EventContext) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_staff(mut self, pin: impl Into<String>, record: StaffRecord) -> Self {
        self.staff.insert(pin.into(), record);
        self
    }

    /// Queues the next face-match answers.
    pub fn push_face_results(&self, results: impl IntoIterator<Item = bool>) {
        self.face_results.borrow_mut().extend(results);
    }

    /// Makes the next call to `operation` fail with `message`.
    pub fn fail_next(&self, operation: &'static str, message: impl Into<String>) {
        self.failures.borrow_mut().insert(operation, message.into());
    }

    pub fn set_online(&self, online: bool) {
        self.online.set(online);
    }

    /// Delay applied to every call.
    pub fn set_latency(&self, latency: Duration) {
        self.latency.set(latency);
    }

    /// Operations invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    async fn enter(&self, operation: &'static str) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(operation);
        let latency = self.latency.get();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if !self.online.get() {
            return Err(ApiError::Timeout);
        }
        match self.failures.borrow_mut().remove(operation) {
            Some(message) => Err(ApiError::Api {
                status: 500,
                message,
            }),
            None => Ok(()),
        }
    }

    fn not_found(message: impl Into<String>) -> ApiError {
        ApiError::Api {
            status: 404,
            message: message.into(),
        }
    }

    fn new_session(&self) -> SessionInfo {
        SessionInfo {
            id: Uuid::new_v4().to_string(),
            started_at: self.clock.now(),
        }
    }
}

impl AttendanceService for StubService {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Operator, ApiError> {
        self.enter("authenticate").await?;
        if email.is_empty() || password != self.password {
            return Err(ApiError::Api {
                status: 401,
                message: "Invalid credentials".into(),
            });
        }
        Ok(self.operator.clone())
    }

    async fn list_events(&self) -> Result<Vec<EventContext>, ApiError> {
        self.enter("list_events").await?;
        Ok(self.events.clone())
    }

    async fn start_check_in_session(
        &self,
        event_id: &str,
        _operator_id: &str,
    ) -> Result<SessionInfo, ApiError> {
        self.enter("start_check_in_session").await?;
        if !self.events.iter().any(|e| e.id == event_id) {
            return Err(Self::not_found(format!("Event {event_id} not found")));
        }
        Ok(self.new_session())
    }

    async fn end_check_in_session(&self, _session_id: &str) -> Result<(), ApiError> {
        self.enter("end_check_in_session").await
    }

    async fn lookup_staff(&self, pin: &str, event_id: &str) -> Result<StaffLookup, ApiError> {
        self.enter("lookup_staff").await?;
        let staff = self
            .staff
            .get(pin)
            .cloned()
            .ok_or_else(|| Self::not_found("No staff member matches that PIN"))?;
        let open_entry = self
            .open_entries
            .borrow()
            .get(&(staff.id.clone(), event_id.to_string()))
            .cloned();
        Ok(StaffLookup { staff, open_entry })
    }

    async fn initiate_check_in(
        &self,
        staff_id: &str,
        event_id: &str,
        _assignment_id: &str,
    ) -> Result<InitiateCheckInResponse, ApiError> {
        self.enter("initiate_check_in").await?;
        let clock_entry_id = Uuid::new_v4().to_string();
        self.pending.borrow_mut().insert(
            clock_entry_id.clone(),
            PendingEntry {
                staff_id: staff_id.to_string(),
                event_id: event_id.to_string(),
            },
        );
        Ok(InitiateCheckInResponse { clock_entry_id })
    }

    async fn verify_face_photo(
        &self,
        clock_entry_id: &str,
        _image: &[u8],
    ) -> Result<VerifyFaceResponse, ApiError> {
        self.enter("verify_face_photo").await?;
        let verified = self.face_results.borrow_mut().pop_front().unwrap_or(true);
        if verified {
            let entry = self
                .pending
                .borrow_mut()
                .remove(clock_entry_id)
                .ok_or_else(|| Self::not_found(format!("Clock entry {clock_entry_id} not found")))?;
            self.open_entries.borrow_mut().insert(
                (entry.staff_id, entry.event_id),
                OpenEntry {
                    clock_entry_id: clock_entry_id.to_string(),
                    checked_in_at: self.clock.now(),
                },
            );
        }
        Ok(VerifyFaceResponse { verified })
    }

    async fn request_pin_reset(&self, _identifier: &str) -> Result<(), ApiError> {
        self.enter("request_pin_reset").await
    }

    async fn start_check_out_session(
        &self,
        _event_id: &str,
        _operator_id: &str,
    ) -> Result<SessionInfo, ApiError> {
        self.enter("start_check_out_session").await?;
        Ok(self.new_session())
    }

    async fn check_out(
        &self,
        pin: &str,
        event_id: &str,
        _session_id: &str,
    ) -> Result<CheckOutReceipt, ApiError> {
        self.enter("check_out").await?;
        let staff = self
            .staff
            .get(pin)
            .ok_or_else(|| Self::not_found("No staff member matches that PIN"))?;
        let entry = self
            .open_entries
            .borrow_mut()
            .remove(&(staff.id.clone(), event_id.to_string()))
            .ok_or_else(|| Self::not_found(format!("{} is not checked in", staff.name)))?;
        Ok(CheckOutReceipt {
            clock_entry_id: entry.clock_entry_id,
            staff_name: staff.name.clone(),
            checked_out_at: self.clock.now(),
        })
    }

    async fn end_check_out_session(&self, _session_id: &str) -> Result<(), ApiError> {
        self.enter("end_check_out_session").await
    }

    async fn ping(&self) -> Result<(), ApiError> {
        if self.online.get() {
            Ok(())
        } else {
            Err(ApiError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn stub() -> StubService {
        StubService::demo(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn verified_check_in_opens_entry_until_check_out() {
        let stub = stub();
        let ce = stub.initiate_check_in("st-1", "ev-1", "asg-11").await.unwrap();
        assert!(stub.verify_face_photo(&ce.clock_entry_id, &[1]).await.unwrap().verified);

        let lookup = stub.lookup_staff("1111", "ev-1").await.unwrap();
        assert_eq!(lookup.open_entry.unwrap().clock_entry_id, ce.clock_entry_id);

        let receipt = stub.check_out("1111", "ev-1", "cos-1").await.unwrap();
        assert_eq!(receipt.staff_name, "Dana Reyes");
        assert!(stub.lookup_staff("1111", "ev-1").await.unwrap().open_entry.is_none());
        assert!(stub.check_out("1111", "ev-1", "cos-1").await.is_err());
    }

    #[tokio::test]
    async fn queued_face_results_are_consumed_in_order() {
        let stub = stub();
        stub.push_face_results([false, true]);
        let ce = stub.initiate_check_in("st-2", "ev-1", "asg-22").await.unwrap();
        assert!(!stub.verify_face_photo(&ce.clock_entry_id, &[]).await.unwrap().verified);
        assert!(stub.verify_face_photo(&ce.clock_entry_id, &[]).await.unwrap().verified);
    }

    #[tokio::test]
    async fn scripted_failure_applies_once() {
        let stub = stub();
        stub.fail_next("list_events", "backend down");
        let err = stub.list_events().await.unwrap_err();
        assert_eq!(err.to_string(), "API error (status 500): backend down");
        assert_eq!(stub.list_events().await.unwrap().len(), 1);
        assert_eq!(stub.calls(), vec!["list_events", "list_events"]);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let stub = stub();
        assert!(stub.authenticate("ops@agency.example", "nope").await.is_err());
        assert_eq!(
            stub.authenticate("ops@agency.example", "demo").await.unwrap().name,
            "Sam Ortiz"
        );
    }

    #[tokio::test]
    async fn offline_fails_calls_and_probe() {
        let stub = stub();
        stub.set_online(false);
        assert!(matches!(stub.ping().await, Err(ApiError::Timeout)));
        assert!(stub.lookup_staff("1111", "ev-1").await.is_err());
    }
}
