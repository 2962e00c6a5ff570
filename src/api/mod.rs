pub mod client;
pub mod error;
pub mod stub;
pub mod types;

pub use client::KioskApiClient;
pub use error::ApiError;
pub use stub::StubService;
pub use types::{InitiateCheckInResponse, VerifyFaceResponse};

use crate::state_machine::{CheckOutReceipt, EventContext, Operator, SessionInfo, StaffLookup};

/// The remote attendance backend, independent of transport.
///
/// The kiosk runtime drives it from a single-threaded executor, so the
/// returned futures need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait AttendanceService {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Operator, ApiError>;

    async fn list_events(&self) -> Result<Vec<EventContext>, ApiError>;

    async fn start_check_in_session(
        &self,
        event_id: &str,
        operator_id: &str,
    ) -> Result<SessionInfo, ApiError>;

    async fn end_check_in_session(&self, session_id: &str) -> Result<(), ApiError>;

    async fn lookup_staff(&self, pin: &str, event_id: &str) -> Result<StaffLookup, ApiError>;

    async fn initiate_check_in(
        &self,
        staff_id: &str,
        event_id: &str,
        assignment_id: &str,
    ) -> Result<InitiateCheckInResponse, ApiError>;

    async fn verify_face_photo(
        &self,
        clock_entry_id: &str,
        image: &[u8],
    ) -> Result<VerifyFaceResponse, ApiError>;

    async fn request_pin_reset(&self, identifier: &str) -> Result<(), ApiError>;

    async fn start_check_out_session(
        &self,
        event_id: &str,
        operator_id: &str,
    ) -> Result<SessionInfo, ApiError>;

    async fn check_out(
        &self,
        pin: &str,
        event_id: &str,
        session_id: &str,
    ) -> Result<CheckOutReceipt, ApiError>;

    async fn end_check_out_session(&self, session_id: &str) -> Result<(), ApiError>;

    /// Cheap reachability probe.
    async fn ping(&self) -> Result<(), ApiError>;
}
