use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::ApiError;
use super::types::{
    CheckOutRequest, ErrorBody, InitiateCheckInRequest, InitiateCheckInResponse, LoginRequest,
    LoginResponse, LookupStaffRequest, PinResetRequest, StartSessionRequest, VerifyFaceResponse,
};
use super::AttendanceService;
use crate::state_machine::{CheckOutReceipt, EventContext, Operator, SessionInfo, StaffLookup};

const DEFAULT_RETRY_AFTER_MS: u64 = 1000;

/// HTTP client for the attendance backend.
pub struct KioskApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl KioskApiClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(ApiError::from_transport)?;
        let status = response.status();
        debug!(path, status = status.as_u16(), "Attendance API response");

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000))
                .unwrap_or(DEFAULT_RETRY_AFTER_MS);
            warn!(path, retry_after_ms = retry_after, "Attendance API rate limited");
            return Err(ApiError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.message)
                .ok()
                .filter(|m| !m.trim().is_empty())
                .or_else(|| Some(text.trim().to_string()).filter(|t| !t.is_empty()))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            warn!(path, status = status.as_u16(), error = %message, "Attendance API error");
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path), path).await?;
        response.json::<T>().await.map_err(ApiError::from_transport)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .send(self.request(Method::POST, path).json(body), path)
            .await?;
        response.json::<T>().await.map_err(ApiError::from_transport)
    }

    /// POST whose response body is ignored.
    async fn post_unit<B: Serialize>(&self, path: &str, body: Option<&B>) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, path);
        let builder = match body {
            Some(body) => builder.json(body),
            None => builder,
        };
        self.send(builder, path).await?;
        Ok(())
    }
}

impl AttendanceService for KioskApiClient {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Operator, ApiError> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: LoginResponse = self.post_json("/auth/login", &req).await?;
        Ok(resp.operator)
    }

    async fn list_events(&self) -> Result<Vec<EventContext>, ApiError> {
        self.get_json("/events").await
    }

    async fn start_check_in_session(
        &self,
        event_id: &str,
        operator_id: &str,
    ) -> Result<SessionInfo, ApiError> {
        let req = StartSessionRequest {
            event_id: event_id.to_string(),
            operator_id: operator_id.to_string(),
        };
        self.post_json("/attendance/sessions/check-in", &req).await
    }

    async fn end_check_in_session(&self, session_id: &str) -> Result<(), ApiError> {
        let path = format!("/attendance/sessions/check-in/{session_id}/end");
        self.post_unit::<()>(&path, None).await
    }

    async fn lookup_staff(&self, pin: &str, event_id: &str) -> Result<StaffLookup, ApiError> {
        let req = LookupStaffRequest {
            pin: pin.to_string(),
            event_id: event_id.to_string(),
        };
        self.post_json("/staff/lookup", &req).await
    }

    async fn initiate_check_in(
        &self,
        staff_id: &str,
        event_id: &str,
        assignment_id: &str,
    ) -> Result<InitiateCheckInResponse, ApiError> {
        let req = InitiateCheckInRequest {
            staff_id: staff_id.to_string(),
            event_id: event_id.to_string(),
            assignment_id: assignment_id.to_string(),
        };
        self.post_json("/attendance/check-in", &req).await
    }

    async fn verify_face_photo(
        &self,
        clock_entry_id: &str,
        image: &[u8],
    ) -> Result<VerifyFaceResponse, ApiError> {
        let path = format!("/attendance/clock-entries/{clock_entry_id}/verify-face");
        let builder = self
            .request(Method::POST, &path)
            .header("content-type", "image/jpeg")
            .body(image.to_vec());
        let response = self.send(builder, &path).await?;
        response
            .json::<VerifyFaceResponse>()
            .await
            .map_err(ApiError::from_transport)
    }

    async fn request_pin_reset(&self, identifier: &str) -> Result<(), ApiError> {
        let req = PinResetRequest {
            identifier: identifier.to_string(),
        };
        self.post_unit("/staff/pin-reset", Some(&req)).await
    }

    async fn start_check_out_session(
        &self,
        event_id: &str,
        operator_id: &str,
    ) -> Result<SessionInfo, ApiError> {
        let req = StartSessionRequest {
            event_id: event_id.to_string(),
            operator_id: operator_id.to_string(),
        };
        self.post_json("/attendance/sessions/check-out", &req).await
    }

    async fn check_out(
        &self,
        pin: &str,
        event_id: &str,
        session_id: &str,
    ) -> Result<CheckOutReceipt, ApiError> {
        let req = CheckOutRequest {
            pin: pin.to_string(),
            event_id: event_id.to_string(),
            session_id: session_id.to_string(),
        };
        self.post_json("/attendance/check-out", &req).await
    }

    async fn end_check_out_session(&self, session_id: &str) -> Result<(), ApiError> {
        let path = format!("/attendance/sessions/check-out/{session_id}/end");
        self.post_unit::<()>(&path, None).await
    }

    async fn ping(&self) -> Result<(), ApiError> {
        self.send(self.request(Method::GET, "/health"), "/health")
            .await?;
        Ok(())
    }
}
