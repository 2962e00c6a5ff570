//! Corpos de requisição e resposta do serviço de presença.
//!
//! Todos os campos trafegam em camelCase no JSON. As respostas que o
//! controlador consome diretamente (`Operator`, `EventContext`,
//! `SessionInfo`, `StaffLookup`, `CheckOutReceipt`) vivem em
//! `state_machine`; aqui ficam apenas os envelopes do fio.

use serde::{Deserialize, Serialize};

use crate::state_machine::Operator;

/// Corpo de `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Resposta de `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub operator: Operator,
}

/// Corpo usado para abrir sessões de check-in e de check-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub event_id: String,
    pub operator_id: String,
}

/// Corpo de `POST /staff/lookup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupStaffRequest {
    pub pin: String,
    pub event_id: String,
}

/// Corpo de `POST /attendance/check-in`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateCheckInRequest {
    pub staff_id: String,
    pub event_id: String,
    pub assignment_id: String,
}

/// Resposta de `POST /attendance/check-in`: o registro de ponto aberto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateCheckInResponse {
    pub clock_entry_id: String,
}

/// Resposta da verificação facial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyFaceResponse {
    pub verified: bool,
}

/// Corpo de `POST /staff/pin-reset`. O identificador é e-mail ou telefone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinResetRequest {
    pub identifier: String,
}

/// Corpo de `POST /attendance/check-out`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutRequest {
    pub pin: String,
    pub event_id: String,
    pub session_id: String,
}

/// Corpo de erro devolvido pelo serviço. Quando ausente, o texto cru da
/// resposta é usado como mensagem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
