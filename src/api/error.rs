//! Tipos de erro para o cliente da API de presença.
//!
//! Define [`ApiError`] com variantes para rate limiting, erros HTTP,
//! timeouts e erros de rede. Usa `thiserror` para derivar `Display` e `Error`
//! a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao falar com o serviço de presença.
///
/// - [`RateLimited`](ApiError::RateLimited): o servidor retornou HTTP 429
/// - [`Api`](ApiError::Api): qualquer outro erro HTTP (4xx/5xx)
/// - [`Timeout`](ApiError::Timeout): a requisição excedeu o tempo limite
/// - [`Decode`](ApiError::Decode): resposta 2xx com corpo inválido
/// - [`Network`](ApiError::Network): falha na camada de rede
#[derive(Debug, Error)]
pub enum ApiError {
    /// O servidor retornou HTTP 429.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Erro retornado pela API (ex.: 401 token inválido, 404 PIN desconhecido).
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    /// O corpo de uma resposta de sucesso não corresponde ao esperado.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Falha de rede subjacente (DNS, conexão recusada).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ApiError {
    /// Converte erros do `reqwest`, separando timeouts e corpos inválidos
    /// das demais falhas de rede.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err)
        }
    }
}
