//! Configuração do quiosque carregada a partir de `kiosk.toml`.
//!
//! A struct [`KioskConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `KIOSK_API_URL` e `KIOSK_API_TOKEN` têm
//! precedência sobre o arquivo.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::KioskError;
use crate::escalation::EscalationPolicy;
use crate::state_machine::{KioskPolicy, LifecyclePolicy, MAX_AUTO_CLOSE_MINUTES};
use crate::verification::VerificationPolicy;

/// Nome padrão do arquivo de configuração.
pub const DEFAULT_CONFIG_FILE: &str = "kiosk.toml";

/// Configuração de nível superior carregada de `kiosk.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// URL base do serviço de presença.
    pub api_url: String,

    /// Token Bearer do quiosque. Nunca é impresso.
    #[serde(serialize_with = "redact")]
    pub api_token: Option<String>,

    /// Tempo limite de cada requisição HTTP, em segundos.
    pub request_timeout_secs: u64,

    /// Intervalo entre sondagens de conectividade, em segundos.
    pub probe_interval_secs: u64,

    /// Minutos após o início do evento a partir dos quais a chegada é atrasada.
    pub late_threshold_minutes: i64,

    /// Minutos até o fechamento automático da sessão de check-in.
    pub auto_close_minutes: i64,

    pub admin_help_timeout_secs: u32,
    pub error_timeout_secs: u32,
    pub success_timeout_secs: u32,
    pub already_checked_in_timeout_secs: u32,

    /// Falhas faciais seguidas antes de negar a verificação.
    pub max_face_attempts: u32,
}

impl Default for KioskConfig {
    fn default() -> Self {
        let verification = VerificationPolicy::default();
        let escalation = EscalationPolicy::default();
        Self {
            api_url: "http://localhost:8080/api".to_string(),
            api_token: None,
            request_timeout_secs: 15,
            probe_interval_secs: 30,
            late_threshold_minutes: verification.late_threshold_minutes,
            auto_close_minutes: LifecyclePolicy::default().auto_close_minutes,
            admin_help_timeout_secs: escalation.admin_help_secs,
            error_timeout_secs: escalation.error_return_secs,
            success_timeout_secs: escalation.success_advance_secs,
            already_checked_in_timeout_secs: escalation.already_checked_in_secs,
            max_face_attempts: verification.max_face_attempts,
        }
    }
}

// Substitui o token por um marcador na serialização.
fn redact<S: Serializer>(token: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match token {
        Some(_) => serializer.serialize_some("<redacted>"),
        None => serializer.serialize_none(),
    }
}

impl KioskConfig {
    /// Carrega a configuração do caminho indicado ou de `kiosk.toml` no
    /// diretório atual. Usa valores padrão se o arquivo não existir.
    pub fn load(path: Option<&Path>) -> Result<Self, KioskError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<KioskConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variáveis de ambiente têm precedência sobre o arquivo.
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Aplica `KIOSK_API_URL` e `KIOSK_API_TOKEN`, ignorando valores vazios.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("KIOSK_API_URL")
            && !url.is_empty()
        {
            self.api_url = url;
        }
        if let Some(token) = lookup("KIOSK_API_TOKEN")
            && !token.is_empty()
        {
            self.api_token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<(), KioskError> {
        let problem = if self.api_url.trim().is_empty() {
            "api_url must not be empty"
        } else if self.max_face_attempts == 0 {
            "max_face_attempts must be at least 1"
        } else if self.late_threshold_minutes < 0 {
            "late_threshold_minutes must not be negative"
        } else if !(1..=MAX_AUTO_CLOSE_MINUTES).contains(&self.auto_close_minutes) {
            "auto_close_minutes must be between 1 and 1440"
        } else {
            return Ok(());
        };
        Err(KioskError::Config(problem.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }

    /// Converte a configuração nas políticas do controlador.
    pub fn policy(&self) -> KioskPolicy {
        KioskPolicy {
            verification: VerificationPolicy {
                late_threshold_minutes: self.late_threshold_minutes,
                max_face_attempts: self.max_face_attempts,
            },
            escalation: EscalationPolicy {
                admin_help_secs: self.admin_help_timeout_secs,
                error_return_secs: self.error_timeout_secs,
                success_advance_secs: self.success_timeout_secs,
                already_checked_in_secs: self.already_checked_in_timeout_secs,
            },
            lifecycle: LifecyclePolicy {
                auto_close_minutes: self.auto_close_minutes,
            },
        }
    }
}
