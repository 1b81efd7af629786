//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;
use crate::interview::weights::WeightPolicy;
use crate::oracle::GenerationParams;

/// Oracle endpoint configuration.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Base URL of the OpenAI-compatible completion API.
    pub base_url: String,
    /// Bearer token for the API.
    pub api_key: secrecy::SecretString,
    /// Model identifier.
    pub model: String,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Sampling parameters applied to every session created by this process.
    pub params: GenerationParams,
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Port for the WebSocket/REST server.
    pub ws_port: u16,
    /// Path to the local libSQL database file.
    pub db_path: String,
    /// Sessions idle longer than this are closed by the sweep task.
    pub session_idle_timeout: Duration,
    /// Interval of the expiry sweep task.
    pub sweep_interval: Duration,
    /// Category weight policy — an explicit deployment choice.
    pub weight_policy: WeightPolicy,
    /// Oracle endpoint.
    pub oracle: OracleConfig,
}

impl EngineConfig {
    /// Build configuration from environment variables.
    ///
    /// `INTERVIEWER_ORACLE_API_KEY` is the only required variable; everything
    /// else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("INTERVIEWER_ORACLE_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("INTERVIEWER_ORACLE_API_KEY".to_string()))?;

        let base_url = std::env::var("INTERVIEWER_ORACLE_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let model =
            std::env::var("INTERVIEWER_ORACLE_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let ws_port: u16 = std::env::var("INTERVIEWER_WS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let db_path = std::env::var("INTERVIEWER_DB_PATH")
            .unwrap_or_else(|_| "./data/ai-interviewer.db".to_string());

        let idle_secs: u64 = std::env::var("INTERVIEWER_IDLE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1800);

        let weight_policy = match std::env::var("INTERVIEWER_WEIGHT_POLICY")
            .unwrap_or_else(|_| "static".to_string())
            .to_lowercase()
            .as_str()
        {
            "static" => WeightPolicy::Static,
            "dynamic" => WeightPolicy::Dynamic,
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "INTERVIEWER_WEIGHT_POLICY".to_string(),
                    message: format!("expected 'static' or 'dynamic', got '{other}'"),
                });
            }
        };

        let mut params = GenerationParams::default();
        if let Some(t) = std::env::var("INTERVIEWER_ORACLE_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            params.temperature = t;
        }
        if let Some(p) = std::env::var("INTERVIEWER_ORACLE_TOP_P")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            params.top_p = p;
        }
        if let Some(k) = std::env::var("INTERVIEWER_ORACLE_TOP_K")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            params.top_k = Some(k);
        }
        if let Some(m) = std::env::var("INTERVIEWER_ORACLE_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            params.max_tokens = m;
        }

        Ok(Self {
            ws_port,
            db_path,
            session_idle_timeout: Duration::from_secs(idle_secs),
            sweep_interval: Duration::from_secs(60),
            weight_policy,
            oracle: OracleConfig {
                base_url,
                api_key: secrecy::SecretString::from(api_key),
                model,
                request_timeout_secs: 60,
                params,
            },
        })
    }
}
