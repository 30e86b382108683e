use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Process-wide configuration, assembled from environment variables the
/// way the teacher's `Config::from_env` does it — small closures over
/// `std::env::var`, never a config-file parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ordered credential pool: primary key first, then backups, in the
    /// preference order spec §6 enumerates them in.
    pub provider_keys: Vec<String>,
    pub app_url: Option<String>,

    /// Model name bound to each `ModelRole` (spec §4.1).
    pub model_pro: String,
    pub model_flash: String,
    pub model_flash_light: String,

    /// Default generation parameters per role.
    pub temperature_pro: f32,
    pub temperature_flash: f32,
    pub top_p: f32,
    pub max_tokens_pro: u32,
    pub max_tokens_flash: u32,

    /// Per-call safety timeout; the host runtime kills around 300s so
    /// this must stay comfortably below it (spec §4.1).
    pub safety_timeout: Duration,
    /// Backoff applied after a full key-cycle before the second cycle.
    pub cycle_delay: Duration,
    /// At most this many full key-cycles per call (spec §4.1: "at most two").
    pub max_key_cycles: u32,

    /// Beat retry budget (spec §4.6: "up to 3 attempts").
    pub max_beat_attempts: u32,

    /// Illustration service base URL and per-call timeout (spec §6).
    pub illustration_base_url: String,
    pub illustration_timeout: Duration,
    pub max_illustration_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let get_env_or_default = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let parse_u64_env_or_default = |key: &str, default: u64| -> u64 {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };

        let parse_f32_env_or_default = |key: &str, default: f32| -> f32 {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };

        let primary = std::env::var("GENERATION_PROVIDER_KEY")
            .map_err(|_| EngineError::MissingEnvVar("GENERATION_PROVIDER_KEY".to_string()))?;

        let mut provider_keys = vec![primary];
        for n in 1..=3 {
            if let Ok(backup) = std::env::var(format!("GENERATION_PROVIDER_KEY_BACKUP_{n}")) {
                if !backup.is_empty() {
                    provider_keys.push(backup);
                }
            }
        }

        Ok(Self {
            provider_keys,
            app_url: std::env::var("APP_URL").ok(),
            model_pro: get_env_or_default("MODEL_PRO", "claude-opus-4-1-20250805"),
            model_flash: get_env_or_default("MODEL_FLASH", "claude-3-5-haiku-20241022"),
            model_flash_light: get_env_or_default("MODEL_FLASH_LIGHT", "claude-3-5-haiku-20241022"),
            temperature_pro: parse_f32_env_or_default("TEMPERATURE_PRO", 0.9),
            temperature_flash: parse_f32_env_or_default("TEMPERATURE_FLASH", 0.2),
            top_p: parse_f32_env_or_default("TOP_P", 0.95),
            max_tokens_pro: parse_u64_env_or_default("MAX_TOKENS_PRO", 8192) as u32,
            max_tokens_flash: parse_u64_env_or_default("MAX_TOKENS_FLASH", 4096) as u32,
            safety_timeout: Duration::from_secs(parse_u64_env_or_default("SAFETY_TIMEOUT_SECS", 240)),
            cycle_delay: Duration::from_millis(parse_u64_env_or_default("CYCLE_DELAY_MS", 1500)),
            max_key_cycles: parse_u64_env_or_default("MAX_KEY_CYCLES", 2) as u32,
            max_beat_attempts: parse_u64_env_or_default("MAX_BEAT_ATTEMPTS", 3) as u32,
            illustration_base_url: get_env_or_default(
                "ILLUSTRATION_BASE_URL",
                "http://localhost:8080",
            ),
            illustration_timeout: Duration::from_secs(parse_u64_env_or_default(
                "ILLUSTRATION_TIMEOUT_SECS",
                30,
            )),
            max_illustration_attempts: parse_u64_env_or_default("MAX_ILLUSTRATION_ATTEMPTS", 3) as u32,
        })
    }

    /// Model bound to a given role (spec §4.1).
    pub fn model_for_role(&self, role: crate::llm::ModelRole) -> &str {
        use crate::llm::ModelRole::*;
        match role {
            Pro => &self.model_pro,
            Flash => &self.model_flash,
            FlashLight => &self.model_flash_light,
            Image => &self.model_flash_light,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider_keys: vec!["test-key".to_string()],
            app_url: None,
            model_pro: "claude-opus-4-1-20250805".to_string(),
            model_flash: "claude-3-5-haiku-20241022".to_string(),
            model_flash_light: "claude-3-5-haiku-20241022".to_string(),
            temperature_pro: 0.9,
            temperature_flash: 0.2,
            top_p: 0.95,
            max_tokens_pro: 8192,
            max_tokens_flash: 4096,
            safety_timeout: Duration::from_secs(240),
            cycle_delay: Duration::from_millis(1500),
            max_key_cycles: 2,
            max_beat_attempts: 3,
            illustration_base_url: "http://localhost:8080".to_string(),
            illustration_timeout: Duration::from_secs(30),
            max_illustration_attempts: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_one_provider_key() {
        let cfg = Config::default();
        assert_eq!(cfg.provider_keys.len(), 1);
    }

    #[test]
    fn model_for_role_resolves_pro_and_flash_distinctly() {
        let cfg = Config::default();
        assert_eq!(cfg.model_for_role(crate::llm::ModelRole::Pro), cfg.model_pro);
        assert_eq!(cfg.model_for_role(crate::llm::ModelRole::Flash), cfg.model_flash);
    }
}
