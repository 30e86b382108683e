use super::provider::{FailureKind, Provider, ProviderCallError};
use super::{GenerationConfig, KeyLane, ModelRole, SafetySettings};
use crate::config::Config;
use crate::error::{EngineError, Result};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Process-wide token accounting (teacher's referenced `TokenTracker`,
/// reconstructed per SPEC_FULL.md §B — every provider call records its
/// prompt/completion token counts here for telemetry).
#[derive(Debug, Default)]
pub struct TokenTracker {
    prompt_tokens: AtomicU32,
    completion_tokens: AtomicU32,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, prompt: u32, completion: u32) {
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
    }

    pub fn totals(&self) -> (u32, u32) {
        (
            self.prompt_tokens.load(Ordering::Relaxed),
            self.completion_tokens.load(Ordering::Relaxed),
        )
    }
}

/// Tracks the rotation state for one key lane (spec §4.1: "a current key
/// index and a last-working key index persist across calls").
struct KeyRotor {
    current_index: AtomicUsize,
    last_working_index: AtomicUsize,
}

impl KeyRotor {
    fn new(start: usize) -> Self {
        Self {
            current_index: AtomicUsize::new(start),
            last_working_index: AtomicUsize::new(start),
        }
    }
}

/// The single unified call surface (spec §4.1): `generate(modelRole,
/// prompt, generationConfig, safetySettings) -> String`, backed by
/// key rotation, a per-call safety timeout, and safety-block detection.
pub struct Gateway {
    provider: Arc<dyn Provider>,
    config: Config,
    generation_rotor: KeyRotor,
    review_rotor: KeyRotor,
    pub tokens: Arc<TokenTracker>,
}

impl Gateway {
    pub fn new(provider: Arc<dyn Provider>, config: Config) -> Self {
        let review_start = if config.provider_keys.len() > 1 { 1 } else { 0 };
        Self {
            provider,
            generation_rotor: KeyRotor::new(0),
            review_rotor: KeyRotor::new(review_start),
            config,
            tokens: Arc::new(TokenTracker::new()),
        }
    }

    pub async fn generate(
        &self,
        role: ModelRole,
        prompt: &str,
        gen_config: &GenerationConfig,
        safety: &SafetySettings,
    ) -> Result<String> {
        self.call(role, prompt, gen_config, safety, KeyLane::Generation).await
    }

    /// Review/validation calls (chapter summarization, state updates)
    /// must use a different credential than the chapter's own generation
    /// call, so a starved generation key can't also block its review
    /// (spec §4.1).
    pub async fn generate_review(
        &self,
        role: ModelRole,
        prompt: &str,
        gen_config: &GenerationConfig,
        safety: &SafetySettings,
    ) -> Result<String> {
        self.call(role, prompt, gen_config, safety, KeyLane::Review).await
    }

    async fn call(
        &self,
        role: ModelRole,
        prompt: &str,
        gen_config: &GenerationConfig,
        _safety: &SafetySettings,
        lane: KeyLane,
    ) -> Result<String> {
        let keys = &self.config.provider_keys;
        let n = keys.len();
        if n == 0 {
            return Err(EngineError::ProviderExhausted("no provider keys configured".to_string()));
        }
        let rotor = match lane {
            KeyLane::Generation => &self.generation_rotor,
            KeyLane::Review => &self.review_rotor,
        };
        // Sticky affinity: a new call starts from the last key that worked.
        let sticky_start = rotor.last_working_index.load(Ordering::SeqCst) % n;
        rotor.current_index.store(sticky_start, Ordering::SeqCst);

        let model = self.config.model_for_role(role).to_string();
        let failures: Mutex<Vec<(usize, FailureKind)>> = Mutex::new(Vec::new());
        let mut cycles: u32 = 0;

        loop {
            let idx = rotor.current_index.load(Ordering::SeqCst) % n;
            let key = &keys[idx];

            let outcome = tokio::time::timeout(
                self.config.safety_timeout,
                self.provider.complete(key, &model, prompt, gen_config),
            )
            .await;

            let classified: Result<Result<super::ProviderResponse, ProviderCallError>, ()> = match outcome {
                Ok(inner) => Ok(inner),
                Err(_) => Err(()),
            };

            match classified {
                Ok(Ok(resp)) => {
                    rotor.last_working_index.store(idx, Ordering::SeqCst);
                    self.tokens.record(resp.prompt_tokens, resp.completion_tokens);
                    info!(key_index = idx, role = ?role, "generation succeeded");
                    return Ok(resp.text);
                }
                Ok(Err(e)) if e.kind == FailureKind::SafetyBlock => {
                    warn!(key_index = idx, "safety block on generation");
                    return Err(EngineError::SafetyBlocked);
                }
                Ok(Err(e)) => {
                    failures.lock().unwrap().push((idx, e.kind));
                    warn!(key_index = idx, kind = ?e.kind, message = %e.message, "generation call failed, rotating key");
                }
                Err(()) => {
                    failures.lock().unwrap().push((idx, FailureKind::Timeout));
                    warn!(key_index = idx, "safety timeout elapsed, rotating key");
                }
            }

            let next = (idx + 1) % n;
            rotor.current_index.store(next, Ordering::SeqCst);
            if next == 0 {
                cycles += 1;
                if cycles >= self.config.max_key_cycles {
                    break;
                }
                tokio::time::sleep(self.config.cycle_delay).await;
            }
        }

        let failures = failures.lock().unwrap();
        error!(?failures, "provider exhausted all keys");
        let category = user_facing_category(&failures);
        Err(EngineError::ProviderExhausted(category))
    }
}

fn user_facing_category(failures: &[(usize, FailureKind)]) -> String {
    let last_kind = failures.last().map(|(_, k)| *k);
    match last_kind {
        Some(FailureKind::RateLimit) => "rate limit".to_string(),
        Some(FailureKind::Timeout) => "timed out".to_string(),
        _ => "temporarily unavailable".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testutil::FakeProvider;
    use crate::llm::ProviderResponse;

    fn resp(text: &str) -> Result<ProviderResponse, ProviderCallError> {
        Ok(ProviderResponse {
            text: text.to_string(),
            prompt_tokens: 10,
            completion_tokens: 20,
        })
    }

    fn rate_limited() -> Result<ProviderResponse, ProviderCallError> {
        Err(ProviderCallError {
            kind: FailureKind::RateLimit,
            message: "429".to_string(),
        })
    }

    #[tokio::test]
    async fn rotates_through_keys_on_rate_limit_then_succeeds() {
        let provider = Arc::new(FakeProvider::new(vec![
            rate_limited(),
            rate_limited(),
            rate_limited(),
            resp("hello"),
        ]));
        let mut config = Config::default();
        config.provider_keys = vec!["A".into(), "B".into(), "C".into(), "D".into()];
        let gateway = Gateway::new(provider.clone(), config);

        let gen_config = GenerationConfig {
            temperature: 0.5,
            top_p: 0.9,
            max_tokens: 100,
        };
        let out = gateway
            .generate(ModelRole::Flash, "prompt", &gen_config, &SafetySettings::default())
            .await
            .unwrap();

        assert_eq!(out, "hello");
        assert_eq!(provider.call_count(), 4);
        let keys_seen = provider.keys_seen.lock().unwrap();
        assert_eq!(*keys_seen, vec!["A", "B", "C", "D"]);
    }

    #[tokio::test]
    async fn exhausts_all_keys_and_reports_rate_limit() {
        let provider = Arc::new(FakeProvider::new(vec![
            rate_limited(),
            rate_limited(),
        ]));
        let mut config = Config::default();
        config.provider_keys = vec!["A".into(), "B".into()];
        config.max_key_cycles = 1;
        config.cycle_delay = std::time::Duration::from_millis(1);
        let gateway = Gateway::new(provider, config);

        let gen_config = GenerationConfig {
            temperature: 0.5,
            top_p: 0.9,
            max_tokens: 100,
        };
        let err = gateway
            .generate(ModelRole::Flash, "prompt", &gen_config, &SafetySettings::default())
            .await
            .unwrap_err();

        match err {
            EngineError::ProviderExhausted(msg) => assert_eq!(msg, "rate limit"),
            other => panic!("expected ProviderExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn safety_block_surfaces_immediately_without_rotating() {
        let provider = Arc::new(FakeProvider::new(vec![Err(ProviderCallError {
            kind: FailureKind::SafetyBlock,
            message: "blocked".to_string(),
        })]));
        let mut config = Config::default();
        config.provider_keys = vec!["A".into(), "B".into()];
        let gateway = Gateway::new(provider.clone(), config);

        let gen_config = GenerationConfig {
            temperature: 0.5,
            top_p: 0.9,
            max_tokens: 100,
        };
        let err = gateway
            .generate(ModelRole::Pro, "prompt", &gen_config, &SafetySettings::default())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::SafetyBlocked));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn review_lane_starts_on_a_different_key_than_generation() {
        let provider = Arc::new(FakeProvider::new(vec![resp("review text")]));
        let mut config = Config::default();
        config.provider_keys = vec!["A".into(), "B".into()];
        let gateway = Gateway::new(provider.clone(), config);

        let gen_config = GenerationConfig {
            temperature: 0.5,
            top_p: 0.9,
            max_tokens: 100,
        };
        gateway
            .generate_review(ModelRole::FlashLight, "prompt", &gen_config, &SafetySettings::default())
            .await
            .unwrap();

        let keys_seen = provider.keys_seen.lock().unwrap();
        assert_eq!(keys_seen[0], "B");
    }
}
