use super::GenerationConfig;
use async_trait::async_trait;

/// A completed call's text and token accounting.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// The failure taxonomy a concrete provider must classify its errors
/// into (spec §4.1), so the gateway knows whether to rotate keys, back
/// off, or give up immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimit,
    Timeout,
    SafetyBlock,
    Other,
}

#[derive(Debug, Clone)]
pub struct ProviderCallError {
    pub kind: FailureKind,
    pub message: String,
}

impl std::fmt::Display for ProviderCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ProviderCallError {}

/// One underlying LLM backend. The gateway owns rotation, timeout, and
/// retry; a `Provider` only has to make the call and classify failures.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<ProviderResponse, ProviderCallError>;
}

/// Classifies a raw error string into the failure taxonomy. Shared by
/// every `Provider` impl so the classification rules live in one place
/// (Design Notes: "keep all heuristic ... lists as immutable data tables").
pub fn classify_message(message: &str) -> FailureKind {
    let lower = message.to_lowercase();
    if lower.contains("429")
        || lower.contains("rate limit")
        || lower.contains("quota")
        || lower.contains("exhausted")
    {
        FailureKind::RateLimit
    } else if lower.contains("timeout") || lower.contains("timed out") || lower.contains("deadline")
    {
        FailureKind::Timeout
    } else if lower.contains("content")
        || lower.contains("prohibited")
        || lower.contains("policy")
        || lower.contains("safety")
        || lower.contains("blocked")
    {
        FailureKind::SafetyBlock
    } else {
        FailureKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rate_limit() {
        assert_eq!(classify_message("429 Too Many Requests"), FailureKind::RateLimit);
        assert_eq!(classify_message("quota exhausted for this key"), FailureKind::RateLimit);
    }

    #[test]
    fn classifies_safety_block() {
        assert_eq!(
            classify_message("response blocked: prohibited_content"),
            FailureKind::SafetyBlock
        );
    }

    #[test]
    fn classifies_timeout() {
        assert_eq!(classify_message("operation timed out"), FailureKind::Timeout);
    }

    #[test]
    fn classifies_other() {
        assert_eq!(classify_message("internal server error"), FailureKind::Other);
    }
}
