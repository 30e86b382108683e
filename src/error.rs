use thiserror::Error;

/// Crate-wide error taxonomy (spec §7). Most of these are *terminal*
/// failures for the operation that raised them; validation failures and
/// safety blocks are handled locally by callers and never surface past
/// the component that can retry them.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("provider exhausted all keys: {0}")]
    ProviderExhausted(String),

    #[error("content restrictions")]
    SafetyBlocked,

    #[error("response truncated")]
    Truncated,

    #[error("illustration failed: {0}")]
    Illustration(String),

    #[error("state conflict: {0}")]
    StateConflict(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("chain error: {0}")]
    ChainError(#[from] langchain_rust::chain::ChainError),

    #[error("prompt error: {0}")]
    PromptError(#[from] langchain_rust::prompt::PromptError),

    #[error("other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl From<langchain_rust::language_models::LLMError> for EngineError {
    fn from(err: langchain_rust::language_models::LLMError) -> Self {
        EngineError::Generation(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::SerializationError(format!("json error: {err}"))
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::Illustration(err.to_string())
    }
}
