//! Concrete [`Provider`] backed by the `anthropic` crate, adapted from
//! the teacher's `llm/anthropic.rs`: same client construction and
//! content-block collection, generalized to take an explicit API key per
//! call (the gateway owns key rotation, this module just makes the
//! request) and to classify failures instead of retrying them itself.

use super::provider::{classify_message, FailureKind, Provider, ProviderCallError, ProviderResponse};
use super::GenerationConfig;
use anthropic::client::Client as AnthropicClient;
use anthropic::config::AnthropicConfig;
use anthropic::types::{ContentBlock, Message as AnthropicMessage, MessagesRequestBuilder, Role};
use async_trait::async_trait;

pub struct AnthropicProvider;

impl AnthropicProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnthropicProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn complete(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<ProviderResponse, ProviderCallError> {
        let cfg = AnthropicConfig::new()
            .with_api_key(api_key.to_string())
            .map_err(|e| ProviderCallError {
                kind: FailureKind::Other,
                message: format!("failed to build anthropic config: {e}"),
            })?;
        let client = AnthropicClient::try_from(cfg).map_err(|e| ProviderCallError {
            kind: FailureKind::Other,
            message: format!("failed to build anthropic client: {e}"),
        })?;

        let request = MessagesRequestBuilder::default()
            .messages(vec![AnthropicMessage {
                role: Role::User,
                content: vec![ContentBlock::Text {
                    text: prompt.to_string(),
                }],
            }])
            .model(model)
            .max_tokens(config.max_tokens as usize)
            .temperature(config.temperature as f64)
            .top_p(config.top_p as f64)
            .build()
            .map_err(|e| ProviderCallError {
                kind: FailureKind::Other,
                message: format!("failed to build request: {e}"),
            })?;

        let response = client.messages(request).await.map_err(|e| {
            let message = e.to_string();
            ProviderCallError {
                kind: classify_message(&message),
                message,
            }
        })?;

        let text = response
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.clone()),
                _ => None,
            })
            .collect::<String>();

        Ok(ProviderResponse {
            text,
            prompt_tokens: response.usage.input_tokens as u32,
            completion_tokens: response.usage.output_tokens as u32,
        })
    }
}