//! LLM Provider Gateway (spec §4.1, C1): one unified `generate` surface
//! over model roles, with key rotation, safety timeout, and safety-block
//! detection. Concrete providers (just `anthropic` today) implement
//! [`provider::Provider`]; [`gateway::Gateway`] is the thing every other
//! component calls.

pub mod anthropic;
pub mod gateway;
pub mod provider;

pub use gateway::{Gateway, TokenTracker};
pub use provider::{FailureKind, Provider, ProviderCallError, ProviderResponse};

use serde::{Deserialize, Serialize};

/// Binds a call to a model tier (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelRole {
    /// Higher temperature, used for prose generation.
    Pro,
    /// Low temperature, used for structured (JSON) tasks.
    Flash,
    /// Cheapest/fastest tier: summaries, state updates.
    FlashLight,
    /// Image output; routed to the illustration service (DESIGN.md §4).
    Image,
}

/// Generation parameters for a single call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl GenerationConfig {
    pub fn for_role(role: ModelRole, config: &crate::config::Config) -> Self {
        match role {
            ModelRole::Pro => Self {
                temperature: config.temperature_pro,
                top_p: config.top_p,
                max_tokens: config.max_tokens_pro,
            },
            ModelRole::Flash | ModelRole::FlashLight => Self {
                temperature: config.temperature_flash,
                top_p: config.top_p,
                max_tokens: config.max_tokens_flash,
            },
            ModelRole::Image => Self {
                temperature: config.temperature_flash,
                top_p: config.top_p,
                max_tokens: config.max_tokens_flash,
            },
        }
    }
}

/// The provider SDK's safety-threshold enumeration (spec §6). Applied at
/// the prompt layer by [`crate::heat`] rather than as a native API field,
/// since the underlying provider has no such parameter (DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyThreshold {
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
    BlockNone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetySettings {
    pub threshold: SafetyThreshold,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            threshold: SafetyThreshold::BlockMediumAndAbove,
        }
    }
}

/// Which key pool (and therefore which credential) a call should use.
/// Review/validation calls use a distinct pool from prose generation so
/// a starved generation key can't also starve the calls that check its
/// own output (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLane {
    Generation,
    Review,
}
