//! Language-model access: the provider seam, the HTTP client behind it, and the
//! fixed-instruction agents the chat flow talks to.

pub mod agents;
pub mod client;

pub use agents::{Agents, ModelAgent};
pub use client::ChatCompletionsClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Who authored a turn, from the model's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ModelTurn {
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self { role, text: text.into() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Model, text)
    }
}

/// A hosted language model. Implementations return the raw generated text or an error;
/// callers decide how failures degrade.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(
        &self,
        system_instruction: &str,
        turns: &[ModelTurn],
        temperature: f32,
    ) -> anyhow::Result<String>;
}
