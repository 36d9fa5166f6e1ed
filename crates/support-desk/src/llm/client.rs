//! OpenAI-compatible `/chat/completions` client.
//!
//! Gemini, llama-server and most hosted providers expose this shape, so the endpoint and
//! model are configuration rather than code.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{LanguageModel, ModelTurn, TurnRole};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct ChatCompletionsClient {
    base_url: String,
    model: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build LLM HTTP client: {}", e))?;

        info!("LLM client initialized: model {} at {}", model, base_url);
        Ok(Self {
            base_url,
            model,
            api_key: api_key.into(),
            http_client,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn to_chat_messages<'a>(system_instruction: &'a str, turns: &'a [ModelTurn]) -> Vec<ChatMessage<'a>> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        if !system_instruction.is_empty() {
            messages.push(ChatMessage { role: "system", content: system_instruction });
        }
        messages.extend(turns.iter().map(|turn| ChatMessage {
            role: match turn.role {
                TurnRole::User => "user",
                TurnRole::Model => "assistant",
            },
            content: &turn.text,
        }));
        messages
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionsClient {
    async fn generate(
        &self,
        system_instruction: &str,
        turns: &[ModelTurn],
        temperature: f32,
    ) -> anyhow::Result<String> {
        debug!("Requesting completion over {} turn(s)", turns.len());
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: Self::to_chat_messages(system_instruction, turns),
            temperature,
            stream: false,
        };

        let response = self.http_client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("LLM backend request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("LLM backend returned {}: {}", status, body));
        }

        let completion: ChatCompletionResponse = response.json().await
            .map_err(|e| anyhow::anyhow!("Failed to parse LLM response: {}", e))?;

        completion.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| anyhow::anyhow!("LLM response contained no message content"))
    }
}
