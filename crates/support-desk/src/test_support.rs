//! Deterministic stand-ins for the external services, used by unit tests across the crate.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::knowledge::{Embedder, KnowledgeSearch};
use crate::llm::{LanguageModel, ModelTurn};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system_instruction: String,
    pub turns: Vec<ModelTurn>,
    pub temperature: f32,
}

/// Replays a fixed script of replies; `Err` entries simulate upstream failures.
/// Once the script runs out, every call repeats the fallback (or fails if there is none).
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<String, String>>>,
    fallback: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replies(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Replays `script`, then answers `fallback` forever.
    pub fn then_always(script: Vec<Result<String, String>>, fallback: &str) -> Self {
        Self {
            fallback: Some(fallback.to_string()),
            ..Self::new(script)
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(
        &self,
        system_instruction: &str,
        turns: &[ModelTurn],
        temperature: f32,
    ) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            system_instruction: system_instruction.to_string(),
            turns: turns.to_vec(),
            temperature,
        });
        let next = self.script.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(Ok(text)), _) => Ok(text),
            (Some(Err(e)), _) => Err(anyhow::anyhow!(e)),
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => Err(anyhow::anyhow!("scripted model has no more replies")),
        }
    }
}

/// Knowledge search that records every query and answers with a canned observation.
pub struct RecordingSearch {
    answer: String,
    queries: Mutex<Vec<(String, usize)>>,
}

impl RecordingSearch {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeSearch for RecordingSearch {
    async fn search(&self, query: &str, k: usize) -> String {
        self.queries.lock().unwrap().push((query.to_string(), k));
        self.answer.clone()
    }
}

/// Bag-of-keywords embedder: one dimension per keyword, 1.0 when the text mentions it.
pub struct KeywordEmbedder {
    model: String,
    keywords: Vec<&'static str>,
    fail: bool,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&'static str]) -> Self {
        Self {
            model: crate::config::DEFAULT_EMBEDDING_MODEL.to_string(),
            keywords: keywords.to_vec(),
            fail: false,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if self.fail {
            return Err(anyhow::anyhow!("embedding service unavailable"));
        }
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                self.keywords
                    .iter()
                    .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect())
    }
}
