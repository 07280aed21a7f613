//! Text embedding types.

use serde::{Deserialize, Serialize};

use crate::defaults::models;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingParams {
    /// `query` or `document`.
    pub text_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: EmbeddingInput,
    pub parameters: EmbeddingParams,
}

impl EmbeddingRequest {
    pub fn new(texts: Vec<String>) -> Self {
        Self {
            model: String::new(),
            input: EmbeddingInput { texts },
            parameters: EmbeddingParams::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_text_type(mut self, text_type: impl Into<String>) -> Self {
        self.parameters.text_type = text_type.into();
        self
    }

    /// Fill the model (`text-embedding-v1`) and text type (`document`) when unset.
    pub(crate) fn apply_defaults(&mut self) {
        if self.model.is_empty() {
            self.model = models::TEXT_EMBEDDING_V1.to_string();
        }
        if self.parameters.text_type.is_empty() {
            self.parameters.text_type = models::DEFAULT_EMBEDDING_TEXT_TYPE.to_string();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    #[serde(default)]
    pub text_index: usize,
    #[serde(default)]
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    #[serde(default)]
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingOutput {
    #[serde(default)]
    pub embeddings: Vec<Embedding>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    #[serde(default)]
    pub output: EmbeddingOutput,
    #[serde(default)]
    pub usage: EmbeddingUsage,
    #[serde(default)]
    pub request_id: String,
}
