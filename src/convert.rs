//! Response converter: merged or raw responses into caller-facing choices.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::ChatResponse;

pub const PROMPT_TOKENS: &str = "PromptTokens";
pub const COMPLETION_TOKENS: &str = "CompletionTokens";
pub const TOTAL_TOKENS: &str = "TotalTokens";

/// One generated alternative, as seen by the caller framework.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentChoice {
    pub content: String,
    pub stop_reason: String,
    /// Token usage under `PromptTokens`, `CompletionTokens` and `TotalTokens`.
    pub generation_info: HashMap<String, serde_json::Value>,
}

impl ContentChoice {
    pub fn prompt_tokens(&self) -> Option<u64> {
        self.generation_info.get(PROMPT_TOKENS).and_then(|v| v.as_u64())
    }

    pub fn completion_tokens(&self) -> Option<u64> {
        self.generation_info
            .get(COMPLETION_TOKENS)
            .and_then(|v| v.as_u64())
    }

    pub fn total_tokens(&self) -> Option<u64> {
        self.generation_info.get(TOTAL_TOKENS).and_then(|v| v.as_u64())
    }
}

/// Project every choice of `response`, attaching the response-level usage to each.
pub fn to_content_choices(response: &ChatResponse) -> Vec<ContentChoice> {
    let usage = response.usage;
    response
        .choices()
        .iter()
        .map(|choice| ContentChoice {
            content: choice.message.content.to_string(),
            stop_reason: choice.finish_reason.clone(),
            generation_info: HashMap::from([
                (PROMPT_TOKENS.to_string(), usage.input_tokens.into()),
                (COMPLETION_TOKENS.to_string(), usage.output_tokens.into()),
                (TOTAL_TOKENS.to_string(), usage.total_tokens.into()),
            ]),
        })
        .collect()
}
