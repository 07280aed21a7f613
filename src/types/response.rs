//! Chat response types.

use serde::{Deserialize, Deserializer, Serialize};

use super::message::Message;

/// Token usage. DashScope reports running totals, not deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total_tokens: u32,
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub message: Message,
    #[serde(default, deserialize_with = "null_as_default")]
    pub finish_reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Output {
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: Vec<Choice>,
}

/// Response body of a chat call (or one streamed chunk of it).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default)]
    pub request_id: String,
}

impl ChatResponse {
    pub fn choices(&self) -> &[Choice] {
        &self.output.choices
    }

    /// Text of the first choice.
    pub fn text(&self) -> &str {
        self.output
            .choices
            .first()
            .map(|c| c.message.content.text())
            .unwrap_or("")
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.output.choices.first().map(|c| c.finish_reason.as_str())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
