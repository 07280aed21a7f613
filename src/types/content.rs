//! Message content
//!
//! DashScope accepts two content shapes: a plain string for the text models
//! and an ordered list of `{text?, image?}` fragments for the vision-language
//! models. `Content` models both and knows which endpoint each shape is posted to.

use serde::{Deserialize, Serialize};

use crate::defaults::endpoints;
use crate::error::LlmError;

/// Which content shape a request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Text,
    MultiPart,
}

impl ContentKind {
    /// Endpoint path for this content shape.
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Text => endpoints::TEXT_GENERATION,
            Self::MultiPart => endpoints::MULTIMODAL_GENERATION,
        }
    }
}

/// One fragment of multi-part content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self {
            text: None,
            image: Some(url.into()),
        }
    }
}

/// Content carried by one chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Plain text (Qwen text models).
    Text(String),
    /// Ordered text/image fragments (Qwen-VL models).
    MultiPart(Vec<ContentPart>),
}

impl Default for Content {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl Content {
    /// Empty content of the given shape.
    pub fn empty(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Text => Self::Text(String::new()),
            ContentKind::MultiPart => Self::MultiPart(Vec::new()),
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Text(_) => ContentKind::Text,
            Self::MultiPart(_) => ContentKind::MultiPart,
        }
    }

    /// Replace the primary text fragment.
    ///
    /// Multi-part content without a text fragment gets one appended.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        match self {
            Self::Text(s) => *s = text,
            Self::MultiPart(parts) => match parts.iter_mut().find(|p| p.text.is_some()) {
                Some(part) => part.text = Some(text),
                None => parts.push(ContentPart::text(text)),
            },
        }
    }

    /// Concatenate onto the primary text fragment.
    ///
    /// Fails with `EmptyContent` on multi-part content that has no fragment yet.
    pub fn append_text(&mut self, text: &str) -> Result<(), LlmError> {
        match self {
            Self::Text(s) => {
                s.push_str(text);
                Ok(())
            }
            Self::MultiPart(parts) => {
                if parts.is_empty() {
                    return Err(LlmError::EmptyContent);
                }
                let idx = parts.iter().position(|p| p.text.is_some()).unwrap_or(0);
                parts[idx].text.get_or_insert_with(String::new).push_str(text);
                Ok(())
            }
        }
    }

    /// Append an image fragment. Only valid for multi-part content.
    pub fn set_image(&mut self, url: impl Into<String>) -> Result<(), LlmError> {
        match self {
            Self::Text(_) => Err(LlmError::InvalidInput(
                "image fragments require multi-part content".to_string(),
            )),
            Self::MultiPart(parts) => {
                parts.push(ContentPart::image(url));
                Ok(())
            }
        }
    }

    /// Primary text fragment, empty if there is none.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(s) => s,
            Self::MultiPart(parts) => parts
                .iter()
                .find_map(|p| p.text.as_deref())
                .unwrap_or(""),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.text().as_bytes().to_vec()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::MultiPart(parts) => parts.is_empty(),
        }
    }

    /// Image URLs in fragment order.
    pub fn images(&self) -> Vec<&str> {
        match self {
            Self::Text(_) => Vec::new(),
            Self::MultiPart(parts) => parts.iter().filter_map(|p| p.image.as_deref()).collect(),
        }
    }

    /// Endpoint path this content must be posted to.
    pub fn target_path(&self) -> &'static str {
        self.kind().endpoint()
    }

    /// Full endpoint URL under `base_url`.
    pub fn target_url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.target_path())
    }

    /// Fold a streamed chunk into this accumulated content: text is appended,
    /// and an accumulator without fragments adopts the chunk as-is.
    pub(crate) fn merge_chunk(&mut self, chunk: &Content) -> Result<(), LlmError> {
        if matches!(self, Self::MultiPart(parts) if parts.is_empty()) {
            *self = chunk.clone();
            return Ok(());
        }
        let text = chunk.text();
        if text.is_empty() {
            return Ok(());
        }
        self.append_text(text)
    }
}

impl std::fmt::Display for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
