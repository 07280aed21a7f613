//! Chat messages
//!
//! Two layers live here: the wire `Message` sent to DashScope, and the
//! caller-facing `ChatMessage` (role + ordered parts) that the surrounding
//! framework hands us. `build_messages` turns the latter into the former and
//! enforces the one-text-part-per-turn rule before any request is formed.

use serde::{Deserialize, Serialize};

use super::content::{Content, ContentKind};
use crate::error::LlmError;

/// Wire role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Assistant,
    #[default]
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::Assistant => "assistant",
            Role::User => "user",
        };
        f.write_str(s)
    }
}

/// Wire message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub content: Content,
}

impl Message {
    pub fn new(role: Role, content: impl Into<Content>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, Content::Text(text.into()))
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, Content::Text(text.into()))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, Content::Text(text.into()))
    }
}

/// Caller-side role, as used by the surrounding chat framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatRole {
    System,
    Ai,
    Human,
    Generic,
    Function,
}

impl ChatRole {
    /// Map onto a DashScope role. Function messages have no DashScope equivalent.
    pub fn to_wire(self) -> Result<Role, LlmError> {
        match self {
            ChatRole::System => Ok(Role::System),
            ChatRole::Ai => Ok(Role::Assistant),
            ChatRole::Human | ChatRole::Generic => Ok(Role::User),
            ChatRole::Function => Err(LlmError::UnsupportedRole("function".to_string())),
        }
    }
}

/// One caller-supplied message part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePart {
    Text(String),
    ImageUrl(String),
}

/// Caller-side message: a role plus ordered parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub parts: Vec<MessagePart>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, parts: Vec<MessagePart>) -> Self {
        Self { role, parts }
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Human, vec![MessagePart::Text(text.into())])
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(ChatRole::System, vec![MessagePart::Text(text.into())])
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Ai, vec![MessagePart::Text(text.into())])
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.parts.push(MessagePart::ImageUrl(url.into()));
        self
    }

    pub fn has_image(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, MessagePart::ImageUrl(_)))
    }
}

/// Convert caller messages into wire messages of one content shape.
///
/// A message may set its text once; a second text part is rejected with
/// `MultipleTextParts`. Image parts require `ContentKind::MultiPart`.
pub fn build_messages(messages: &[ChatMessage], kind: ContentKind) -> Result<Vec<Message>, LlmError> {
    if messages.is_empty() {
        return Err(LlmError::InvalidInput("no messages to send".to_string()));
    }

    messages
        .iter()
        .map(|msg| {
            let role = msg.role.to_wire()?;
            let mut content = Content::empty(kind);
            let mut found_text = false;
            for part in &msg.parts {
                match part {
                    MessagePart::Text(text) => {
                        if found_text {
                            return Err(LlmError::MultipleTextParts);
                        }
                        content.set_text(text.clone());
                        found_text = true;
                    }
                    MessagePart::ImageUrl(url) => content.set_image(url.clone())?,
                }
            }
            Ok(Message { role, content })
        })
        .collect()
}
