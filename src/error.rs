//! Error Handling Module
//!
//! A single `LlmError` enum covers every failure this crate can report. Each
//! variant maps onto a coarse [`ErrorCategory`] so callers can branch on the
//! kind of failure (configuration, wire-protocol violation, remote task
//! failure, transport, callback, cancellation) without matching every variant.
//!
//! # Example
//!
//! ```rust,ignore
//! use siumai_dashscope::error::{ErrorCategory, LlmError};
//!
//! let error = LlmError::EmptyTaskId;
//! assert_eq!(error.category(), ErrorCategory::Protocol);
//! ```

use thiserror::Error;

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Client misconfiguration (missing model, invalid header, bad proxy URL).
    Configuration,
    /// Caller supplied messages that cannot be turned into a request.
    Input,
    /// The upstream broke its documented wire contract.
    Protocol,
    /// A remote asynchronous task reached FAILED or CANCELED.
    RemoteTask,
    /// Network or HTTP failure.
    Transport,
    /// The caller's streaming callback returned an error.
    Callback,
    /// The operation observed a cancellation signal.
    Cancelled,
}

/// Library error type.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("model is not set")]
    ModelNotSet,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("found multiple text parts in message")]
    MultipleTextParts,

    #[error("message content is empty")]
    EmptyContent,

    #[error("role {0} not supported")]
    UnsupportedRole(String),

    #[error("empty response")]
    EmptyResponse,

    #[error("task id is empty")]
    EmptyTaskId,

    #[error("Parse error: {0}")]
    ParseError(String),

    /// An `event:error` group, or a malformed stream line. The message is the raw payload.
    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("task {task_id} is not successful: {status}")]
    TaskUnsuccessful { task_id: String, status: String },

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Timeout: {0}")]
    TimeoutError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Streaming callback failed: {0}")]
    CallbackError(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("not all inputs were embedded: expected {expected}, got {actual}")]
    IncompleteEmbedding { expected: usize, actual: usize },
}

impl LlmError {
    /// Build an `ApiError` without details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Build an `ApiError` carrying the raw provider body.
    pub fn api_error_with_details(
        code: u16,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError(_) | Self::ModelNotSet => ErrorCategory::Configuration,
            Self::InvalidInput(_)
            | Self::MultipleTextParts
            | Self::EmptyContent
            | Self::UnsupportedRole(_)
            | Self::IncompleteEmbedding { .. } => ErrorCategory::Input,
            Self::EmptyResponse
            | Self::EmptyTaskId
            | Self::ParseError(_)
            | Self::StreamError(_)
            | Self::JsonError(_) => ErrorCategory::Protocol,
            Self::TaskUnsuccessful { .. } => ErrorCategory::RemoteTask,
            Self::HttpError(_)
            | Self::ApiError { .. }
            | Self::TimeoutError(_)
            | Self::ConnectionError(_) => ErrorCategory::Transport,
            Self::CallbackError(_) => ErrorCategory::Callback,
            Self::Cancelled(_) => ErrorCategory::Cancelled,
        }
    }

    pub fn is_protocol_error(&self) -> bool {
        self.category() == ErrorCategory::Protocol
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// HTTP status code, when the error came from a non-2xx answer.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimeoutError(err.to_string())
        } else if err.is_connect() {
            Self::ConnectionError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}
