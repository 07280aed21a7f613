//! siumai-dashscope
//!
//! DashScope client for Tongyi Qwen chat (text and vision-language), Wanx
//! image generation and text embeddings.
//!
//! Streaming chat decodes the server-sent event stream line by line, folds
//! incremental fragments into one response and forwards each text fragment to
//! a caller callback. Image generation submits an asynchronous task, polls it
//! to a terminal state and downloads the result images.
#![deny(unsafe_code)]

pub mod builder;
pub mod client;
pub mod config;
pub mod convert;
pub mod defaults;
pub mod embedding;
pub mod error;
pub mod execution;
pub mod llm;
pub mod qwen;
pub mod streaming;
pub mod tools;
pub mod types;
pub mod utils;
pub mod wanx;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::DashScopeBuilder;
pub use client::DashScopeClient;
pub use config::{DashScopeConfig, HttpConfig};
pub use convert::{ContentChoice, to_content_choices};
pub use error::{ErrorCategory, LlmError};
pub use llm::{CallOptions, ContentResponse, TongyiLlm};
pub use tools::WanxImageTool;
pub use utils::CancelHandle;
pub use wanx::TaskPoller;
