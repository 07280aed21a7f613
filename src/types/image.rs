//! Wanx image synthesis types.

use serde::{Deserialize, Serialize};

use crate::defaults::models;

/// Image synthesis parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSynthesisParams {
    /// Output style, e.g. `<auto>`, `<3d cartoon>`, `<anime>`, `<oil painting>`,
    /// `<watercolor>`, `<sketch>`, `<chinese painting>`, `<flat illustration>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// `1024*1024` (default), `720*1280` or `1280*720`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Number of images, 1..=4.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSynthesisInput {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

/// Text-to-image request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSynthesisRequest {
    pub model: String,
    pub input: ImageSynthesisInput,
    pub parameters: ImageSynthesisParams,
}

impl ImageSynthesisRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: String::new(),
            input: ImageSynthesisInput {
                prompt: prompt.into(),
                negative_prompt: None,
            },
            parameters: ImageSynthesisParams::default(),
        }
    }

    pub fn wanx_v1(prompt: impl Into<String>) -> Self {
        Self::new(prompt).with_model(models::WANX_V1)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_negative_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.input.negative_prompt = Some(prompt.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.parameters.style = Some(style.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.parameters.size = Some(size.into());
        self
    }

    pub const fn with_n(mut self, n: u32) -> Self {
        self.parameters.n = Some(n);
        self
    }

    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.parameters.seed = Some(seed);
        self
    }
}

/// Server-side task status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Suspended,
    Succeeded,
    Failed,
    Canceled,
    /// Any status string this client does not know about.
    #[default]
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// Still enqueued or executing; polling continues.
    pub const fn is_in_progress(self) -> bool {
        matches!(self, Self::Pending | Self::Running | Self::Suspended)
    }

    pub const fn is_terminal(self) -> bool {
        !self.is_in_progress()
    }

    pub const fn is_unsuccessful(self) -> bool {
        matches!(self, Self::Failed | Self::Canceled)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Suspended => "SUSPENDED",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetrics {
    #[serde(rename = "TOTAL", default)]
    pub total: u32,
    #[serde(rename = "SUCCEEDED", default)]
    pub succeeded: u32,
    #[serde(rename = "FAILED", default)]
    pub failed: u32,
}

/// Task state as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WanxTask {
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub task_status: TaskStatus,
    #[serde(default)]
    pub results: Vec<TaskResult>,
    #[serde(default)]
    pub task_metrics: TaskMetrics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WanxUsage {
    #[serde(default)]
    pub image_count: u32,
}

/// Body of both the submit response and the task status response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    #[serde(default)]
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub output: WanxTask,
    #[serde(default)]
    pub usage: WanxUsage,
}

/// A generated image materialized as bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub mime_type: String,
    pub data: Vec<u8>,
    /// Remote URL the bytes were fetched from.
    pub url: String,
}
