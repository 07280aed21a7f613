//! Default values shared across the client.

/// DashScope endpoints.
pub mod endpoints {
    pub const BASE_URL: &str = "https://dashscope.aliyuncs.com";

    /// Text-only chat (Qwen).
    pub const TEXT_GENERATION: &str = "/api/v1/services/aigc/text-generation/generation";

    /// Interleaved text/image chat (Qwen-VL).
    pub const MULTIMODAL_GENERATION: &str =
        "/api/v1/services/aigc/multimodal-generation/generation";

    /// Wanx text-to-image task submission.
    pub const IMAGE_SYNTHESIS: &str = "/api/v1/services/aigc/text2image/image-synthesis";

    /// Task status prefix; the task id is appended as the last path segment.
    pub const TASKS: &str = "/api/v1/tasks";

    pub const TEXT_EMBEDDING: &str = "/api/v1/services/embeddings/text-embedding/text-embedding";
}

/// HTTP defaults.
pub mod http {
    use std::time::Duration;

    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const USER_AGENT: &str = concat!("siumai-dashscope/", env!("CARGO_PKG_VERSION"));

    /// Header that switches a DashScope endpoint into submit-then-poll mode.
    pub const ASYNC_HEADER: &str = "X-DashScope-Async";
}

/// Streaming and polling defaults.
pub mod runtime {
    use std::time::Duration;

    /// Capacity of the decoder → aggregator channel.
    pub const EVENT_CHANNEL_CAPACITY: usize = 100;

    /// Fixed delay between task status fetches.
    pub const POLL_INTERVAL: Duration = Duration::from_millis(500);
}

/// Model defaults.
pub mod models {
    pub const QWEN_TURBO: &str = "qwen-turbo";
    pub const QWEN_PLUS: &str = "qwen-plus";
    pub const QWEN_MAX: &str = "qwen-max";
    pub const QWEN_VL_PLUS: &str = "qwen-vl-plus";
    pub const WANX_V1: &str = "wanx-v1";
    pub const TEXT_EMBEDDING_V1: &str = "text-embedding-v1";

    /// Prefix identifying the multimodal (vision-language) model family.
    pub const VL_PREFIX: &str = "qwen-vl";

    pub const DEFAULT_RESULT_FORMAT: &str = "message";
    pub const DEFAULT_TEMPERATURE: f64 = 1.0;
    pub const DEFAULT_EMBEDDING_TEXT_TYPE: &str = "document";
}

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "DASHSCOPE_API_KEY";
