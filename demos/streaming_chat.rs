//! Streaming Qwen chat
//!
//! Prints each text fragment as it arrives, then the merged answer and usage.
//!
//! ## Setup
//!
//! ```bash
//! export DASHSCOPE_API_KEY=your-api-key-here
//! ```
//!
//! ## Run
//!
//! ```bash
//! cargo run --example streaming_chat
//! ```

use std::io::Write;

use siumai_dashscope::types::ChatMessage;
use siumai_dashscope::{CallOptions, DashScopeClient, TongyiLlm};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "siumai=info".into()),
        )
        .init();

    let client = DashScopeClient::builder().model("qwen-turbo").build()?;
    let llm = TongyiLlm::new(client);

    let options = CallOptions::new()
        .with_temperature(0.7)
        .with_streaming_callback(|chunk: &[u8]| {
            let mut out = std::io::stdout();
            out.write_all(chunk)?;
            out.flush()?;
            Ok(())
        });

    let response = llm
        .generate_content(
            &[
                ChatMessage::system("You are a concise assistant."),
                ChatMessage::human("Explain server-sent events in two sentences."),
            ],
            options,
        )
        .await?;

    println!("\n");
    for choice in &response.choices {
        println!("stop reason: {}", choice.stop_reason);
        println!(
            "tokens: prompt={:?} completion={:?} total={:?}",
            choice.prompt_tokens(),
            choice.completion_tokens(),
            choice.total_tokens()
        );
    }
    Ok(())
}
