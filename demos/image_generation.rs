//! Wanx image generation
//!
//! Submits a text-to-image task, waits for it and saves the images.
//!
//! ## Run
//!
//! ```bash
//! export DASHSCOPE_API_KEY=your-api-key-here
//! cargo run --example image_generation -- "a watercolor fox in the snow"
//! ```

use std::time::Duration;

use siumai_dashscope::DashScopeClient;
use siumai_dashscope::types::ImageSynthesisRequest;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "siumai=debug".into()),
        )
        .init();

    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "a watercolor fox in the snow".to_string());

    let client = DashScopeClient::builder()
        .poll_timeout(Duration::from_secs(120))
        .build()?;

    let request = ImageSynthesisRequest::wanx_v1(prompt)
        .with_size("1024*1024")
        .with_n(2);
    let blobs = client.create_image_generation(request).await?;

    for (i, blob) in blobs.iter().enumerate() {
        let ext = blob.mime_type.rsplit('/').next().unwrap_or("png");
        let file = format!("wanx_{i}.{ext}");
        std::fs::write(&file, &blob.data)?;
        println!("{file} ({}, {} bytes) from {}", blob.mime_type, blob.data.len(), blob.url);
    }
    Ok(())
}
