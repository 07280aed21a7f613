//! Wanx image generation: submit a task, poll it to a terminal state, download
//! the results.
//!
//! DashScope only offers image synthesis as an asynchronous task. The poller
//! turns it into one awaited call: it sleeps a fixed interval between status
//! fetches (no backoff), stops on the first terminal status, and fetches the
//! result images in order. Every network call and every sleep observes the
//! caller's [`CancelHandle`]; an optional deadline bounds the whole wait.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::defaults::{endpoints, http::ASYNC_HEADER, runtime};
use crate::error::LlmError;
use crate::execution::transport::{HttpTransport, RequestOptions, get_typed, post_typed};
use crate::types::{ImageBlob, ImageSynthesisRequest, TaskResponse, WanxTask};
use crate::utils::cancel::{CancelHandle, run_cancellable, sleep_cancellable};
use crate::utils::mime::resolve_image_mime;

/// Submit-then-poll driver for Wanx tasks.
#[derive(Clone)]
pub struct TaskPoller {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    options: RequestOptions,
    interval: Duration,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for TaskPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPoller")
            .field("base_url", &self.base_url)
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TaskPoller {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
        options: RequestOptions,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            options,
            interval: runtime::POLL_INTERVAL,
            timeout: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Upper bound on the time spent polling. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Submit, wait, and download every generated image.
    pub async fn generate(
        &self,
        request: &ImageSynthesisRequest,
        cancel: &CancelHandle,
    ) -> Result<Vec<ImageBlob>, LlmError> {
        let task = self.run_task(request, cancel).await?;
        self.download(&task, cancel).await
    }

    /// Submit and wait until the task succeeds. The returned task has at least one result.
    pub async fn run_task(
        &self,
        request: &ImageSynthesisRequest,
        cancel: &CancelHandle,
    ) -> Result<WanxTask, LlmError> {
        let submitted = self.submit(request, cancel).await?;
        if submitted.output.task_id.is_empty() {
            return Err(LlmError::EmptyTaskId);
        }
        let task = self.wait(submitted.output, cancel).await?;
        if task.results.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(task)
    }

    /// Create the task. The answer normally carries a PENDING task id.
    pub async fn submit(
        &self,
        request: &ImageSynthesisRequest,
        cancel: &CancelHandle,
    ) -> Result<TaskResponse, LlmError> {
        let url = format!("{}{}", self.base_url, endpoints::IMAGE_SYNTHESIS);
        let options = self.options.clone().with_header(ASYNC_HEADER, "enable");
        let response: TaskResponse = run_cancellable(
            cancel,
            "wanx submit",
            post_typed(self.transport.as_ref(), "wanx submit", &url, request, &options),
        )
        .await?;
        tracing::debug!(
            target: "siumai::dashscope",
            task_id = %response.output.task_id,
            status = %response.output.task_status,
            request_id = %response.request_id,
            "wanx task submitted"
        );
        Ok(response)
    }

    /// Fetch the current state of `task_id`.
    pub async fn fetch_status(
        &self,
        task_id: &str,
        cancel: &CancelHandle,
    ) -> Result<TaskResponse, LlmError> {
        let url = format!(
            "{}{}/{}",
            self.base_url,
            endpoints::TASKS,
            urlencoding::encode(task_id)
        );
        run_cancellable(
            cancel,
            "wanx task status",
            get_typed(self.transport.as_ref(), "wanx task status", &url, &self.options),
        )
        .await
    }

    /// Poll until `task` leaves PENDING/RUNNING/SUSPENDED.
    ///
    /// FAILED and CANCELED end in `TaskUnsuccessful`; no fetch is made after
    /// a terminal status is observed.
    pub async fn wait(&self, task: WanxTask, cancel: &CancelHandle) -> Result<WanxTask, LlmError> {
        if task.task_id.is_empty() {
            return Err(LlmError::EmptyTaskId);
        }
        let started = Instant::now();
        let mut task = task;
        let mut polls = 0u32;

        while task.task_status.is_in_progress() {
            let pause = match self.timeout {
                Some(limit) => {
                    let elapsed = started.elapsed();
                    if elapsed >= limit {
                        return Err(LlmError::TimeoutError(format!(
                            "wanx task {} still {} after {:?}",
                            task.task_id, task.task_status, elapsed
                        )));
                    }
                    // Last fetch lands on the deadline.
                    self.interval.min(limit - elapsed)
                }
                None => self.interval,
            };
            sleep_cancellable(cancel, "wanx poll", pause).await?;

            let response = self.fetch_status(&task.task_id, cancel).await?;
            polls += 1;
            let next = response.output;
            tracing::debug!(
                target: "siumai::dashscope",
                task_id = %task.task_id,
                status = %next.task_status,
                poll = polls,
                "wanx task polled"
            );
            task = WanxTask {
                task_id: if next.task_id.is_empty() {
                    task.task_id
                } else {
                    next.task_id
                },
                ..next
            };
        }

        if task.task_status.is_unsuccessful() {
            return Err(LlmError::TaskUnsuccessful {
                task_id: task.task_id,
                status: task.task_status.to_string(),
            });
        }
        Ok(task)
    }

    /// Fetch every result image in order. Any failed fetch fails the whole call.
    ///
    /// Result URLs are pre-signed storage links, so no credentials are attached.
    pub async fn download(
        &self,
        task: &WanxTask,
        cancel: &CancelHandle,
    ) -> Result<Vec<ImageBlob>, LlmError> {
        if task.results.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        let anonymous = RequestOptions::new();
        let mut blobs = Vec::with_capacity(task.results.len());
        for result in &task.results {
            let binary = run_cancellable(
                cancel,
                "wanx image fetch",
                self.transport.fetch_binary(&result.url, &anonymous),
            )
            .await?;
            let mime_type = resolve_image_mime(binary.content_type.as_deref(), &binary.bytes);
            blobs.push(ImageBlob {
                mime_type,
                data: binary.bytes,
                url: result.url.clone(),
            });
        }
        Ok(blobs)
    }
}
