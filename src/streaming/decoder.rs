//! SSE line decoder
//!
//! DashScope streams events as groups of `id:`, `event:`, `:HTTP_STATUS/<code>`
//! and `data:` lines separated by blank lines. The `:HTTP_STATUS` comment is
//! DashScope-specific, which is why lines are decoded here instead of through a
//! generic event-source parser that would discard comments.
//!
//! Decoding never fails the whole stream: a malformed `data:` line attaches an
//! error to its own event and the aggregator decides what to do with it.

use futures_util::StreamExt;
use tokio::sync::mpsc;

use super::lines::LineStream;
use crate::defaults::runtime::EVENT_CHANNEL_CAPACITY;
use crate::error::LlmError;
use crate::types::ChatResponse;
use crate::utils::cancel::{CancelHandle, cancelled_error};

/// One decoded SSE group.
#[derive(Debug, Clone, Default)]
pub struct StreamEvent {
    pub id: String,
    pub event: String,
    pub http_status: Option<u16>,
    pub payload: Option<ChatResponse>,
    /// Fatal for this event: an `event:error` payload, malformed data, or a transport failure.
    pub error: Option<LlmError>,
    /// Non-fatal: an unparseable `:HTTP_STATUS` code.
    pub status_error: Option<LlmError>,
}

impl StreamEvent {
    /// An event carrying only an error.
    pub fn failed(error: LlmError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn is_error_event(&self) -> bool {
        self.event == "error"
    }
}

/// Stateful line-by-line decoder.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    current: StreamEvent,
    touched: bool,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Returns an event when the line completes one.
    pub fn push_line(&mut self, line: &str) -> Option<StreamEvent> {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            return self.take_event();
        }

        if let Some(rest) = line.strip_prefix("id:") {
            self.current.id = field_value(rest).to_string();
        } else if let Some(rest) = line.strip_prefix("event:") {
            self.current.event = field_value(rest).to_string();
        } else if let Some(rest) = line.strip_prefix(":HTTP_STATUS/") {
            match rest.trim().parse::<u16>() {
                Ok(code) => self.current.http_status = Some(code),
                Err(e) => {
                    self.current.status_error = Some(LlmError::ParseError(format!(
                        "invalid :HTTP_STATUS code '{}': {e}",
                        rest.trim()
                    )));
                }
            }
        } else if let Some(rest) = line.strip_prefix("data:") {
            let data = field_value(rest);
            self.touched = true;
            if self.current.is_error_event() {
                self.current.error = Some(LlmError::StreamError(data.to_string()));
                return self.take_event();
            }
            match serde_json::from_str::<ChatResponse>(data) {
                Ok(payload) => self.current.payload = Some(payload),
                Err(e) => {
                    self.current.error = Some(LlmError::ParseError(format!(
                        "qwen stream: malformed data line: {e}"
                    )));
                }
            }
            return None;
        } else {
            tracing::warn!(target: "siumai::dashscope", line = %line.trim(), "ignoring unknown stream line");
            return None;
        }

        self.touched = true;
        None
    }

    /// Flush a pending event at end of input.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        self.take_event()
    }

    fn take_event(&mut self) -> Option<StreamEvent> {
        if !self.touched {
            return None;
        }
        self.touched = false;
        let mut event = std::mem::take(&mut self.current);
        if event.is_error_event() && event.error.is_none() {
            let status = event
                .http_status
                .map_or_else(|| "unknown".to_string(), |s| s.to_string());
            event.error = Some(LlmError::StreamError(format!(
                "qwen stream: error event without data (HTTP status {status})"
            )));
        }
        tracing::trace!(
            target: "siumai::dashscope",
            id = %event.id,
            event = %event.event,
            status = ?event.http_status,
            failed = event.error.is_some(),
            "stream event decoded"
        );
        Some(event)
    }
}

/// Strip the single optional space allowed after the field colon.
fn field_value(rest: &str) -> &str {
    rest.strip_prefix(' ').unwrap_or(rest)
}

/// Decode a fixed set of lines in one go.
pub fn decode_all<'a, I>(lines: I) -> Vec<StreamEvent>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut decoder = SseLineDecoder::new();
    let mut events: Vec<StreamEvent> = lines
        .into_iter()
        .filter_map(|line| decoder.push_line(line))
        .collect();
    events.extend(decoder.finish());
    events
}

/// Decode `lines` on a background task, delivering events over a bounded channel.
///
/// The channel closes when the body ends. A transport error or cancellation
/// is delivered as a final failed event. Dropping the receiver stops the task
/// and drops the underlying body.
pub fn spawn_decoder(mut lines: LineStream, cancel: CancelHandle) -> mpsc::Receiver<StreamEvent> {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        let mut decoder = SseLineDecoder::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    let _ = tx.try_send(StreamEvent::failed(cancelled_error("qwen stream read")));
                    return;
                }
                _ = tx.closed() => {
                    tracing::debug!(target: "siumai::dashscope", "stream consumer gone, stopping decoder");
                    return;
                }
                next = lines.next() => next,
            };
            match next {
                Some(Ok(line)) => {
                    if let Some(event) = decoder.push_line(&line)
                        && tx.send(event).await.is_err()
                    {
                        tracing::debug!(target: "siumai::dashscope", "stream consumer gone, stopping decoder");
                        return;
                    }
                }
                Some(Err(e)) => {
                    let _ = tx.send(StreamEvent::failed(e)).await;
                    return;
                }
                None => break,
            }
        }
        if let Some(event) = decoder.finish() {
            let _ = tx.send(event).await;
        }
    });
    rx
}
