//! Streaming aggregator
//!
//! Folds decoded [`StreamEvent`]s into one [`ChatResponse`]. Text is appended
//! chunk by chunk; role, finish reason, usage and request id are overwritten by
//! every event, because DashScope repeats them and reports running totals.
//! Any event error, an event without choices, or a failing callback aborts the
//! whole call. Bytes already handed to the callback are not rolled back.

use tokio::sync::mpsc;

use super::decoder::StreamEvent;
use crate::error::LlmError;
use crate::types::{ChatResponse, Choice, Content, Message, StreamingCallback};
use crate::utils::cancel::{CancelHandle, cancelled_error};

/// Accumulates one logical response out of streamed chunks.
#[derive(Default)]
pub struct StreamAggregator {
    response: ChatResponse,
    callback: Option<StreamingCallback>,
    events: usize,
}

impl std::fmt::Debug for StreamAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamAggregator")
            .field("response", &self.response)
            .field("has_callback", &self.callback.is_some())
            .field("events", &self.events)
            .finish()
    }
}

impl StreamAggregator {
    pub fn new(callback: Option<StreamingCallback>) -> Self {
        Self {
            callback,
            ..Default::default()
        }
    }

    /// Fold one event into the accumulator.
    pub fn fold(&mut self, event: StreamEvent) -> Result<(), LlmError> {
        if let Some(error) = event.error {
            return Err(error);
        }
        if let Some(warning) = &event.status_error {
            tracing::warn!(target: "siumai::dashscope", id = %event.id, err = %warning, "ignoring bad stream status line");
        }
        let payload = event.payload.ok_or(LlmError::EmptyResponse)?;
        let Some(first) = payload.output.choices.first() else {
            return Err(LlmError::EmptyResponse);
        };

        let chunk_text = first.message.content.text();
        if !chunk_text.is_empty()
            && let Some(callback) = &self.callback
        {
            callback(chunk_text.as_bytes())
                .map_err(|e| LlmError::CallbackError(format!("qwen stream: {e}")))?;
        }

        for (idx, chunk) in payload.output.choices.iter().enumerate() {
            self.merge_choice(idx, chunk)?;
        }
        self.response.usage = payload.usage;
        self.response.request_id = payload.request_id;
        self.events += 1;
        Ok(())
    }

    fn merge_choice(&mut self, idx: usize, chunk: &Choice) -> Result<(), LlmError> {
        let choices = &mut self.response.output.choices;
        if choices.len() <= idx {
            choices.push(Choice {
                message: Message::new(
                    chunk.message.role,
                    Content::empty(chunk.message.content.kind()),
                ),
                finish_reason: String::new(),
            });
        }
        let acc = &mut choices[idx];
        acc.message.role = chunk.message.role;
        acc.finish_reason.clone_from(&chunk.finish_reason);
        acc.message.content.merge_chunk(&chunk.message.content)
    }

    /// Number of events folded so far.
    pub fn event_count(&self) -> usize {
        self.events
    }

    /// The merged response. A stream that delivered no events is an `EmptyResponse`.
    pub fn finish(self) -> Result<ChatResponse, LlmError> {
        if self.response.output.choices.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(self.response)
    }

    /// Drain `rx` until the producer closes it.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<StreamEvent>,
        cancel: &CancelHandle,
    ) -> Result<ChatResponse, LlmError> {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled_error("qwen stream")),
                next = rx.recv() => next,
            };
            let Some(event) = next else { break };
            self.fold(event)?;
        }
        tracing::debug!(target: "siumai::dashscope", events = self.events, "stream aggregated");
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::decoder::decode_all;
    use crate::types::BoxError;
    use std::sync::{Arc, Mutex};

    fn chunk(text: &str, finish: &str, total: u32, output: u32) -> String {
        format!(
            r#"data:{{"output":{{"choices":[{{"message":{{"role":"assistant","content":"{text}"}},"finish_reason":"{finish}"}}]}},"usage":{{"total_tokens":{total},"input_tokens":6,"output_tokens":{output}}},"request_id":"95bea986-ac55-9fd3-8326-8415cbdf5683"}}"#
        )
    }

    fn fixture() -> Vec<String> {
        vec![
            "id:1".into(),
            "event:result".into(),
            ":HTTP_STATUS/200".into(),
            chunk("Hello! How", "null", 9, 3),
            "    ".into(),
            "id:2".into(),
            "event:result".into(),
            ":HTTP_STATUS/200".into(),
            chunk(" can I assist you today?", "null", 15, 9),
            "    ".into(),
            "id:3".into(),
            "event:result".into(),
            ":HTTP_STATUS/200".into(),
            chunk("", "stop", 15, 9),
        ]
    }

    fn recording_callback() -> (StreamingCallback, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let cb: StreamingCallback = Arc::new(move |bytes: &[u8]| -> Result<(), BoxError> {
            sink.lock()
                .unwrap()
                .push(String::from_utf8_lossy(bytes).into_owned());
            Ok(())
        });
        (cb, seen)
    }

    fn aggregate(
        lines: &[String],
        callback: Option<StreamingCallback>,
    ) -> Result<ChatResponse, LlmError> {
        let mut agg = StreamAggregator::new(callback);
        for event in decode_all(lines.iter().map(String::as_str)) {
            agg.fold(event)?;
        }
        agg.finish()
    }

    #[test]
    fn three_event_fixture() {
        let (cb, seen) = recording_callback();
        let resp = aggregate(&fixture(), Some(cb)).unwrap();
        assert_eq!(resp.text(), "Hello! How can I assist you today?");
        assert_eq!(resp.finish_reason(), Some("stop"));
        assert_eq!(resp.usage.total_tokens, 15);
        assert_eq!(resp.usage.input_tokens, 6);
        assert_eq!(resp.usage.output_tokens, 9);
        assert_eq!(resp.request_id, "95bea986-ac55-9fd3-8326-8415cbdf5683");
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["Hello! How", " can I assist you today?"]
        );
    }

    #[test]
    fn callback_runs_once_per_non_empty_chunk() {
        let mut lines = Vec::new();
        let parts = ["a", "b", "", "c", "d"];
        for (i, p) in parts.iter().enumerate() {
            lines.push(format!("id:{i}"));
            lines.push(chunk(p, "null", 1, 1));
            lines.push(String::new());
        }
        let (cb, seen) = recording_callback();
        let resp = aggregate(&lines, Some(cb)).unwrap();
        assert_eq!(resp.text(), "abcd");
        assert_eq!(seen.lock().unwrap().len(), 4);
    }

    #[test]
    fn error_event_aborts_regardless_of_prior_text() {
        let mut lines = fixture();
        lines.truncate(5);
        lines.extend([
            "id:2".to_string(),
            "event:error".to_string(),
            r#"data:{"code":"DataInspectionFailed","message":"Output data may contain inappropriate content."}"#.to_string(),
        ]);
        match aggregate(&lines, None).unwrap_err() {
            LlmError::StreamError(msg) => assert!(msg.contains("DataInspectionFailed")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn zero_choices_in_later_event_is_protocol_error() {
        let mut lines = fixture();
        lines.truncate(5);
        lines.push(r#"data:{"output":{"choices":[]},"usage":{},"request_id":"x"}"#.to_string());
        let err = aggregate(&lines, None).unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
        assert!(err.is_protocol_error());
    }

    #[test]
    fn callback_failure_aborts() {
        let cb: StreamingCallback = Arc::new(|_: &[u8]| -> Result<(), BoxError> { Err("sink closed".into()) });
        let err = aggregate(&fixture(), Some(cb)).unwrap_err();
        match err {
            LlmError::CallbackError(msg) => assert!(msg.contains("sink closed")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn aggregation_is_deterministic() {
        let lines = fixture();
        let a = aggregate(&lines, None).unwrap();
        let b = aggregate(&lines, None).unwrap();
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }

    #[test]
    fn multipart_chunks_append_to_first_fragment() {
        let lines = vec![
            r#"data:{"output":{"choices":[{"message":{"role":"assistant","content":[{"text":"A "}]},"finish_reason":"null"}]}}"#.to_string(),
            String::new(),
            r#"data:{"output":{"choices":[{"message":{"role":"assistant","content":[{"text":"dog"}]},"finish_reason":"stop"}]}}"#.to_string(),
        ];
        let resp = aggregate(&lines, None).unwrap();
        assert_eq!(resp.text(), "A dog");
        assert_eq!(resp.choices()[0].message.content.kind(), crate::types::ContentKind::MultiPart);
    }

    #[test]
    fn empty_stream_is_empty_response() {
        assert!(matches!(aggregate(&[], None), Err(LlmError::EmptyResponse)));
    }

    #[tokio::test]
    async fn run_consumes_channel() {
        let (tx, rx) = mpsc::channel(4);
        let events = decode_all(fixture().iter().map(String::as_str));
        tokio::spawn(async move {
            for ev in events {
                tx.send(ev).await.unwrap();
            }
        });
        let resp = StreamAggregator::new(None)
            .run(rx, &CancelHandle::new())
            .await
            .unwrap();
        assert_eq!(resp.text(), "Hello! How can I assist you today?");
    }

    #[tokio::test]
    async fn run_observes_cancellation() {
        let (_tx, rx) = mpsc::channel::<StreamEvent>(1);
        let cancel = CancelHandle::new();
        cancel.cancel();
        let err = StreamAggregator::new(None)
            .run(rx, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
