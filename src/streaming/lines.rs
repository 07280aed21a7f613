//! Byte stream to text line splitting.
//!
//! Network chunks may split a line (or a multi-byte UTF-8 character) anywhere,
//! so bytes are buffered until a `\n` arrives. A trailing `\r` is stripped and
//! an unterminated final line is flushed at end of stream.

use futures::Stream;
use futures_util::StreamExt;
use std::pin::Pin;

use crate::error::LlmError;

/// A boxed stream of decoded text lines.
pub type LineStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Split a chunked byte stream into lines.
pub fn into_lines<S, B>(bytes: S) -> impl Stream<Item = Result<String, LlmError>> + Send
where
    S: Stream<Item = Result<B, LlmError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut buf: Vec<u8> = Vec::new();
        // Bytes before this offset are known to hold no newline.
        let mut scanned = 0;
        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    buf.extend_from_slice(chunk.as_ref());
                    while let Some(rel) = buf[scanned..].iter().position(|b| *b == b'\n') {
                        let raw: Vec<u8> = buf.drain(..=scanned + rel).collect();
                        scanned = 0;
                        yield decode_line(&raw[..raw.len() - 1]);
                    }
                    scanned = buf.len();
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
        if !buf.is_empty() {
            yield decode_line(&buf);
        }
    }
}

/// A line stream over an in-memory body.
pub fn lines_from_text(text: &str) -> LineStream {
    let lines: Vec<Result<String, LlmError>> =
        text.lines().map(|l| Ok(l.to_string())).collect();
    Box::pin(futures::stream::iter(lines))
}

fn decode_line(raw: &[u8]) -> Result<String, LlmError> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8(raw.to_vec())
        .map_err(|e| LlmError::StreamError(format!("invalid UTF-8 in stream line: {e}")))
}
