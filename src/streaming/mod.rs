//! Streaming pipeline: bytes → lines → events → one merged response.
//!
//! The decoder runs as its own task and hands events to the aggregator over a
//! bounded channel; the aggregator is the only owner of the accumulator.

pub mod aggregator;
pub mod decoder;
pub mod lines;

pub use aggregator::StreamAggregator;
pub use decoder::{SseLineDecoder, StreamEvent, decode_all, spawn_decoder};
pub use lines::{LineStream, into_lines, lines_from_text};
