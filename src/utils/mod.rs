//! Utility modules: cancellation and MIME detection.

pub mod cancel;
pub mod mime;

pub use cancel::CancelHandle;
