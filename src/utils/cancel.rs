//! Cancellation utilities
//!
//! Every network await and every poll sleep in this crate is raced against a
//! [`CancelHandle`]. Cancelling the handle unwinds the pending operation with
//! [`LlmError::Cancelled`] carrying the operation name.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::LlmError;

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Create a new cancel handle.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request cancellation. Pending operations observing this handle stop
    /// as soon as possible; dropping their futures closes the HTTP connection.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// A handle cancelled together with this one, but cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    /// Cancel this handle when the returned guard is dropped.
    pub fn drop_guard(self) -> DropGuard {
        self.token.drop_guard()
    }
}

pub(crate) fn cancelled_error(operation: &str) -> LlmError {
    LlmError::Cancelled(format!("{operation} was cancelled"))
}

/// Await `fut` unless `cancel` fires first.
pub(crate) async fn run_cancellable<F, T>(
    cancel: &CancelHandle,
    operation: &str,
    fut: F,
) -> Result<T, LlmError>
where
    F: Future<Output = Result<T, LlmError>>,
{
    if cancel.is_cancelled() {
        return Err(cancelled_error(operation));
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(cancelled_error(operation)),
        res = fut => res,
    }
}

/// Sleep for `duration` unless `cancel` fires first.
pub(crate) async fn sleep_cancellable(
    cancel: &CancelHandle,
    operation: &str,
    duration: Duration,
) -> Result<(), LlmError> {
    run_cancellable(cancel, operation, async {
        tokio::time::sleep(duration).await;
        Ok(())
    })
    .await
}
