//! Cooperative cancellation for in-flight provider calls.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, StabilityError};

/// A handle the caller keeps to abandon a call.
///
/// Clones share the same underlying token, so one handle can be given to the
/// client while another copy is triggered from a different task.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// A handle that is cancelled whenever this one is, but can also be
    /// cancelled on its own without affecting the parent.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    /// Cancels this handle once `after` elapses. The client never imposes a
    /// deadline itself; this is how a caller attaches one.
    pub fn cancel_after(&self, after: Duration) -> tokio::task::JoinHandle<()> {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(after) => token.cancel(),
            }
        })
    }
}

/// Drives `future` to completion unless `cancel` fires first.
///
/// A triggered handle always wins: it is checked before the future is polled,
/// it is polled first on every wakeup, and an error produced while the handle
/// was being triggered is reported as `Cancelled`.
pub(crate) async fn run_cancellable<T, F>(cancel: Option<&CancelHandle>, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(cancel) = cancel else {
        return future.await;
    };

    if cancel.is_cancelled() {
        return Err(StabilityError::Cancelled);
    }

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StabilityError::Cancelled),
        result = future => result,
    };

    match outcome {
        Err(_) if cancel.is_cancelled() => Err(StabilityError::Cancelled),
        other => other,
    }
}
