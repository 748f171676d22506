//! Caller-driven cancellation of in-flight Vault requests.
//!
//! The orchestrator keeps a clone of the [`AbortHandle`] it gave to the
//! gateway. Each `abort()` cancels the requests running at that moment; it
//! does not poison the handle, so a retry issued afterwards goes through.
//! Cancelled calls fail with [`ConnectorError::Cancelled`].

use crate::error::{ConnectorError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared abort trigger. Every abort bumps a generation counter; a request
/// is cancelled when the generation moves while it runs.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    generation: Arc<watch::Sender<u64>>,
}

impl AbortHandle {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            generation: Arc::new(generation),
        }
    }

    /// Cancel every request currently running under this handle.
    pub fn abort(&self) {
        self.generation.send_modify(|g| *g = g.wrapping_add(1));
    }

    /// How many times `abort()` has fired.
    pub fn aborts(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Run `task`, failing with `Cancelled` if an abort lands before it ends.
    pub async fn run<T, F>(&self, task: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        // A fresh receiver has already seen the current generation.
        let mut scope = self.generation.subscribe();
        tokio::select! {
            result = task => result,
            _ = scope.changed() => Err(ConnectorError::Cancelled),
        }
    }
}

impl Default for AbortHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn forever() -> Result<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    #[tokio::test]
    async fn run_completes_normally() {
        let handle = AbortHandle::new();
        let result = handle.run(async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn abort_cancels_pending_request() {
        let handle = AbortHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.run(forever()).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.abort();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(ConnectorError::Cancelled)));
        assert!(result.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn retry_after_abort_goes_through() {
        let handle = AbortHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.run(forever()).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.abort();
        assert!(task.await.unwrap().is_err());

        let retry = handle.run(async { Ok("done") }).await;
        assert_eq!(retry.unwrap(), "done");
        assert_eq!(handle.aborts(), 1);
    }

    #[tokio::test]
    async fn abort_before_run_does_not_cancel_it() {
        let handle = AbortHandle::new();
        handle.abort();
        handle.abort();
        assert_eq!(handle.run(async { Ok(7) }).await.unwrap(), 7);
        assert_eq!(handle.aborts(), 2);
    }
}
