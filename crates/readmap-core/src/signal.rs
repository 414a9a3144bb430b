use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Cooperative cancellation handle shared between a caller and extractors.
///
/// Clones share state: aborting any clone aborts them all. Extractors poll
/// [`is_aborted`](Self::is_aborted) before expensive work and race
/// subprocesses against [`cancelled`](Self::cancelled).
///
/// # Examples
///
/// ```
/// use readmap_core::AbortSignal;
///
/// let signal = AbortSignal::new();
/// let worker_view = signal.clone();
/// assert!(!worker_view.is_aborted());
///
/// signal.abort();
/// assert!(worker_view.is_aborted());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    aborted: AtomicBool,
    notify: Notify,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the signal aborted and wake every task waiting in [`cancelled`](Self::cancelled).
    pub fn abort(&self) {
        self.inner.aborted.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    /// Resolve once the signal has been aborted.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so an abort in between still wakes us.
            let notified = self.inner.notify.notified();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancelled_resolves_after_abort() {
        let signal = AbortSignal::new();
        let waiter = signal.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.abort();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("cancelled() should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_returns_immediately_when_already_aborted() {
        let signal = AbortSignal::new();
        signal.abort();
        tokio::time::timeout(Duration::from_millis(100), signal.cancelled())
            .await
            .expect("already-aborted signal should not wait");
    }

    #[tokio::test]
    async fn fresh_signal_stays_pending() {
        let signal = AbortSignal::new();
        let outcome = tokio::time::timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(outcome.is_err());
    }
}
