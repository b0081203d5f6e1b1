/*!
Shutdown coordination between the ingestion worker and the transmission loop.

Either side may trigger the signal; both observe it in their readiness waits.
Triggering more than once is harmless.
*/

use std::sync::Arc;
use tokio::sync::watch;

/// Shared stop flag observable from async waits
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request a stop. Safe to call from any thread, including signal handlers.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    #[cfg(test)]
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once a stop has been requested (immediately if it already was)
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|stopped| *stopped).await;
    }

    /// Guard that triggers the signal when dropped, whatever the exit route
    pub fn guard(&self) -> ShutdownGuard {
        ShutdownGuard {
            shutdown: self.clone(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Triggers its [`Shutdown`] on drop
#[derive(Debug)]
pub struct ShutdownGuard {
    shutdown: Shutdown,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_resolves_after_trigger() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());

        let remote = shutdown.clone();
        let waiter = tokio::spawn(async move { remote.wait().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait() did not resolve")
            .unwrap();
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_wait_after_trigger_is_immediate() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();

        tokio::time::timeout(Duration::from_millis(100), shutdown.wait())
            .await
            .expect("already-triggered wait() blocked");
    }

    #[test]
    fn test_guard_triggers_on_drop() {
        let shutdown = Shutdown::new();
        {
            let _guard = shutdown.guard();
            assert!(!shutdown.is_triggered());
        }
        assert!(shutdown.is_triggered());
    }

    #[test]
    fn test_guard_triggers_on_panic() {
        let shutdown = Shutdown::new();
        let inner = shutdown.clone();

        let result = std::thread::spawn(move || {
            let _guard = inner.guard();
            panic!("worker blew up");
        })
        .join();

        assert!(result.is_err());
        assert!(shutdown.is_triggered());
    }
}
