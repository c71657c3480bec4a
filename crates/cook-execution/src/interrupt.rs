//! User interrupts (Ctrl-C) as an awaitable signal.

use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Shared interrupt signal.
///
/// An interrupt raised while nobody is waiting is kept and wakes the next
/// waiter, so a Ctrl-C between two suspension points is not lost.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    notify: Arc<Notify>,
}

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises an interrupt.
    pub fn trigger(&self) {
        self.notify.notify_one();
    }

    /// Completes at the next interrupt.
    pub async fn cancelled(&self) {
        self.notify.notified().await;
    }

    /// Drops an interrupt that nobody has consumed yet.
    pub fn clear(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Consumes a stored permit if there is one; otherwise registers and
        // immediately deregisters on drop.
        notified.as_mut().enable();
    }

    /// Forwards every Ctrl-C to this handle until the process exits.
    pub fn listen_for_ctrl_c(&self) -> JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
                    break;
                }
                tracing::debug!("Ctrl-C received");
                handle.trigger();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_waiter() {
        let handle = InterruptHandle::new();
        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.cancelled().await })
        };
        tokio::task::yield_now().await;
        handle.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_interrupt_without_waiter_is_kept() {
        let handle = InterruptHandle::new();
        handle.trigger();
        tokio::time::timeout(Duration::from_millis(100), handle.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_clear_discards_pending_interrupt() {
        let handle = InterruptHandle::new();
        handle.trigger();
        handle.clear();
        assert!(
            tokio::time::timeout(Duration::from_millis(50), handle.cancelled())
                .await
                .is_err()
        );
    }
}
