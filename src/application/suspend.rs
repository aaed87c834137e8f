//! Cancellable suspension.

use crate::domain::error::Cancelled;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleep for `duration` unless `cancel` fires first.
///
/// An already-cancelled token returns immediately without sleeping.
pub async fn cancellable_sleep(duration: Duration, cancel: &CancellationToken) -> Result<(), Cancelled> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes() {
        let cancel = CancellationToken::new();
        let start = Instant::now();

        assert_eq!(cancellable_sleep(Duration::from_millis(100), &cancel).await, Ok(()));
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_cancelled_midway() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        assert_eq!(
            cancellable_sleep(Duration::from_secs(5), &cancel).await,
            Err(Cancelled)
        );
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_already_cancelled_returns_immediately() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let start = Instant::now();
        assert_eq!(
            cancellable_sleep(Duration::from_secs(5), &cancel).await,
            Err(Cancelled)
        );
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
