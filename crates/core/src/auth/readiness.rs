//! Authentication readiness signal
//!
//! A tri-state cell (unknown, authenticated, unauthenticated) with
//! debounced, de-duplicated observation. Writers are the startup probe,
//! token store and token clear. Observers only ever see settled boolean
//! values, each one different from the last they saw.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, Stream};
use gcal_domain::Readiness;
use tokio::sync::watch;
use tracing::debug;

/// Shared writer side of the readiness cell.
#[derive(Debug, Clone)]
pub struct ReadinessSignal {
    tx: Arc<watch::Sender<Readiness>>,
    debounce: Duration,
}

impl ReadinessSignal {
    /// New signal in the [`Readiness::Unknown`] state.
    pub fn new(debounce: Duration) -> Self {
        let (tx, _rx) = watch::channel(Readiness::Unknown);
        Self { tx: Arc::new(tx), debounce }
    }

    /// Current undebounced value.
    pub fn current(&self) -> Readiness {
        *self.tx.borrow()
    }

    /// Unconditionally resolve the signal.
    pub fn set(&self, ready: bool) {
        let next = Readiness::from_ready(ready);
        let changed = self.tx.send_if_modified(|value| {
            if *value == next {
                false
            } else {
                *value = next;
                true
            }
        });
        if changed {
            debug!(readiness = ?next, "Readiness changed");
        }
    }

    /// Resolve the signal only if nothing else has resolved it yet.
    ///
    /// Returns whether the write happened. The check and the write are one
    /// atomic step on the cell.
    pub fn resolve_initial(&self, ready: bool) -> bool {
        let written = self.tx.send_if_modified(|value| {
            if value.is_resolved() {
                false
            } else {
                *value = Readiness::from_ready(ready);
                true
            }
        });
        if written {
            debug!(ready, "Readiness resolved by startup probe");
        } else {
            debug!("Startup probe result discarded; readiness already resolved");
        }
        written
    }

    /// New observer.
    pub fn subscribe(&self) -> ReadinessSubscription {
        ReadinessSubscription {
            rx: self.tx.subscribe(),
            debounce: self.debounce,
            primed: false,
            last: None,
        }
    }
}

/// Debounced, distinct view of a [`ReadinessSignal`].
#[derive(Debug)]
pub struct ReadinessSubscription {
    rx: watch::Receiver<Readiness>,
    debounce: Duration,
    primed: bool,
    last: Option<bool>,
}

impl ReadinessSubscription {
    /// Wait for the next settled value that differs from the previous one.
    ///
    /// The first call considers the value current at subscription time.
    /// Returns `None` once every writer is gone and no further change can
    /// arrive.
    pub async fn next(&mut self) -> Option<bool> {
        loop {
            if self.primed {
                self.rx.changed().await.ok()?;
            } else {
                self.primed = true;
                let _ = self.rx.borrow_and_update();
            }

            // Restart the quiet window on every change.
            loop {
                match tokio::time::timeout(self.debounce, self.rx.changed()).await {
                    Ok(Ok(())) => continue,
                    Ok(Err(_)) | Err(_) => break,
                }
            }

            let settled = self.rx.borrow_and_update().as_bool();
            if let Some(ready) = settled {
                if self.last != Some(ready) {
                    self.last = Some(ready);
                    return Some(ready);
                }
            }
        }
    }

    /// Adapt into a [`Stream`] of settled values.
    pub fn into_stream(self) -> impl Stream<Item = bool> {
        stream::unfold(self, |mut sub| async move { sub.next().await.map(|ready| (ready, sub)) })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::readiness.
    use futures::StreamExt;

    use super::*;

    fn signal() -> ReadinessSignal {
        ReadinessSignal::new(Duration::from_millis(100))
    }

    /// Validates `ReadinessSignal::resolve_initial` behavior for the startup
    /// race scenario.
    ///
    /// Assertions:
    /// - Ensures the first initial write lands on an unknown signal.
    /// - Ensures an initial write after an explicit `set` is discarded.
    #[test]
    fn test_resolve_initial_only_when_unknown() {
        let fresh = signal();
        assert!(fresh.resolve_initial(true));
        assert_eq!(fresh.current(), Readiness::Authenticated);

        let raced = signal();
        raced.set(false);
        assert!(!raced.resolve_initial(true));
        assert_eq!(raced.current(), Readiness::Unauthenticated);
    }

    /// Validates debouncing of rapid flips.
    ///
    /// Assertions:
    /// - Ensures a burst of changes inside the window yields only the final
    ///   value.
    #[tokio::test(start_paused = true)]
    async fn test_rapid_flips_collapse_to_last_value() {
        let signal = signal();
        let mut sub = signal.subscribe();

        signal.set(true);
        signal.set(false);
        signal.set(true);

        assert_eq!(sub.next().await, Some(true));
    }

    /// Validates de-duplication of repeated values.
    ///
    /// Assertions:
    /// - Ensures flipping away and back within the window emits nothing new.
    /// - Ensures a genuine change after that is observed.
    #[tokio::test(start_paused = true)]
    async fn test_repeated_values_are_not_re_emitted() {
        let signal = signal();
        let mut sub = signal.subscribe();

        signal.set(true);
        assert_eq!(sub.next().await, Some(true));

        signal.set(false);
        signal.set(true);
        let pending = tokio::time::timeout(Duration::from_millis(500), sub.next()).await;
        assert!(pending.is_err());

        signal.set(false);
        assert_eq!(sub.next().await, Some(false));
    }

    /// Validates that unknown is never surfaced to observers.
    ///
    /// Assertions:
    /// - Ensures a subscriber on an unknown signal waits for resolution.
    /// - Ensures the stream adapter yields the resolved value.
    #[tokio::test(start_paused = true)]
    async fn test_unknown_is_not_emitted() {
        let signal = signal();
        let mut stream = Box::pin(signal.subscribe().into_stream());

        let writer = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            writer.set(false);
        });

        assert_eq!(stream.next().await, Some(false));
    }

    /// Validates that a subscription ends when every writer is dropped.
    ///
    /// Assertions:
    /// - Ensures the settled value is delivered before the end.
    /// - Ensures `next` then returns `None`.
    #[tokio::test(start_paused = true)]
    async fn test_subscription_ends_with_writers() {
        let signal = signal();
        let mut sub = signal.subscribe();
        signal.set(true);
        drop(signal);

        assert_eq!(sub.next().await, Some(true));
        assert_eq!(sub.next().await, None);
    }
}
