//! Periodic liveness probing tied to a guard's lifetime.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{FrameSourceAdapter, Liveness};

/// Spawns the periodic probe task for a mounted live view.
pub struct LivenessMonitor;

impl LivenessMonitor {
    /// Starts probing immediately and then every `interval`.
    pub fn start(adapter: Arc<FrameSourceAdapter>, interval: Duration) -> LivenessGuard {
        Self::start_with(adapter, interval, |_| {})
    }

    /// Starts probing and reports every result to `on_probe`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_with<F>(
        adapter: Arc<FrameSourceAdapter>,
        interval: Duration,
        on_probe: F,
    ) -> LivenessGuard
    where
        F: Fn(Liveness) + Send + 'static,
    {
        let token = CancellationToken::new();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let liveness = tokio::select! {
                            _ = task_token.cancelled() => break,
                            liveness = adapter.probe() => liveness,
                        };
                        on_probe(liveness);
                    }
                }
            }

            debug!("liveness monitor stopped");
        });

        LivenessGuard {
            token,
            handle: Some(handle),
        }
    }
}

/// Owns the probe task; dropping it cancels probing.
pub struct LivenessGuard {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl LivenessGuard {
    /// Cancels probing and waits for the task to finish.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Returns `true` until cancellation is requested.
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for LivenessGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
