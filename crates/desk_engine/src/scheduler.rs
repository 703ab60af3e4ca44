use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Work run once when a scheduled delay elapses.
pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

/// Defers work. Cancelling a handle guarantees its task has not run and never will,
/// unless it already started.
pub trait Scheduler: Send + Sync {
    fn schedule_after(&self, delay: Duration, task: ScheduledTask) -> CancelHandle;
}

#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Runs each task on a tokio runtime after its delay.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: ScheduledTask) -> CancelHandle {
        let cancel = CancelHandle::new();
        let token = cancel.token();
        self.handle.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if !token.is_cancelled() {
                        task();
                    }
                }
            }
        });
        cancel
    }
}
