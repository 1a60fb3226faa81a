//! Tokio-backed timer scheduler and clock
use recital_core::traits::{Clock, Scheduler};
use recital_core::types::TimerToken;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Scheduler that sleeps on the tokio runtime
///
/// Fired tokens are delivered on the receiver returned by [`TokioScheduler::new`].
/// Must be used from inside a runtime.
#[derive(Debug)]
pub struct TokioScheduler {
    fired: mpsc::UnboundedSender<TimerToken>,
    timers: HashMap<TimerToken, JoinHandle<()>>,
}

impl TokioScheduler {
    /// Create a scheduler and the receiver its firings arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerToken>) {
        let (fired, rx) = mpsc::unbounded_channel();
        (
            Self {
                fired,
                timers: HashMap::new(),
            },
            rx,
        )
    }

    /// Number of timers that have not fired or been cancelled
    pub fn pending(&self) -> usize {
        self.timers
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration, token: TimerToken) {
        self.timers.retain(|_, handle| !handle.is_finished());

        let fired = self.fired.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the session is shutting down
            let _ = fired.send(token);
        });

        if let Some(previous) = self.timers.insert(token, handle) {
            previous.abort();
        }
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some(handle) = self.timers.remove(&token) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for handle in self.timers.values() {
            handle.abort();
        }
    }
}

/// Clock that follows tokio's (pausable) time
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}
