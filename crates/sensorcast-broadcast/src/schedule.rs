use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Work run on every tick. Must not block.
pub type TickTask = Box<dyn FnMut() + Send + 'static>;

/// Fixed-period clock that drives tick tasks.
pub trait Scheduler {
    /// Run `task` every `period` until the returned handle is cancelled or dropped.
    fn schedule(&self, period: Duration, task: TickTask) -> CancelHandle;
}

/// Stops a scheduled task. Only future ticks are prevented; a tick that is
/// already running completes.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, rx)
    }

    pub fn cancel(&self) {
        // send_replace stores the flag even when the task has already exited
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Production scheduler: one Tokio task per schedule with a fixed-delay interval.
///
/// Must be used from within a Tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, period: Duration, mut task: TickTask) -> CancelHandle {
        let period = period.max(Duration::from_millis(1));
        let (handle, mut cancelled) = CancelHandle::new();

        tokio::spawn(async move {
            // first fire one full period after start
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    changed = cancelled.changed() => {
                        // Err means the handle was dropped
                        let stop = changed.is_err() || *cancelled.borrow();
                        if stop {
                            break;
                        }
                    }
                    _ = interval.tick() => task(),
                }
            }
            debug!(period_ms = period.as_millis() as u64, "cadence task stopped");
        });

        handle
    }
}

struct ManualTask {
    cancelled: watch::Receiver<bool>,
    task: TickTask,
}

impl ManualTask {
    fn is_live(&self) -> bool {
        self.cancelled.has_changed().is_ok() && !*self.cancelled.borrow()
    }
}

/// Test scheduler: tasks only run when [`ManualScheduler::fire`] is called.
///
/// Periods are recorded but ignored; every `fire` runs each live task once,
/// synchronously, in registration order.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    tasks: Arc<Mutex<Vec<ManualTask>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every live task once. Returns how many tasks ran.
    pub fn fire(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.retain(ManualTask::is_live);
        for t in tasks.iter_mut() {
            (t.task)();
        }
        tasks.len()
    }

    /// Fire `n` times in a row.
    pub fn fire_n(&self, n: usize) {
        for _ in 0..n {
            self.fire();
        }
    }

    /// Number of tasks that have not been cancelled.
    pub fn live_tasks(&self) -> usize {
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.iter().filter(|t| t.is_live()).count()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, _period: Duration, task: TickTask) -> CancelHandle {
        let (handle, cancelled) = CancelHandle::new();
        self.tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ManualTask { cancelled, task });
        handle
    }
}
