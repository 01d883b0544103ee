use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use chrono::Utc;
use sensorcast_simulator::{DriftSimulator, RandomSource};
use tracing::{debug, info};

use crate::{
    error::BroadcastError,
    event::BroadcastEvent,
    observer::{TickObserver, TracingObserver},
    schedule::{CancelHandle, Scheduler},
    subscriber::Transport,
    template::Renderer,
};

/// Cadence and labelling for one broadcaster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastConfig {
    pub period_ms: u64,
    /// Published as the `sensor` template key.
    pub source_label: String,
}

impl BroadcastConfig {
    pub fn validate(&self) -> Result<(), BroadcastError> {
        if self.period_ms == 0 {
            return Err(BroadcastError::ZeroPeriod);
        }
        if self.source_label.trim().is_empty() {
            return Err(BroadcastError::EmptySourceLabel);
        }
        Ok(())
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Simulated seconds that elapse per tick.
    pub fn dt_seconds(&self) -> f64 {
        self.period_ms as f64 / 1000.0
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Rendering failed; nothing was sent.
    RenderFailed,
    /// The subscriber snapshot was empty; the message went to the observer.
    NoListeners,
    /// Fan-out ran over a non-empty snapshot.
    Delivered {
        sent: usize,
        /// Subscribers already closed when their turn came.
        skipped: usize,
        failed: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub sequence: u64,
    pub value: f64,
    pub outcome: TickOutcome,
}

/// Drives one simulator on a fixed cadence and fans each rendered sample
/// out to the current subscriber set.
pub struct Broadcaster<R: RandomSource> {
    config: BroadcastConfig,
    simulator: DriftSimulator<R>,
    renderer: Arc<dyn Renderer>,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn TickObserver>,
    sequence: Arc<AtomicU64>,
}

impl<R: RandomSource + 'static> Broadcaster<R> {
    pub fn new(
        simulator: DriftSimulator<R>,
        renderer: Arc<dyn Renderer>,
        transport: Arc<dyn Transport>,
        config: BroadcastConfig,
    ) -> Result<Self, BroadcastError> {
        config.validate()?;
        Ok(Self {
            config,
            simulator,
            renderer,
            transport,
            observer: Arc::new(TracingObserver),
            sequence: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Replace the default [`TracingObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn TickObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Number of ticks run so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Run one tick: advance, render, snapshot, fan out.
    ///
    /// Never fails. Render and delivery problems are reported to the
    /// observer and reflected in the returned report; the sequence number
    /// has already advanced by then and is never rolled back.
    pub fn tick(&mut self) -> TickReport {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let value = self.simulator.advance(self.config.dt_seconds());

        let event = BroadcastEvent {
            sequence,
            timestamp: Utc::now(),
            source_label: self.config.source_label.clone(),
            value,
        };

        let message = match self.renderer.render(&event.payload()) {
            Ok(m) => m,
            Err(e) => {
                self.observer.render_failed(&event, &e);
                return TickReport {
                    sequence,
                    value,
                    outcome: TickOutcome::RenderFailed,
                };
            }
        };

        let subscribers = self.transport.subscribers();
        if subscribers.is_empty() {
            self.observer.no_listeners(&event, &message);
            return TickReport {
                sequence,
                value,
                outcome: TickOutcome::NoListeners,
            };
        }

        let (mut sent, mut skipped, mut failed) = (0, 0, 0);
        for subscriber in &subscribers {
            if !subscriber.is_open() {
                debug!(conn_id = %subscriber.id(), count = sequence, "subscriber closed, skipped");
                skipped += 1;
                continue;
            }
            match subscriber.send(&message) {
                Ok(()) => sent += 1,
                Err(e) => {
                    self.observer.delivery_failed(&event, &e);
                    failed += 1;
                }
            }
        }

        debug!(
            sensor = %self.config.source_label,
            count = sequence,
            value,
            sent,
            skipped,
            failed,
            "tick broadcast"
        );

        TickReport {
            sequence,
            value,
            outcome: TickOutcome::Delivered {
                sent,
                skipped,
                failed,
            },
        }
    }

    /// Hand the broadcaster to `scheduler`, ticking every `period_ms`.
    pub fn start<S: Scheduler + ?Sized>(mut self, scheduler: &S) -> BroadcastHandle {
        let sequence = Arc::clone(&self.sequence);
        let source_label = self.config.source_label.clone();
        let period = self.config.period();
        info!(
            sensor = %source_label,
            period_ms = self.config.period_ms,
            "broadcaster started"
        );
        let cancel = scheduler.schedule(
            period,
            Box::new(move || {
                self.tick();
            }),
        );
        BroadcastHandle {
            cancel,
            sequence,
            source_label,
        }
    }
}

/// Control handle for a running broadcaster. Dropping it stops the cadence.
#[derive(Debug)]
pub struct BroadcastHandle {
    cancel: CancelHandle,
    sequence: Arc<AtomicU64>,
    source_label: String,
}

impl BroadcastHandle {
    /// Prevent future ticks. Messages already queued to subscribers are not recalled.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!(sensor = %self.source_label, count = self.sequence(), "broadcaster stopped");
        }
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Ticks run so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    pub fn source_label(&self) -> &str {
        &self.source_label
    }
}
