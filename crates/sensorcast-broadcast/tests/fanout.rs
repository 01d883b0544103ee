// Fan-out behaviour of the broadcaster, driven synchronously through
// ManualScheduler and direct tick() calls.

use std::sync::{Arc, Mutex};

use rand::{rngs::StdRng, SeedableRng};
use sensorcast_broadcast::{
    BroadcastConfig, BroadcastError, BroadcastEvent, Broadcaster, DeliveryError, ManualScheduler,
    RenderError, Renderer, Subscriber, SubscriberRegistry, Template, TickObserver, TickOutcome,
    Transport, DEFAULT_TEMPLATE,
};
use sensorcast_simulator::{DriftSimulator, ScriptedRandom, SimulatorConfig};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingObserver {
    no_listeners: Mutex<Vec<String>>,
    render_failures: Mutex<u64>,
    delivery_failures: Mutex<Vec<DeliveryError>>,
}

impl TickObserver for RecordingObserver {
    fn no_listeners(&self, _event: &BroadcastEvent, message: &str) {
        self.no_listeners.lock().unwrap().push(message.to_string());
    }
    fn render_failed(&self, _event: &BroadcastEvent, _error: &RenderError) {
        *self.render_failures.lock().unwrap() += 1;
    }
    fn delivery_failed(&self, _event: &BroadcastEvent, error: &DeliveryError) {
        self.delivery_failures.lock().unwrap().push(error.clone());
    }
}

struct AlwaysFail;

impl Subscriber for AlwaysFail {
    fn id(&self) -> &str {
        "always-fail"
    }
    fn is_open(&self) -> bool {
        true
    }
    fn send(&self, _message: &str) -> Result<(), DeliveryError> {
        Err(DeliveryError::Failed {
            id: "always-fail".into(),
            reason: "socket reset".into(),
        })
    }
}

#[derive(Default)]
struct Recording {
    received: Mutex<Vec<String>>,
}

impl Subscriber for Recording {
    fn id(&self) -> &str {
        "recording"
    }
    fn is_open(&self) -> bool {
        true
    }
    fn send(&self, message: &str) -> Result<(), DeliveryError> {
        self.received.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

struct FixedTransport(Vec<Arc<dyn Subscriber>>);

impl Transport for FixedTransport {
    fn subscribers(&self) -> Vec<Arc<dyn Subscriber>> {
        self.0.clone()
    }
}

struct BrokenRenderer;

impl Renderer for BrokenRenderer {
    fn render(&self, _payload: &Map<String, Value>) -> Result<String, RenderError> {
        Err(RenderError::Failed("template engine offline".into()))
    }
}

fn room_simulator(drift_probability: f64) -> DriftSimulator<StdRng> {
    let cfg = SimulatorConfig {
        initial: 21.0,
        min: 18.0,
        max: 26.0,
        max_delta_per_sec: 0.02,
        drift_probability,
    };
    DriftSimulator::new(cfg, StdRng::seed_from_u64(42)).unwrap()
}

fn config(period_ms: u64) -> BroadcastConfig {
    BroadcastConfig {
        period_ms,
        source_label: "ExampleSensor".into(),
    }
}

fn default_renderer() -> Arc<dyn Renderer> {
    Arc::new(Template::compile(DEFAULT_TEMPLATE).unwrap())
}

fn count_of(message: &str) -> u64 {
    let v: Value = serde_json::from_str(message).unwrap();
    v["count"].as_u64().unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn zero_subscribers_emit_one_diagnostic_and_still_count() {
    let observer = Arc::new(RecordingObserver::default());
    let registry = Arc::new(SubscriberRegistry::default());
    let mut b = Broadcaster::new(room_simulator(0.1), default_renderer(), registry, config(1000))
        .unwrap()
        .with_observer(observer.clone());

    let report = b.tick();
    assert_eq!(report.sequence, 1);
    assert_eq!(report.outcome, TickOutcome::NoListeners);
    assert_eq!(b.sequence(), 1);

    let diagnostics = observer.no_listeners.lock().unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(count_of(&diagnostics[0]), 1);
}

#[test]
fn sequence_equals_ticks_despite_failures() {
    let observer = Arc::new(RecordingObserver::default());
    let transport = Arc::new(FixedTransport(vec![Arc::new(AlwaysFail) as Arc<dyn Subscriber>]));
    let mut b = Broadcaster::new(room_simulator(0.5), Arc::new(BrokenRenderer), transport, config(1000))
        .unwrap()
        .with_observer(observer.clone());

    for _ in 0..10 {
        assert_eq!(b.tick().outcome, TickOutcome::RenderFailed);
    }
    assert_eq!(b.sequence(), 10);
    assert_eq!(*observer.render_failures.lock().unwrap(), 10);
    // render failure skips the send step entirely
    assert!(observer.delivery_failures.lock().unwrap().is_empty());
}

#[test]
fn failing_subscriber_does_not_block_others() {
    let observer = Arc::new(RecordingObserver::default());
    let good = Arc::new(Recording::default());
    let good_dyn: Arc<dyn Subscriber> = good.clone();
    let transport = Arc::new(FixedTransport(vec![
        Arc::new(AlwaysFail) as Arc<dyn Subscriber>,
        good_dyn,
        Arc::new(AlwaysFail) as Arc<dyn Subscriber>,
    ]));
    let mut b = Broadcaster::new(room_simulator(0.0), default_renderer(), transport, config(500))
        .unwrap()
        .with_observer(observer.clone());

    let report = b.tick();
    assert_eq!(
        report.outcome,
        TickOutcome::Delivered {
            sent: 1,
            skipped: 0,
            failed: 2
        }
    );
    assert_eq!(good.received.lock().unwrap().len(), 1);
    assert_eq!(observer.delivery_failures.lock().unwrap().len(), 2);
}

#[test]
fn late_joiner_gets_only_the_next_tick() {
    let scheduler = ManualScheduler::new();
    let registry = Arc::new(SubscriberRegistry::new(8));
    let b = Broadcaster::new(room_simulator(0.2), default_renderer(), registry.clone(), config(1000))
        .unwrap();
    let handle = b.start(&scheduler);

    scheduler.fire_n(2);
    assert_eq!(handle.sequence(), 2);

    let mut rx = registry.connect("late");
    assert!(rx.try_recv().is_err(), "nothing is replayed to a late joiner");

    scheduler.fire();
    let message = rx.try_recv().unwrap();
    assert_eq!(count_of(&message), 3);
    assert!(rx.try_recv().is_err());
}

#[test]
fn closed_subscriber_is_skipped_without_error() {
    let observer = Arc::new(RecordingObserver::default());
    let registry = Arc::new(SubscriberRegistry::new(8));
    let gone = registry.connect("gone");
    let mut alive = registry.connect("alive");
    drop(gone);

    let mut b = Broadcaster::new(room_simulator(0.0), default_renderer(), registry.clone(), config(1000))
        .unwrap()
        .with_observer(observer.clone());

    let report = b.tick();
    assert_eq!(
        report.outcome,
        TickOutcome::Delivered {
            sent: 1,
            skipped: 1,
            failed: 0
        }
    );
    assert!(observer.delivery_failures.lock().unwrap().is_empty());
    assert_eq!(count_of(&alive.try_recv().unwrap()), 1);
}

#[test]
fn slow_subscriber_never_delays_fast_one() {
    let observer = Arc::new(RecordingObserver::default());
    let registry = Arc::new(SubscriberRegistry::new(1));
    let _slow = registry.connect("slow"); // never drained
    let mut fast = registry.connect("fast");

    let mut b = Broadcaster::new(room_simulator(0.0), default_renderer(), registry.clone(), config(1000))
        .unwrap()
        .with_observer(observer.clone());

    for expected in 1..=3 {
        b.tick();
        assert_eq!(count_of(&fast.try_recv().unwrap()), expected);
    }
    let failures = observer.delivery_failures.lock().unwrap();
    assert_eq!(failures.len(), 2);
    assert!(failures
        .iter()
        .all(|e| *e == DeliveryError::Lagging { id: "slow".into() }));
}

#[test]
fn stop_halts_future_ticks() {
    let scheduler = ManualScheduler::new();
    let registry = Arc::new(SubscriberRegistry::default());
    let handle = Broadcaster::new(room_simulator(0.0), default_renderer(), registry, config(1000))
        .unwrap()
        .start(&scheduler);

    scheduler.fire_n(4);
    handle.stop();
    assert!(handle.is_stopped());
    scheduler.fire_n(4);
    assert_eq!(handle.sequence(), 4);
    assert_eq!(handle.source_label(), "ExampleSensor");
}

#[test]
fn period_drives_simulated_time() {
    let cfg = SimulatorConfig {
        initial: 21.0,
        min: 18.0,
        max: 26.0,
        max_delta_per_sec: 0.02,
        drift_probability: 0.0,
    };
    let sim = DriftSimulator::new(cfg, ScriptedRandom::constant(0.9))
        .unwrap()
        .with_direction(1.0);
    let registry = Arc::new(SubscriberRegistry::default());
    let mut b = Broadcaster::new(sim, default_renderer(), registry, config(1000)).unwrap();

    let report = b.tick();
    assert!((report.value - 21.02).abs() < 1e-9);

    for _ in 0..1_000 {
        let v = b.tick().value;
        assert!(v <= 26.0 && v >= 18.0);
    }
}

#[test]
fn zero_period_is_rejected() {
    let registry = Arc::new(SubscriberRegistry::default());
    let err = Broadcaster::new(room_simulator(0.0), default_renderer(), registry, config(0))
        .err()
        .unwrap();
    assert!(matches!(err, BroadcastError::ZeroPeriod));
}

#[test]
fn values_stay_bounded_across_many_ticks() {
    let registry = Arc::new(SubscriberRegistry::new(4096));
    let mut rx = registry.connect("probe");
    let mut b = Broadcaster::new(room_simulator(1.0), default_renderer(), registry.clone(), config(60_000))
        .unwrap();

    for _ in 0..2_000 {
        b.tick();
        let message = rx.try_recv().unwrap();
        let v: Value = serde_json::from_str(&message).unwrap();
        let value = v["value"].as_f64().unwrap();
        assert!((18.0..=26.0).contains(&value), "out of bounds: {value}");
        assert_eq!(v["sensor"], "ExampleSensor");
    }
}
