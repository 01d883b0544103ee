//! `sensorcast-broadcast` — fixed-cadence fan-out of simulated readings.
//!
//! # Overview
//!
//! A [`Broadcaster`] owns one [`DriftSimulator`](sensorcast_simulator::DriftSimulator)
//! and a sequence counter. On every tick it advances the simulator, renders
//! the resulting [`BroadcastEvent`] through a [`Renderer`], snapshots the
//! current subscriber set from a [`Transport`], and pushes the message to
//! every open subscriber without waiting on any of them.
//!
//! | Seam            | Production                 | Tests                      |
//! |-----------------|----------------------------|----------------------------|
//! | [`Scheduler`]   | [`TokioScheduler`]         | [`ManualScheduler`]        |
//! | [`Transport`]   | [`SubscriberRegistry`]     | registry or custom impls   |
//! | [`Renderer`]    | [`Template`]               | failing renderers          |
//! | [`TickObserver`]| [`TracingObserver`]        | recording observers        |

pub mod broadcaster;
pub mod error;
pub mod event;
pub mod observer;
pub mod schedule;
pub mod subscriber;
pub mod template;

pub use broadcaster::{BroadcastConfig, BroadcastHandle, Broadcaster, TickOutcome, TickReport};
pub use error::{BroadcastError, DeliveryError, RenderError, TemplateError};
pub use event::BroadcastEvent;
pub use observer::{TickObserver, TracingObserver};
pub use schedule::{CancelHandle, ManualScheduler, Scheduler, TickTask, TokioScheduler};
pub use subscriber::{ChannelSubscriber, Subscriber, SubscriberRegistry, Transport, DEFAULT_QUEUE_DEPTH};
pub use template::{Renderer, Template, DEFAULT_TEMPLATE};
