use rand::rngs::StdRng;
use tracing::debug;

use crate::{
    error::{ConfigError, Result},
    random::{self, RandomSource},
};

/// Width of the symmetric range a momentum perturbation is drawn from.
pub const DRIFT_WIDTH: f64 = 0.5;

/// Immutable parameters for one simulator instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    pub initial: f64,
    pub min: f64,
    pub max: f64,
    pub max_delta_per_sec: f64,
    pub drift_probability: f64,
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<()> {
        for (field, v) in [
            ("initial", self.initial),
            ("min", self.min),
            ("max", self.max),
            ("max_delta_per_sec", self.max_delta_per_sec),
            ("drift_probability", self.drift_probability),
        ] {
            if !v.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }
        if self.min >= self.max {
            return Err(ConfigError::InvalidBounds {
                min: self.min,
                max: self.max,
            });
        }
        if self.initial < self.min || self.initial > self.max {
            return Err(ConfigError::InitialOutOfRange {
                initial: self.initial,
                min: self.min,
                max: self.max,
            });
        }
        if self.max_delta_per_sec <= 0.0 {
            return Err(ConfigError::NonPositiveDelta(self.max_delta_per_sec));
        }
        if !(0.0..=1.0).contains(&self.drift_probability) {
            return Err(ConfigError::ProbabilityOutOfRange(self.drift_probability));
        }
        Ok(())
    }
}

/// Bounded random walk with momentum.
///
/// `value` always stays inside `[min, max]`; `direction` always stays inside
/// `[-1, 1]`. Mutation requires `&mut self`, so a simulator can only ever be
/// advanced from one place at a time.
pub struct DriftSimulator<R: RandomSource = StdRng> {
    config: SimulatorConfig,
    value: f64,
    direction: f64,
    random: R,
}

impl DriftSimulator<StdRng> {
    /// Build a simulator backed by an entropy-seeded RNG.
    pub fn with_entropy(config: SimulatorConfig) -> Result<Self> {
        Self::new(config, random::from_entropy())
    }
}

impl<R: RandomSource> DriftSimulator<R> {
    /// Validate `config` and pick a starting direction of +1 or -1.
    pub fn new(config: SimulatorConfig, mut random: R) -> Result<Self> {
        config.validate()?;
        let direction = if random.next_uniform() < 0.5 { -1.0 } else { 1.0 };
        debug!(
            initial = config.initial,
            min = config.min,
            max = config.max,
            direction,
            "drift simulator created"
        );
        Ok(Self {
            config,
            value: config.initial,
            direction,
            random,
        })
    }

    /// Override the starting momentum (clamped to `[-1, 1]`).
    pub fn with_direction(mut self, direction: f64) -> Self {
        if direction.is_finite() {
            self.direction = direction.clamp(-1.0, 1.0);
        }
        self
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn direction(&self) -> f64 {
        self.direction
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Step the walk forward by `dt_seconds` and return the new value.
    ///
    /// A non-finite `dt_seconds` leaves the state untouched.
    pub fn advance(&mut self, dt_seconds: f64) -> f64 {
        if !dt_seconds.is_finite() {
            return self.value;
        }

        if self.random.next_uniform() < self.config.drift_probability {
            self.direction += (self.random.next_uniform() - 0.5) * DRIFT_WIDTH;
        }
        self.direction = self.direction.clamp(-1.0, 1.0);

        self.value += self.direction * self.config.max_delta_per_sec * dt_seconds;

        // clamp and reflect momentum away from the bound that was crossed
        if self.value > self.config.max {
            self.value = self.config.max;
            self.direction = -self.direction.abs();
        } else if self.value < self.config.min {
            self.value = self.config.min;
            self.direction = self.direction.abs();
        }

        self.value
    }
}
