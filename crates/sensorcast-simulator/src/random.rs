use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform floats in `[0, 1)` driving the random walk.
///
/// Injected at construction so tests can replace entropy with a seeded or
/// scripted sequence.
pub trait RandomSource: Send {
    fn next_uniform(&mut self) -> f64;
}

impl RandomSource for StdRng {
    fn next_uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Entropy-seeded production source.
pub fn from_entropy() -> StdRng {
    StdRng::from_entropy()
}

/// Replays a fixed sequence of draws, wrapping around at the end.
///
/// Values are clamped into `[0, 1)` on construction.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(draws: impl Into<Vec<f64>>) -> Self {
        let draws = draws
            .into()
            .into_iter()
            .map(|d| d.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { draws, cursor: 0 }
    }

    /// Every draw returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for ScriptedRandom {
    fn next_uniform(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let draw = self.draws[self.cursor % self.draws.len()];
        self.cursor = self.cursor.wrapping_add(1);
        draw
    }
}
