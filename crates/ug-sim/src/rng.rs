//! ---
//! ug_section: "11-simulation"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Injectable random sources for reproducible ticks."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform random draws in `[0, 1)` consumed by the sensor update algorithm.
pub trait RandomSource: Send {
    fn next_unit(&mut self) -> f64;
}

/// `StdRng`-backed source, seeded for reproducible runs or from OS entropy.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed script of draws, then repeats `fallback` forever.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    script: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRandom {
    pub fn new(script: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback,
        }
    }

    /// A source that never fluctuates, never spikes, and never emits anomalies.
    pub fn quiet() -> Self {
        Self::new(std::iter::empty(), 0.5)
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        self.script.pop_front().unwrap_or(self.fallback)
    }
}
