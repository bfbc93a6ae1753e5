//! Injectable randomness for the simulated workloads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform samples in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

/// `StdRng` behind a mutex; seeded for reproducible runs, entropy otherwise.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng: Mutex::new(rng) }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&self) -> f64 {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).gen::<f64>()
    }
}

/// Replays a fixed sequence, wrapping around at the end.
///
/// Values are clamped into `[0, 1)`; an empty script always yields `0.0`.
pub struct ScriptedRandom {
    values: Vec<f64>,
    pos: AtomicUsize,
}

impl ScriptedRandom {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            pos: AtomicUsize::new(0),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let i = self.pos.fetch_add(1, Ordering::Relaxed) % self.values.len();
        let v = self.values.get(i).copied().unwrap_or(0.0);
        v.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
