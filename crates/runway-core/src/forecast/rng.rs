//! Seedable pseudo-random source
//!
//! xorshift64* state seeded through splitmix64, with a Box-Muller normal
//! sampler. Each simulated path derives its own generator from
//! `(seed, stream)` so results do not depend on how paths are sharded.

use std::f64::consts::PI;

/// Source of uniform and normal draws
pub trait RandomSource {
    /// Uniform draw in the open interval (0, 1)
    fn next_f64(&mut self) -> f64;

    /// Normal draw via the Box-Muller transform
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64;
}

pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Mix a base seed with a stream index (e.g. the simulated path number)
pub fn derive_seed(base_seed: u64, stream: u64) -> u64 {
    splitmix64(base_seed ^ stream.wrapping_mul(0xD1B54A32D192ED03))
}

#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
    cached_normal: Option<f64>,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        let state = splitmix64(seed);
        // xorshift must never hold a zero state
        let state = if state == 0 {
            0xA5A5_A5A5_A5A5_A5A5
        } else {
            state
        };
        Self {
            state,
            cached_normal: None,
        }
    }

    /// Generator for an independent stream of the same base seed
    pub fn for_stream(base_seed: u64, stream: u64) -> Self {
        Self::new(derive_seed(base_seed, stream))
    }

    /// Seed from the wall clock, for callers that did not ask for reproducibility
    pub fn from_entropy() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x5EED);
        Self::new(nanos)
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.cached_normal.take() {
            return z;
        }

        let u1 = self.next_f64().max(1e-12);
        let u2 = self.next_f64();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * PI * u2;

        self.cached_normal = Some(r * theta.sin());
        r * theta.cos()
    }
}

impl RandomSource for SeededRng {
    fn next_f64(&mut self) -> f64 {
        const DENOM: f64 = (1_u64 << 53) as f64;
        let v = self.next_u64() >> 11;
        ((v as f64) + 0.5) / DENOM
    }

    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        mean + std_dev * self.standard_normal()
    }
}
