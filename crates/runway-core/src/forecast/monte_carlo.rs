//! Monte Carlo risk simulation
//!
//! Each path starts at the first forecast value and compounds a normally
//! distributed return for every remaining step. Paths draw from their own
//! generator derived from `(seed, path_index)`, so the outcome for a given
//! seed is the same whether the paths run on one thread or many.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::confidence::{mean, volatility};
use super::rng::{RandomSource, SeededRng};
use super::types::{MonteCarloResult, Percentiles};

/// Default number of simulated paths
pub const DEFAULT_SIMULATIONS: usize = 10_000;

/// Caps on simulation work for interactive callers
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationBudget {
    /// Upper bound on `paths * horizon`
    pub max_path_steps: Option<usize>,
    /// Stop starting new paths once this much time has elapsed
    pub deadline: Option<Duration>,
}

impl SimulationBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Number of paths allowed for a requested count and horizon
    pub fn cap_paths(&self, requested: usize, horizon: usize) -> usize {
        match self.max_path_steps {
            Some(max) if horizon > 0 => requested.min(max / horizon),
            _ => requested,
        }
    }
}

/// Simulator settings
#[derive(Debug, Clone)]
pub struct MonteCarloConfig {
    pub simulations: usize,
    /// Base seed; `None` seeds from the clock
    pub seed: Option<u64>,
    /// Threads used to run paths (1 = run inline)
    pub workers: usize,
    pub budget: SimulationBudget,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            simulations: DEFAULT_SIMULATIONS,
            seed: None,
            workers: 1,
            budget: SimulationBudget::default(),
        }
    }
}

/// Runs stochastic compounding paths over a forecast
#[derive(Debug, Clone, Default)]
pub struct MonteCarloSimulator {
    config: MonteCarloConfig,
}

impl MonteCarloSimulator {
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(MonteCarloConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Simulate paths over `forecast`, with step returns drawn from
    /// Normal(mean(returns), volatility(returns))
    ///
    /// An empty forecast or a zero path count yields an all-zero result.
    pub fn run(&self, forecast: &[f64], returns: &[f64]) -> MonteCarloResult {
        let horizon = forecast.len();
        let paths = self.config.budget.cap_paths(self.config.simulations, horizon);

        if horizon == 0 || paths == 0 {
            return MonteCarloResult::default();
        }

        if paths < self.config.simulations {
            warn!(
                requested = self.config.simulations,
                allowed = paths,
                "Simulation budget reduced path count"
            );
        }

        let start_value = forecast[0];
        let mean_return = mean(returns);
        let vol = volatility(returns);
        let base_seed = self
            .config
            .seed
            .unwrap_or_else(|| SeededRng::from_entropy().next_u64());
        let deadline = self.config.budget.deadline.map(|d| Instant::now() + d);

        debug!(
            paths,
            horizon,
            mean_return,
            volatility = vol,
            workers = self.config.workers,
            "Starting Monte Carlo simulation"
        );

        let path = PathSpec {
            start_value,
            horizon,
            mean_return,
            volatility: vol,
            base_seed,
            deadline,
        };
        let finals = self.run_sharded(&path, paths);

        let result = summarize(finals);
        info!(
            simulations_run = result.simulations_run,
            mean = result.mean,
            probability_of_negative = result.probability_of_negative,
            "Monte Carlo simulation complete"
        );
        result
    }

    fn run_sharded(&self, path: &PathSpec, paths: usize) -> Vec<f64> {
        let workers = self.config.workers.clamp(1, paths);
        if workers == 1 {
            return path.simulate_range(0, paths);
        }

        let chunk = paths.div_ceil(workers);
        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|w| {
                    let start = w * chunk;
                    let end = ((w + 1) * chunk).min(paths);
                    scope.spawn(move || path.simulate_range(start, end))
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|h| {
                    h.join().unwrap_or_else(|_| {
                        warn!("Simulation worker panicked, dropping its paths");
                        Vec::new()
                    })
                })
                .collect()
        })
    }
}

struct PathSpec {
    start_value: f64,
    horizon: usize,
    mean_return: f64,
    volatility: f64,
    base_seed: u64,
    deadline: Option<Instant>,
}

impl PathSpec {
    fn simulate_range(&self, start: usize, end: usize) -> Vec<f64> {
        let mut finals = Vec::with_capacity(end.saturating_sub(start));
        for index in start..end {
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            finals.push(self.simulate_path(index));
        }
        finals
    }

    fn simulate_path(&self, index: usize) -> f64 {
        let mut rng = SeededRng::for_stream(self.base_seed, index as u64);
        let mut value = self.start_value;
        for _ in 1..self.horizon {
            value *= 1.0 + rng.normal(self.mean_return, self.volatility);
        }
        value
    }
}

/// Sort final values and compute distribution statistics
fn summarize(mut finals: Vec<f64>) -> MonteCarloResult {
    if finals.is_empty() {
        return MonteCarloResult::default();
    }

    finals.sort_by(|a, b| a.total_cmp(b));
    let n = finals.len();
    let mean = finals.iter().sum::<f64>() / n as f64;
    let variance = finals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let negatives = finals.iter().filter(|v| **v < 0.0).count();

    MonteCarloResult {
        percentiles: Percentiles {
            p5: percentile(&finals, 0.05),
            p25: percentile(&finals, 0.25),
            p50: percentile(&finals, 0.50),
            p75: percentile(&finals, 0.75),
            p95: percentile(&finals, 0.95),
        },
        mean,
        std_dev: variance.sqrt(),
        probability_of_negative: negatives as f64 / n as f64,
        simulations_run: n,
        all_path_values: finals,
    }
}

/// Value at index floor(n * p), clamped to the last element
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 * p).floor() as usize).min(sorted.len() - 1);
    sorted[idx]
}
