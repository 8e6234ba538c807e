use crate::core::models::nodestats::{AcceptanceRates, NodeStats};
use crate::core::stats::moments::{Estimate, MomentAccumulator};
use serde::{Deserialize, Serialize};

/// What one worker sends to the root at an aggregation point: its latest
/// cumulative acceptance rates and the running moments of its diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AvgNodeStats {
    pub acceptance: AcceptanceRates,
    pub boltzmann_factor: f64,
    pub boltzmann_factor_sq: f64,
    pub cavity_bias_probability: f64,
    pub cavity_bias_probability_sq: f64,
    pub polarization_iterations: f64,
    pub polarization_iterations_sq: f64,
}

/// Worker-local running statistics of the move engine.
///
/// Acceptance rates are overwritten with the latest cumulative ratio on every
/// update, never averaged; the per-step diagnostics go through the usual
/// recurrence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeStatsAggregator {
    acceptance: AcceptanceRates,
    boltzmann_factor: MomentAccumulator,
    cavity_bias_probability: MomentAccumulator,
    polarization_iterations: MomentAccumulator,
}

impl NodeStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, stats: &NodeStats) {
        self.acceptance = stats.acceptance_rates();
        self.boltzmann_factor.update(stats.boltzmann_factor);
        self.cavity_bias_probability
            .update(stats.cavity_bias_probability);
        self.polarization_iterations
            .update(stats.polarization_iterations);
    }

    #[inline]
    pub fn acceptance(&self) -> &AcceptanceRates {
        &self.acceptance
    }

    pub fn summary(&self) -> AvgNodeStats {
        AvgNodeStats {
            acceptance: self.acceptance,
            boltzmann_factor: self.boltzmann_factor.mean(),
            boltzmann_factor_sq: self.boltzmann_factor.mean_sq(),
            cavity_bias_probability: self.cavity_bias_probability.mean(),
            cavity_bias_probability_sq: self.cavity_bias_probability.mean_sq(),
            polarization_iterations: self.polarization_iterations.mean(),
            polarization_iterations_sq: self.polarization_iterations.mean_sq(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Error factor for the root diagnostics: `1/sqrt(floor((step+1)*size/corrtime) - 1)`,
/// zero when fewer than two decorrelated samples exist.
pub fn decorrelated_sdom(step: u64, size: usize, corrtime: u64) -> f64 {
    let samples = (step + 1) * size as u64 / corrtime.max(1);
    if samples < 2 {
        0.0
    } else {
        1.0 / ((samples - 1) as f64).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RootNodeStatsReport {
    pub acceptance: AcceptanceRates,
    pub boltzmann_factor: Estimate,
    pub cavity_bias_probability: Estimate,
    pub polarization_iterations: Estimate,
}

/// Root-level view of the move statistics across the whole collective.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RootNodeStats {
    acceptance: AcceptanceRates,
    boltzmann_factor: MomentAccumulator,
    cavity_bias_probability: MomentAccumulator,
    polarization_iterations: MomentAccumulator,
    error_scale: f64,
}

impl RootNodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds every worker's summary for `step`, in the order given.
    pub fn fold(&mut self, step: u64, size: usize, corrtime: u64, workers: &[AvgNodeStats]) {
        for stats in workers {
            self.boltzmann_factor
                .update_moments(stats.boltzmann_factor, stats.boltzmann_factor_sq);
            self.cavity_bias_probability.update_moments(
                stats.cavity_bias_probability,
                stats.cavity_bias_probability_sq,
            );
            self.polarization_iterations.update_moments(
                stats.polarization_iterations,
                stats.polarization_iterations_sq,
            );
        }
        let rates: Vec<AcceptanceRates> = workers.iter().map(|w| w.acceptance).collect();
        self.acceptance = AcceptanceRates::mean_of(&rates);
        self.error_scale = decorrelated_sdom(step, size, corrtime);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Number of worker contributions folded since the last clear.
    #[inline]
    pub fn count(&self) -> u64 {
        self.boltzmann_factor.count()
    }

    pub fn report(&self) -> RootNodeStatsReport {
        let estimate = |acc: &MomentAccumulator| {
            Estimate::new(acc.mean(), self.error_scale * acc.variance().sqrt())
        };
        RootNodeStatsReport {
            acceptance: self.acceptance,
            boltzmann_factor: estimate(&self.boltzmann_factor),
            cavity_bias_probability: estimate(&self.cavity_bias_probability),
            polarization_iterations: estimate(&self.polarization_iterations),
        }
    }
}
