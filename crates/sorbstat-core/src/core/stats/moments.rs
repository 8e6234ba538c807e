use serde::{Deserialize, Serialize};
use std::fmt;

/// A running value paired with its one-sigma uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Estimate {
    pub value: f64,
    pub error: f64,
}

impl Estimate {
    pub fn new(value: f64, error: f64) -> Self {
        Self { value, error }
    }

    /// Both the value and its error are finite numbers.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.value.is_finite() && self.error.is_finite()
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self {
            value: self.value * factor,
            error: self.error * factor,
        }
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*} +- {:.*}", p, self.value, p, self.error),
            None => write!(f, "{} +- {}", self.value, self.error),
        }
    }
}

/// The standard-deviation-of-the-mean factor `1/sqrt(m - 1)`.
///
/// Zero when fewer than two samples exist, so every error built on it
/// collapses to zero instead of infinity.
#[inline]
pub fn sdom(count: u64) -> f64 {
    if count < 2 {
        0.0
    } else {
        1.0 / ((count - 1) as f64).sqrt()
    }
}

const ROUND_OFF_ULPS: f64 = 16.0;

/// Zero for anything within `ROUND_OFF_ULPS` epsilons of `scale`, positive
/// or negative; such a difference is indistinguishable from cancellation.
fn clamp_radicand(difference: f64, scale: f64) -> f64 {
    if difference <= ROUND_OFF_ULPS * f64::EPSILON * scale.abs() {
        0.0
    } else {
        difference
    }
}

/// Incremental mean / mean-square (and optionally mean-fourth-power) of a
/// scalar series.
///
/// Every update applies the weighted recurrence
/// `mean <- ((m-1)/m) * mean + x/m`, which reproduces the arithmetic mean of
/// the full history at each step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MomentAccumulator {
    count: u64,
    mean: f64,
    mean_sq: f64,
    mean_fourth: Option<f64>,
}

impl MomentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An accumulator that also tracks the mean of `x^4`.
    pub fn with_fourth_moment() -> Self {
        Self {
            mean_fourth: Some(0.0),
            ..Self::default()
        }
    }

    pub fn update(&mut self, x: f64) {
        self.update_moments(x, x * x);
    }

    /// Folds a sample whose square is supplied separately, as when the
    /// sample is itself a running mean and `x_sq` its mean of squares.
    pub fn update_moments(&mut self, x: f64, x_sq: f64) {
        self.count += 1;
        let m = self.count as f64;
        let factor = (m - 1.0) / m;

        self.mean = factor * self.mean + x / m;
        self.mean_sq = factor * self.mean_sq + x_sq / m;
        if let Some(fourth) = self.mean_fourth.as_mut() {
            *fourth = factor * *fourth + x_sq * x_sq / m;
        }
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    #[inline]
    pub fn mean_sq(&self) -> f64 {
        self.mean_sq
    }

    #[inline]
    pub fn mean_fourth(&self) -> Option<f64> {
        self.mean_fourth
    }

    /// `<x^2> - <x>^2`, clamped at zero against cancellation.
    ///
    /// Differences within a few ulps of `<x^2>` are indistinguishable from
    /// round-off and are reported as exactly zero.
    pub fn variance(&self) -> f64 {
        clamp_radicand(self.mean_sq - self.mean * self.mean, self.mean_sq)
    }

    pub fn standard_error(&self) -> f64 {
        sdom(self.count) * self.variance().sqrt()
    }

    /// Standard error of `<x^2>`, from `<x^4> - <x>^4`. `None` unless the
    /// fourth moment is tracked.
    pub fn square_error(&self) -> Option<f64> {
        self.mean_fourth.map(|fourth| {
            let radicand = clamp_radicand(fourth - self.mean.powi(4), fourth);
            sdom(self.count) * radicand.sqrt()
        })
    }

    pub fn estimate(&self) -> Estimate {
        Estimate::new(self.mean, self.standard_error())
    }

    /// Forgets all samples; whether the fourth moment is tracked is kept.
    pub fn clear(&mut self) {
        self.count = 0;
        self.mean = 0.0;
        self.mean_sq = 0.0;
        if let Some(fourth) = self.mean_fourth.as_mut() {
            *fourth = 0.0;
        }
    }
}
