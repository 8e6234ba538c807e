//! Bias correction for the standard deviation of a sample variance.
//!
//! Fluctuation properties (heat capacity, compressibility) are proportional to
//! a variance, so their error needs the spread of the variance estimator
//! itself. For Gaussian data that spread involves the ratio
//! `Gamma(m/2) / Gamma((m-1)/2)`; evaluating the Gamma functions directly
//! overflows long before realistic sample counts, so the ratio is taken from a
//! Stirling expansion instead.

/// Signature of a bias-correction factor `g(m)` for `m` samples.
pub type GammaRatioFn = fn(f64) -> f64;

/// Stirling-form factor `g = sqrt((m - 1 - 2 r^2) / m)` with
/// `r = ((m-2)/(m-1))^(m/2 - 1) * sqrt((m-2)/2) * e^(1/2)`.
///
/// Zero for `m < 2`; a negative radicand clamps to zero.
pub fn stirling_gamma_ratio(m: f64) -> f64 {
    if m < 2.0 {
        return 0.0;
    }
    let r = ((m - 2.0) / (m - 1.0)).powf(0.5 * m - 1.0) * (0.5 * (m - 2.0)).sqrt() * 0.5_f64.exp();
    let radicand = (1.0 / m) * (m - 1.0 - 2.0 * r * r);
    if radicand > 0.0 { radicand.sqrt() } else { 0.0 }
}
