//! Numerical primitives for running statistics.
//!
//! - [`moments`] - the incremental mean / moment accumulator and the
//!   `(value, error)` pair every averaged quantity is reported as
//! - [`bias`] - the bias-correction factor used for errors of fluctuation
//!   properties

pub mod bias;
pub mod moments;
