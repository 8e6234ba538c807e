//! # Core Models Module
//!
//! Plain data records exchanged between the move engine and the aggregation
//! layer.
//!
//! - [`snapshot`] - the per-step, per-worker observable measurement
//! - [`ensemble`] - the statistical ensemble tag that selects ensemble-dependent formulas
//! - [`sorbate`] - declared sorbate species and their per-step values
//! - [`nodestats`] - per-worker move acceptance counters and solver diagnostics

pub mod ensemble;
pub mod nodestats;
pub mod snapshot;
pub mod sorbate;
