//! # Core Module
//!
//! Stateless building blocks of the aggregation engine.
//!
//! ## Architecture
//!
//! - **Data Records** ([`models`]) - snapshots, ensembles, species, and node statistics
//! - **Numerical Primitives** ([`stats`]) - the moment accumulator and bias-correction factor
//! - **Physical Constants** ([`constants`]) - unit conversions used by the derived properties
//! - **Stream Input** ([`io`]) - reading recorded snapshot streams
//!
//! Nothing in this module owns running state across steps; that lives in
//! [`crate::engine`].

pub mod constants;
pub mod io;
pub mod models;
pub mod stats;
