//! # Engine Module
//!
//! The stateful aggregation layer. It turns the per-step snapshots of a
//! worker collective into running estimates and derived thermodynamic
//! quantities.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Static simulation parameters, their builder and TOML loading
//! - **Running Averages** ([`averages`]) - One accumulator per physical observable
//! - **Derived Properties** ([`derived`]) - Heat capacity, compressibility, isosteric heat and
//!   the sorption quantities, with propagated errors
//! - **Sorbate Statistics** ([`sorbates`]) - Per-species averages and selectivity
//! - **Move Statistics** ([`nodestats`]) - Worker-local and root-level acceptance and diagnostics
//! - **Aggregation Protocol** ([`protocol`]) - Barrier-then-fold contract with a single root owner
//! - **Checkpointing** ([`checkpoint`]) - JSON persistence of the root state
//! - **Reporting** ([`report`], [`progress`]) - Reporter-ready views and progress callbacks
//! - **Error Handling** ([`error`]) - Aggregation errors
//!
//! Numerically degenerate cases never fail here: variances clamp at zero,
//! undefined quantities become NaN and quantities missing a static input are
//! withheld as `None`.

pub mod averages;
pub mod checkpoint;
pub mod config;
pub mod derived;
pub mod error;
pub mod nodestats;
pub mod progress;
pub mod protocol;
pub mod report;
pub mod sorbates;
