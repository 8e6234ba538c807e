//! # sorbstat Core Library
//!
//! Online statistical aggregation for Monte Carlo sorption simulations: a
//! collective of workers reports one snapshot of physical observables per
//! step, and this library turns that stream into running estimates with
//! errors and into derived thermodynamic quantities (heat capacity,
//! compressibility, isosteric heat, excess sorption, selectivity).
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three-layer split throughout:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`ObservableSnapshot`,
//!   `NodeStats`, `Ensemble`), the incremental moment accumulator, physical
//!   constants and the snapshot-stream reader.
//!
//! - **[`engine`]: The Logic Core.** The stateful root aggregation: running
//!   averages, derived properties, per-species statistics, move statistics,
//!   the barrier-then-fold protocol and checkpointing.
//!
//! - **[`workflows`]: The Public API.** Complete procedures such as replaying
//!   a recorded run through the engine.

pub mod core;
pub mod engine;
pub mod workflows;
