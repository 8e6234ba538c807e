//! Input for recorded simulation output.
//!
//! The aggregation engine itself is in-memory only; this module lets a run that
//! was written to disk as a CSV snapshot stream be fed back through it.

pub mod snapshots;
