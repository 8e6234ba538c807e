//! # Workflows Module
//!
//! High-level entry points that tie the `core` data models and the `engine`
//! aggregation layer into complete procedures.
//!
//! - **Replay Workflow** ([`replay`]) - Drives a recorded snapshot stream through the
//!   lockstep aggregation protocol, with equilibration reset and checkpoint resume.

pub mod replay;
