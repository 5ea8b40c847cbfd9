//! # Workflows Module
//!
//! End-to-end entry points that tie [`crate::core`] and [`crate::engine`] together.
//!
//! - **Trajectory Evaluation** ([`evaluate`]) - Resolve a reference motif, build the
//!   collective variable and evaluate it on every frame of a trajectory, with progress
//!   reporting and CSV output.

pub mod evaluate;
