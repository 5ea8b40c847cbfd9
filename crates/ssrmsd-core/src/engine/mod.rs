//! # Engine Module
//!
//! The stateful layer: validated configuration, the collective-variable evaluator
//! and the little state it carries between evaluations.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Aggregations, switching, cutoffs and the builder
//! - **Evaluation** ([`colvar`]) - Window alignment, aggregation and derivative assembly
//! - **Results** ([`output`]) - Values, per-atom derivatives and virials
//! - **Neighbor List** ([`cache`]) - Periodic skipping of negligible windows
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine error taxonomy
//!
//! Per-window work runs on the `rayon` pool when the `parallel` feature is enabled;
//! reduction into per-atom derivatives happens afterwards in window order, so results
//! do not depend on thread scheduling.

pub(crate) mod aggregate;
pub mod cache;
pub mod colvar;
pub mod config;
pub mod error;
pub mod output;
pub mod progress;
