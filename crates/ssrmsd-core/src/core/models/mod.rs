//! # Core Models Module
//!
//! Data structures describing what is being compared: the backbone chains declared
//! by the host, the reference geometry of a motif, and the windows that pair the two.
//!
//! ## Key Components
//!
//! - [`chain`] - Validation of declared chains and the flattened atom index space
//! - [`template`] - Immutable reference geometries with alignment weights
//! - [`window`] - Enumeration of residue-aligned windows over the chains
//!
//! Every model here is built once at setup and never mutated afterwards; per-step
//! coordinates are passed separately to the engine.

pub mod chain;
pub mod template;
pub mod window;
