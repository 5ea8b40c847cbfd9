//! # Geometry Module
//!
//! Structural comparison of one window against a reference, with analytic gradients.
//!
//! - [`alignment`] - The alignment modes and the [`alignment::Aligner`] that dispatches over them
//! - [`superposition`] - Optimal (Kabsch) and translation-only superposition
//! - [`drmsd`] - Distance-matrix RMSD over reference atom pairs
//! - [`pbc`] - Periodic cells, minimum images and reassembly of split windows

pub mod alignment;
pub mod drmsd;
pub mod pbc;
pub mod superposition;
