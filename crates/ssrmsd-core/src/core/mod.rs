//! # Core Module
//!
//! Stateless building blocks of the secondary-structure RMSD engine.
//!
//! ## Overview
//!
//! Everything here operates on plain coordinates and immutable reference data.
//! Nothing in this module keeps state between evaluations; that lives in
//! [`crate::engine`].
//!
//! ## Architecture
//!
//! - **Backbone Description** ([`models`]) - Chains, windows and reference templates
//! - **Structural Comparison** ([`geometry`]) - Optimal and translation-only superposition,
//!   distance-matrix RMSD, periodic cells
//! - **Switching** ([`switching`]) - The rational switching function and its derivative
//! - **Reference Motifs** ([`templates`]) - Built-in peptoid motifs and TOML template files
//! - **File I/O** ([`io`]) - Multi-frame XYZ trajectories
//!
//! ## Units
//!
//! Lengths are whatever unit the caller's positions use. Template data is converted
//! explicitly on lookup through [`templates::LengthUnits`]; there is no global unit state.

pub mod geometry;
pub mod io;
pub mod models;
pub mod switching;
pub mod templates;
