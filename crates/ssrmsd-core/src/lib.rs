//! # ssrmsd
//!
//! Secondary-structure collective variables: count, or otherwise aggregate, the
//! windows of a backbone that resemble a reference motif, with exact analytic
//! derivatives suitable for biasing a simulation.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Stateless building blocks: backbone chains and
//!   windows, reference templates, the three alignment conventions (optimal
//!   superposition, translation-only, distance-matrix RMSD), the switching function,
//!   the built-in motif registry and trajectory I/O.
//!
//! - **[`engine`]: The Logic Core.** Configuration and validation, the
//!   [`engine::colvar::SecondaryStructureColvar`] evaluator with its aggregations and
//!   derivative assembly, and the neighbor-list cache.
//!
//! - **[`workflows`]: The Public API.** Complete procedures such as evaluating a
//!   trajectory frame by frame.
//!
//! ## Example
//!
//! ```no_run
//! use ssrmsd::core::templates::{LengthUnits, TemplateRegistry};
//! use ssrmsd::engine::colvar::SecondaryStructureColvar;
//! use ssrmsd::engine::config::{Aggregation, ColvarConfigBuilder};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let template = TemplateRegistry::builtin().get("alpha-plus-cis", LengthUnits::nanometers())?;
//! let config = ColvarConfigBuilder::new()
//!     .chain((0..25).collect())
//!     .aggregation(Aggregation::LessThan)
//!     .build()?;
//! let mut colvar = SecondaryStructureColvar::new(template, config)?;
//! # let positions = vec![nalgebra::Point3::origin(); 25];
//! let output = colvar.evaluate(&positions, None)?;
//! println!("{:?}", output.value("lessthan"));
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod engine;
pub mod workflows;
