//! Trajectory input and output.

pub mod traits;
pub mod xyz;
