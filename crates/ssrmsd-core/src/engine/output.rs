use super::error::EngineError;
use nalgebra::{Matrix3, Vector3};

/// Derivative of one output with respect to the position of one host atom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtomDerivative {
    pub atom: usize,
    pub gradient: Vector3<f64>,
}

/// One aggregated output of the collective variable.
#[derive(Debug, Clone, PartialEq)]
pub struct ColvarComponent {
    pub name: &'static str,
    pub value: f64,
    /// One entry for every atom that belongs to at least one window, sorted by atom index.
    pub derivatives: Vec<AtomDerivative>,
    pub virial: Matrix3<f64>,
}

impl ColvarComponent {
    pub fn gradient_of(&self, atom: usize) -> Option<Vector3<f64>> {
        self.derivatives
            .binary_search_by_key(&atom, |d| d.atom)
            .ok()
            .map(|i| self.derivatives[i].gradient)
    }

    /// Adds the force `-bias_derivative · ∂value/∂x` of a bias acting on this output.
    pub fn apply_forces(
        &self,
        forces: &mut [Vector3<f64>],
        bias_derivative: f64,
    ) -> Result<(), EngineError> {
        if let Some(last) = self.derivatives.last() {
            if last.atom >= forces.len() {
                return Err(EngineError::AtomOutOfRange {
                    index: last.atom,
                    available: forces.len(),
                });
            }
        }
        for d in &self.derivatives {
            forces[d.atom] -= d.gradient * bias_derivative;
        }
        Ok(())
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ColvarOutput {
    pub components: Vec<ColvarComponent>,
    /// Distance of each window from the reference, in window order; `None` for skipped windows.
    pub window_distances: Vec<Option<f64>>,
    /// Windows whose distance was too small for a gradient.
    pub degenerate_windows: usize,
}

impl ColvarOutput {
    pub fn component(&self, name: &str) -> Option<&ColvarComponent> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.component(name).map(|c| c.value)
    }

    pub fn evaluated_windows(&self) -> usize {
        self.window_distances.iter().filter(|d| d.is_some()).count()
    }

    pub fn skipped_windows(&self) -> usize {
        self.window_distances.len() - self.evaluated_windows()
    }
}
