use super::config::NeighborListConfig;

/// Remembers which windows contributed at the last full evaluation so that the
/// evaluations in between can skip the rest.
#[derive(Debug, Clone)]
pub struct NeighborListCache {
    config: NeighborListConfig,
    evaluations: u64,
    active: Option<Vec<bool>>,
}

impl NeighborListCache {
    pub fn new(config: NeighborListConfig) -> Self {
        Self {
            config,
            evaluations: 0,
            active: None,
        }
    }

    /// True when the coming evaluation must look at every window.
    pub fn is_refresh_step(&self) -> bool {
        self.active.is_none() || self.evaluations % self.config.stride == 0
    }

    pub fn should_evaluate(&self, window: usize) -> bool {
        match &self.active {
            Some(active) if !self.is_refresh_step() => active.get(window).copied().unwrap_or(true),
            _ => true,
        }
    }

    /// Records the switching value of each window (`None` when skipped) and advances
    /// the evaluation counter. Only refresh steps update the active set.
    pub fn complete(&mut self, switching: &[Option<f64>]) {
        if self.is_refresh_step() {
            let tolerance = self.config.tolerance;
            self.active = Some(
                switching
                    .iter()
                    .map(|s| s.is_some_and(|s| s >= tolerance))
                    .collect(),
            );
        }
        self.evaluations += 1;
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn active_windows(&self) -> Option<usize> {
        self.active
            .as_ref()
            .map(|active| active.iter().filter(|a| **a).count())
    }
}
