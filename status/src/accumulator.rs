use comms::MetricMap;

/// Append-only history of per-step metric slices for one training run.
///
/// Exclusively owned by the session's binding; never shared across
/// sessions. Cleared when the bound session changes, when a new run is
/// detected, and when the post-completion display window elapses.
#[derive(Debug, Default)]
pub struct DatasetAccumulator {
    slices: Vec<MetricMap>,
}

impl DatasetAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, slice: MetricMap) {
        self.slices.push(slice);
    }

    pub fn clear(&mut self) {
        self.slices.clear();
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// The accumulated slices in arrival order.
    pub fn slices(&self) -> &[MetricMap] {
        &self.slices
    }

    /// Copies the history out for a relay payload.
    pub fn to_vec(&self) -> Vec<MetricMap> {
        self.slices.clone()
    }
}
