use comms::{ChartSpec, MetricMap};

/// Sentinel for [`ProgressSnapshot::overall`]: the run was interrupted.
pub const INTERRUPTED: f64 = -1.0;

/// High-level lifecycle states of one training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Completed,
    Interrupted,
}

/// Immutable record of training progress at one point in time.
///
/// Produced per message by [`crate::machine::transition`]; never mutated in
/// place. `overall == 0` means the indicator has nothing to show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    /// Overall completion in percent, or `-1` while the interrupted state
    /// is displayed. Non-decreasing within one run otherwise.
    pub overall: f64,
    /// Completion of the current step in percent.
    pub step_progress: f64,
    /// Index of the step currently iterated.
    pub step: u64,
    /// Total runtime in whole seconds.
    pub run_time: u64,
    /// Latest metric slice, declaration order preserved. May carry
    /// `NaN`-shaped values; presentation renders them literally.
    pub metrics: MetricMap,
    /// Chart descriptors, each naming its redraw target.
    pub chart_specs: Vec<ChartSpec>,
    /// True iff `overall` reached 100.
    pub done: bool,
    /// False during the warm-up window before the first full second of
    /// runtime, when chart surfaces stay hidden.
    pub display_graph: bool,
}

impl ProgressSnapshot {
    pub fn phase(&self) -> Phase {
        if self.overall == INTERRUPTED {
            Phase::Interrupted
        } else if self.done {
            Phase::Completed
        } else if self.overall > 0.0 {
            Phase::Running
        } else {
            Phase::Idle
        }
    }

    pub fn interrupted(&self) -> bool {
        self.overall == INTERRUPTED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_follows_overall_and_done() {
        let mut snap = ProgressSnapshot::default();
        assert_eq!(snap.phase(), Phase::Idle);

        snap.overall = 42.0;
        assert_eq!(snap.phase(), Phase::Running);

        snap.overall = 100.0;
        snap.done = true;
        assert_eq!(snap.phase(), Phase::Completed);

        snap.overall = INTERRUPTED;
        snap.done = false;
        assert_eq!(snap.phase(), Phase::Interrupted);
        assert!(snap.interrupted());
    }
}
