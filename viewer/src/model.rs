use comms::{ChartSpec, MetricMap};

/// Everything a viewer surface needs to render, mirroring the relay
/// payload. One model per mounted viewer.
#[derive(Debug, Clone, Default)]
pub struct ViewerModel {
    /// Raw runtime in seconds; formatted for display by `present`.
    pub run_time: u64,
    /// Accumulated per-step slices for the whole run.
    pub data_set: Vec<MetricMap>,
    /// The most recent slice, shown in the stat panel.
    pub data_item: MetricMap,
    pub spec: Vec<ChartSpec>,
    pub current_step: u64,
    pub update_graph: bool,
    pub display_graph: bool,
    pub done: bool,
    /// Notebook path of the producing session.
    pub title: String,
}
