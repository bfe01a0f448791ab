//! Translation from synchronized state to what the chart library and the
//! status widget consume. Deliberately thin: rendering itself lives outside
//! this system.

use comms::coerce;
use serde_json::Value;

use crate::model::ViewerModel;

/// Formats a raw second count as `H:MM:SS`.
pub fn format_runtime(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

/// The chart names whose datasets need re-inserting for this model, in spec
/// order. Empty when the model does not warrant a redraw.
pub fn redraw_targets(model: &ViewerModel) -> Vec<&str> {
    if !model.update_graph || !model.display_graph || model.spec.is_empty() {
        return Vec::new();
    }
    model.spec.iter().filter_map(|spec| spec.name()).collect()
}

/// Renders one metric value for the stat panel. An unreadable value shows
/// as the literal `NaN` so the failure stays visible to the user.
pub fn format_metric(value: &Value) -> String {
    let n = coerce::to_f64(value);
    if n.is_nan() {
        "NaN".to_string()
    } else {
        n.to_string()
    }
}
