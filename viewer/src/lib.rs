//! Viewer-side consumption of the relay channel: mounts with a handshake,
//! applies full-state and incremental updates, and translates the result
//! into chart-library and status-widget inputs.

pub mod model;
pub mod present;
pub mod state;

pub use model::ViewerModel;
pub use state::ViewerState;
