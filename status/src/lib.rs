//! Status-side core of the progress synchronization protocol.
//!
//! A single event loop ([`run::StatusLoop`]) consumes the host event stream
//! and, per notebook path, folds inbound progress messages through a pure
//! state machine ([`machine`]) into an immutable snapshot, an append-only
//! metric history, and fan-out relays to any viewer surfaces.

pub mod accumulator;
pub mod binding;
pub mod config;
pub mod error;
pub mod machine;
pub mod relay;
pub mod run;
pub mod snapshot;

pub use accumulator::DatasetAccumulator;
pub use binding::SessionBinding;
pub use config::StatusConfig;
pub use error::StatusErr;
pub use relay::ViewerRelay;
pub use run::StatusLoop;
pub use snapshot::{Phase, ProgressSnapshot, INTERRUPTED};
