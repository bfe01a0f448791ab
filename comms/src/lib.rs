pub mod channel;
pub mod chart;
pub mod coerce;
pub mod msg;
pub mod session;

pub use channel::{Channel, ChannelRole, ChannelState, CommId};
pub use chart::ChartSpec;
pub use msg::{
    MetricMap, MsgKind, ProgressMsg, ProgressPayload, RelayMsg, RelayUpdate, PROGRESS_TARGET,
    RELAY_CHANNEL,
};
pub use session::{HostEvent, Session, SessionBus, SessionId, SessionStatus};
