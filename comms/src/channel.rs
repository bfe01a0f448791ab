use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// Identity of one comm conversation, assigned by whoever opens it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommId(String);

impl CommId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which direction of the pipeline a channel serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    /// Inbound progress from the compute session.
    ProgressIn,
    /// Outbound relay toward a viewer surface.
    RelayOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Unopened,
    Open,
    Closed,
}

/// A named, message-oriented conversation bound to one session.
///
/// Sends are best-effort: a closed channel or a gone peer drops the message
/// and logs, it never errors out (progress is sampled, not guaranteed).
/// Closing is idempotent; closing an already-closed or never-opened channel
/// does nothing.
#[derive(Debug)]
pub struct Channel<T> {
    name: &'static str,
    role: ChannelRole,
    state: ChannelState,
    tx: Option<UnboundedSender<T>>,
}

impl<T> Channel<T> {
    /// Creates an unopened channel handle.
    pub fn new(name: &'static str, role: ChannelRole) -> Self {
        Self {
            name,
            role,
            state: ChannelState::Unopened,
            tx: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn role(&self) -> ChannelRole {
        self.role
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    /// Opens the channel with a transport for outbound messages. Replaces
    /// any previous transport.
    pub fn attach(&mut self, tx: UnboundedSender<T>) {
        self.tx = Some(tx);
        self.state = ChannelState::Open;
    }

    /// Marks an inbound channel open after its handshake; there is nothing
    /// to send on, so no transport is attached.
    pub fn mark_open(&mut self) {
        self.state = ChannelState::Open;
    }

    /// Sends `msg`, reporting whether it was handed to the transport.
    pub fn send(&self, msg: T) -> bool {
        match (&self.state, &self.tx) {
            (ChannelState::Open, Some(tx)) => {
                if tx.send(msg).is_err() {
                    log::warn!("channel {}: peer gone, message dropped", self.name);
                    false
                } else {
                    true
                }
            }
            _ => {
                log::debug!("channel {}: not open, message dropped", self.name);
                false
            }
        }
    }

    /// Closes the channel. Best-effort and idempotent.
    pub fn close(&mut self) {
        if self.state == ChannelState::Open {
            log::debug!("channel {}: closed", self.name);
        }
        self.state = ChannelState::Closed;
        self.tx = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn send_on_unopened_channel_is_a_soft_failure() {
        let chan: Channel<u32> = Channel::new("plyto-data", ChannelRole::RelayOut);
        assert_eq!(chan.state(), ChannelState::Unopened);
        assert!(!chan.send(1));
    }

    #[test]
    fn attach_then_send_delivers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut chan = Channel::new("plyto-data", ChannelRole::RelayOut);
        chan.attach(tx);
        assert!(chan.send(7));
        assert_eq!(rx.try_recv().unwrap(), 7);
    }

    #[test]
    fn send_after_peer_dropped_reports_failure() {
        let (tx, rx) = mpsc::unbounded_channel::<u32>();
        drop(rx);
        let mut chan = Channel::new("plyto-data", ChannelRole::RelayOut);
        chan.attach(tx);
        assert!(!chan.send(7));
    }

    #[test]
    fn close_is_idempotent() {
        let mut chan: Channel<u32> = Channel::new("plyto", ChannelRole::ProgressIn);
        chan.mark_open();
        chan.close();
        chan.close();
        chan.close();
        assert_eq!(chan.state(), ChannelState::Closed);
        assert!(!chan.send(1));
    }
}
