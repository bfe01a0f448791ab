//! Fan-out from the status side to viewer surfaces.
//!
//! The registry key is the notebook path, never a global singleton: state
//! produced for path A is never delivered to a binding registered under
//! path B. One binding exists per path; a second handshake for the same
//! path re-activates the existing binding with the new channel.

use std::collections::HashMap;

use comms::{Channel, ChannelRole, RelayMsg, RelayUpdate, RELAY_CHANNEL};
use tokio::sync::mpsc::UnboundedSender;

/// One viewer surface registered for a notebook path.
#[derive(Debug)]
struct ViewerBinding {
    sending: bool,
    channel: Channel<RelayMsg>,
}

/// Registry of viewer bindings, keyed by notebook path.
#[derive(Debug, Default)]
pub struct ViewerRelay {
    bindings: HashMap<String, ViewerBinding>,
}

impl ViewerRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a viewer handshake for `path`: creates the binding, or
    /// re-activates an existing one with the fresh channel.
    pub fn open(&mut self, path: &str, tx: UnboundedSender<RelayMsg>) {
        let binding = self
            .bindings
            .entry(path.to_string())
            .or_insert_with(|| ViewerBinding {
                sending: false,
                channel: Channel::new(RELAY_CHANNEL, ChannelRole::RelayOut),
            });
        binding.channel.attach(tx);
        binding.sending = true;
        log::info!("viewer attached for {path}");
    }

    /// Stops relaying to `path` and closes its channel. Idempotent.
    pub fn close(&mut self, path: &str) {
        if let Some(binding) = self.bindings.get_mut(path) {
            binding.sending = false;
            binding.channel.close();
        }
    }

    /// Drops the binding entirely (notebook closed).
    pub fn remove(&mut self, path: &str) {
        if self.bindings.remove(path).is_some() {
            log::debug!("viewer binding removed for {path}");
        }
    }

    /// Whether a viewer is currently receiving state for `path`.
    pub fn is_sending(&self, path: &str) -> bool {
        self.bindings.get(path).is_some_and(|b| b.sending)
    }

    /// Relays `update` to the binding for exactly `path`, if one is
    /// sending. A failed send means the viewer went away; the binding is
    /// deactivated, not retried.
    pub fn send(&mut self, path: &str, update: RelayUpdate) -> bool {
        let Some(binding) = self.bindings.get_mut(path) else {
            return false;
        };
        if !binding.sending {
            return false;
        }
        if binding.channel.send(RelayMsg::Update(Box::new(update))) {
            true
        } else {
            binding.sending = false;
            binding.channel.close();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn update(path: &str, step: u64) -> RelayUpdate {
        RelayUpdate {
            run_time: 1,
            data_set: Vec::new(),
            data_item: comms::MetricMap::new(),
            spec: Vec::new(),
            current_step: step,
            update_graph: false,
            display_graph: true,
            done: false,
            title: path.to_string(),
        }
    }

    #[test]
    fn delivers_only_to_the_registered_path() {
        let mut relay = ViewerRelay::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        relay.open("A.ipynb", tx_a);
        relay.open("B.ipynb", tx_b);

        assert!(relay.send("A.ipynb", update("A.ipynb", 1)));
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err(), "path B must see nothing");
    }

    #[test]
    fn unregistered_path_is_a_soft_failure() {
        let mut relay = ViewerRelay::new();
        assert!(!relay.send("A.ipynb", update("A.ipynb", 1)));
    }

    #[test]
    fn a_second_handshake_reactivates_the_binding() {
        let mut relay = ViewerRelay::new();
        let (tx1, rx1) = mpsc::unbounded_channel();
        relay.open("A.ipynb", tx1);
        drop(rx1);

        // First send fails and deactivates.
        assert!(!relay.send("A.ipynb", update("A.ipynb", 1)));
        assert!(!relay.is_sending("A.ipynb"));

        let (tx2, mut rx2) = mpsc::unbounded_channel();
        relay.open("A.ipynb", tx2);
        assert!(relay.send("A.ipynb", update("A.ipynb", 2)));
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn close_stops_delivery_without_dropping_the_binding() {
        let mut relay = ViewerRelay::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        relay.open("A.ipynb", tx);
        relay.close("A.ipynb");
        relay.close("A.ipynb");

        assert!(!relay.send("A.ipynb", update("A.ipynb", 1)));
        assert!(rx.try_recv().is_err());
    }
}
