//! Per-session channel lifecycle.
//!
//! A [`SessionBinding`] tracks which compute session is current for one
//! notebook path, records the inbound channel identity established by the
//! open handshake, and silently drops data from stale channels.

use comms::{
    Channel, ChannelRole, CommId, MsgKind, ProgressMsg, ProgressPayload, Session, SessionId,
    SessionStatus, PROGRESS_TARGET,
};

use crate::{accumulator::DatasetAccumulator, snapshot::ProgressSnapshot};

/// Proof of a live host subscription for one session.
///
/// Held by the binding and released exactly once, on rebind or teardown;
/// replaces the original pattern of re-wiring listeners on every session
/// change.
#[derive(Debug)]
pub struct Subscription {
    session: SessionId,
    released: bool,
}

impl Subscription {
    fn new(session: SessionId) -> Self {
        log::debug!("subscribed to session {session}");
        Self {
            session,
            released: false,
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            log::debug!("released subscription for session {}", self.session);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// Tracks the current session for one notebook path and owns all state
/// scoped to it: the inbound channel, the latest snapshot, and the run
/// history.
#[derive(Debug)]
pub struct SessionBinding {
    session: Session,
    in_channel: Channel<ProgressMsg>,
    /// Identity recorded by the most recent open handshake.
    comm_id: Option<CommId>,
    subscription: Option<Subscription>,
    pub snapshot: ProgressSnapshot,
    pub accumulator: DatasetAccumulator,
}

impl SessionBinding {
    /// Creates a binding for a freshly tracked session.
    pub fn new(session: Session) -> Self {
        let subscription = Subscription::new(session.id.clone());
        Self {
            session,
            in_channel: Channel::new(PROGRESS_TARGET, ChannelRole::ProgressIn),
            comm_id: None,
            subscription: Some(subscription),
            snapshot: ProgressSnapshot::default(),
            accumulator: DatasetAccumulator::new(),
        }
    }

    /// Rebinds to `session`.
    ///
    /// Idempotent for the same session: the channel and history are left
    /// alone. A different session closes the old channel, releases the old
    /// subscription, and starts from a clean slate.
    ///
    /// # Returns
    /// `true` when the binding actually moved to a different session.
    pub fn bind(&mut self, session: Session) -> bool {
        if session.id == self.session.id {
            log::debug!("bind: already bound to session {}", session.id);
            self.session = session;
            if self.subscription.is_none() {
                self.subscription = Some(Subscription::new(self.session.id.clone()));
            }
            return false;
        }

        log::info!(
            "rebinding {} from session {} to {}",
            session.notebook_path,
            self.session.id,
            session.id
        );
        self.in_channel.close();
        self.comm_id = None;
        if let Some(mut sub) = self.subscription.take() {
            sub.release();
        }
        self.subscription = Some(Subscription::new(session.id.clone()));
        self.session = session;
        self.snapshot = ProgressSnapshot::default();
        self.accumulator.clear();
        true
    }

    /// Records a status transition. The session value is replaced, not
    /// mutated, mirroring how the host reports kernel changes.
    pub fn note_status(&mut self, status: SessionStatus) {
        self.session = Session {
            status,
            ..self.session.clone()
        };
    }

    /// Classifies one inbound message.
    ///
    /// An open handshake records (or replaces) the live channel identity and
    /// is idempotent for a repeated identity. A data message is surfaced
    /// only when its identity matches the live handshake; anything else is
    /// a stale or duplicate channel and is dropped silently.
    pub fn classify(&mut self, msg: ProgressMsg) -> Option<ProgressPayload> {
        match msg.kind {
            MsgKind::Open => {
                match &self.comm_id {
                    Some(live) if *live == msg.comm_id => {
                        log::debug!("duplicate open for comm {live}, ignoring");
                    }
                    Some(stale) => {
                        log::debug!("comm {stale} replaced by {}", msg.comm_id);
                        self.in_channel.close();
                        self.comm_id = Some(msg.comm_id);
                    }
                    None => self.comm_id = Some(msg.comm_id),
                }
                self.in_channel.mark_open();
                None
            }
            MsgKind::Data => {
                if self.comm_id.as_ref() != Some(&msg.comm_id) || !self.in_channel.is_open() {
                    log::debug!("dropping data message from stale comm {}", msg.comm_id);
                    return None;
                }
                match msg.data {
                    Some(payload) => Some(payload),
                    None => {
                        log::warn!("data message on comm {} had no payload", msg.comm_id);
                        None
                    }
                }
            }
        }
    }

    /// Closes the inbound channel. Best-effort and idempotent; a later open
    /// handshake re-establishes it.
    pub fn close_channels(&mut self) {
        self.in_channel.close();
        self.comm_id = None;
    }

    /// Releases everything the binding holds. Called when the notebook
    /// closes.
    pub fn teardown(&mut self) {
        self.close_channels();
        if let Some(mut sub) = self.subscription.take() {
            sub.release();
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn channel_open(&self) -> bool {
        self.in_channel.is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comms::MetricMap;
    use serde_json::json;

    fn session(path: &str, id: &str) -> Session {
        Session {
            id: SessionId::new(id),
            notebook_path: path.to_string(),
            status: SessionStatus::Connected,
        }
    }

    fn data(comm: &str, step: u64) -> ProgressMsg {
        ProgressMsg::data(
            CommId::new(comm),
            ProgressPayload {
                current_step: json!(step),
                ..Default::default()
            },
        )
    }

    #[test]
    fn rebinding_the_same_session_is_idempotent() {
        let mut binding = SessionBinding::new(session("A.ipynb", "k1"));
        binding.classify(ProgressMsg::open(CommId::new("c1")));
        binding.accumulator.push(MetricMap::new());

        assert!(!binding.bind(session("A.ipynb", "k1")));
        assert!(binding.channel_open());
        assert_eq!(binding.accumulator.len(), 1, "no duplicate reset");
    }

    #[test]
    fn rebinding_a_different_session_resets_state() {
        let mut binding = SessionBinding::new(session("A.ipynb", "k1"));
        binding.classify(ProgressMsg::open(CommId::new("c1")));
        binding.accumulator.push(MetricMap::new());

        assert!(binding.bind(session("A.ipynb", "k2")));
        assert!(!binding.channel_open());
        assert!(binding.accumulator.is_empty());
        assert!(binding.classify(data("c1", 1)).is_none(), "old comm is stale");
    }

    #[test]
    fn data_before_any_handshake_is_dropped() {
        let mut binding = SessionBinding::new(session("A.ipynb", "k1"));
        assert!(binding.classify(data("c1", 1)).is_none());
    }

    #[test]
    fn data_from_a_stale_comm_is_dropped_silently() {
        let mut binding = SessionBinding::new(session("A.ipynb", "k1"));
        binding.classify(ProgressMsg::open(CommId::new("c1")));
        assert!(binding.classify(data("c2", 1)).is_none());
        assert!(binding.classify(data("c1", 1)).is_some());
    }

    #[test]
    fn a_new_handshake_replaces_the_stale_comm() {
        let mut binding = SessionBinding::new(session("A.ipynb", "k1"));
        binding.classify(ProgressMsg::open(CommId::new("c1")));
        binding.classify(ProgressMsg::open(CommId::new("c2")));
        assert!(binding.classify(data("c1", 1)).is_none());
        assert!(binding.classify(data("c2", 1)).is_some());
    }

    #[test]
    fn duplicate_handshake_is_a_no_op() {
        let mut binding = SessionBinding::new(session("A.ipynb", "k1"));
        binding.classify(ProgressMsg::open(CommId::new("c1")));
        binding.classify(ProgressMsg::open(CommId::new("c1")));
        assert!(binding.channel_open());
        assert!(binding.classify(data("c1", 1)).is_some());
    }

    #[test]
    fn close_is_idempotent_and_reopenable() {
        let mut binding = SessionBinding::new(session("A.ipynb", "k1"));
        binding.classify(ProgressMsg::open(CommId::new("c1")));
        binding.close_channels();
        binding.close_channels();
        assert!(binding.classify(data("c1", 1)).is_none());

        binding.classify(ProgressMsg::open(CommId::new("c3")));
        assert!(binding.classify(data("c3", 1)).is_some());
    }
}
