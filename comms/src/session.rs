//! Session identity and the host event stream.
//!
//! The notebook host surfaces sessions, status transitions, and comm
//! delivery; all of it is flattened here into one ordered [`HostEvent`]
//! stream consumed by a single status loop. [`SessionBus`] is the
//! in-process stand-in for that host transport.

use std::fmt;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::msg::{ProgressMsg, RelayMsg};

/// Opaque kernel identity. A restarted kernel gets a fresh id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session status as reported by the notebook host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Connected,
    Idle,
    Restarting,
    Disconnected,
}

/// One compute kernel bound to one notebook document.
///
/// Replaced, never mutated, when the host reports a kernel change; the
/// notebook path doubles as the human-readable registry key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub notebook_path: String,
    pub status: SessionStatus,
}

/// Everything the host surfaces to the status side, in arrival order.
#[derive(Debug)]
pub enum HostEvent {
    /// A notebook acquired a (new) kernel.
    SessionChanged(Session),
    /// The kernel bound to `notebook_path` reported a status transition.
    StatusChanged {
        notebook_path: String,
        status: SessionStatus,
    },
    /// An inbound message arrived on the progress target.
    Progress {
        notebook_path: String,
        msg: ProgressMsg,
    },
    /// A viewer surface opened the relay channel and sent `{open: true}`;
    /// `tx` is the outbound half the relay should send updates on.
    ViewerOpen {
        notebook_path: String,
        tx: UnboundedSender<RelayMsg>,
    },
    /// The viewer surface for `notebook_path` went away.
    ViewerClosed { notebook_path: String },
    /// The notebook itself closed; all state for its path is torn down.
    NotebookClosed { notebook_path: String },
}

/// Handle for injecting host events into the status loop.
///
/// Cloneable; publishers and viewer surfaces each hold one. Every method is
/// best-effort: once the loop is gone, events are dropped with a debug log.
#[derive(Debug, Clone)]
pub struct SessionBus {
    tx: UnboundedSender<HostEvent>,
}

impl SessionBus {
    /// Creates the bus and the event stream the status loop consumes.
    pub fn new() -> (Self, UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: HostEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("status loop gone, host event dropped");
        }
    }

    pub fn session_changed(&self, session: Session) {
        self.emit(HostEvent::SessionChanged(session));
    }

    pub fn status_changed(&self, notebook_path: &str, status: SessionStatus) {
        self.emit(HostEvent::StatusChanged {
            notebook_path: notebook_path.to_string(),
            status,
        });
    }

    /// Delivers one inbound progress message for `notebook_path`.
    pub fn publish(&self, notebook_path: &str, msg: ProgressMsg) {
        self.emit(HostEvent::Progress {
            notebook_path: notebook_path.to_string(),
            msg,
        });
    }

    /// Performs the viewer handshake: registers the relay for
    /// `notebook_path` and returns the receiving half of the channel the
    /// updates will arrive on.
    pub fn open_viewer(&self, notebook_path: &str) -> UnboundedReceiver<RelayMsg> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.emit(HostEvent::ViewerOpen {
            notebook_path: notebook_path.to_string(),
            tx,
        });
        rx
    }

    pub fn close_viewer(&self, notebook_path: &str) {
        self.emit(HostEvent::ViewerClosed {
            notebook_path: notebook_path.to_string(),
        });
    }

    pub fn close_notebook(&self, notebook_path: &str) {
        self.emit(HostEvent::NotebookClosed {
            notebook_path: notebook_path.to_string(),
        });
    }
}
