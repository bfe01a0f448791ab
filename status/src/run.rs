//! The single-task status loop.
//!
//! All channel callbacks, status transitions, and display-window timeouts
//! for every tracked notebook are applied here, on one task, in arrival
//! order per channel. Per-path state lives in its own [`SessionBinding`];
//! nothing is shared across paths, so no ordering is assumed across
//! sessions.

use std::collections::HashMap;

use comms::{HostEvent, ProgressMsg, RelayMsg, RelayUpdate, Session, SessionStatus};
use futures::StreamExt;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::time::{delay_queue, DelayQueue};

use crate::{
    binding::SessionBinding,
    config::StatusConfig,
    machine::{self, Effect, Event},
    relay::ViewerRelay,
    snapshot::ProgressSnapshot,
};

/// Drives the progress protocol for every tracked notebook path.
pub struct StatusLoop {
    cfg: StatusConfig,
    events: UnboundedReceiver<HostEvent>,
    sessions: HashMap<String, SessionBinding>,
    relay: ViewerRelay,
    /// Pending display-window resets, one at most per path.
    resets: DelayQueue<String>,
    reset_keys: HashMap<String, delay_queue::Key>,
}

impl StatusLoop {
    /// Creates the loop over a host event stream.
    ///
    /// # Args
    /// * `cfg` - Loop tunables.
    /// * `events` - The receiving half handed out by `SessionBus::new`.
    pub fn new(cfg: StatusConfig, events: UnboundedReceiver<HostEvent>) -> Self {
        Self {
            cfg,
            events,
            sessions: HashMap::new(),
            relay: ViewerRelay::new(),
            resets: DelayQueue::new(),
            reset_keys: HashMap::new(),
        }
    }

    /// Runs until the host event stream closes.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
                Some(expired) = self.resets.next(), if !self.resets.is_empty() => {
                    let path = expired.into_inner();
                    self.reset_keys.remove(&path);
                    log::debug!("display window elapsed for {path}");
                    self.apply(&path, Event::ResetElapsed);
                }
            }
        }
        log::info!("host event stream closed, status loop stopping");
    }

    /// Applies one host event synchronously. `run` drives this from the
    /// stream; tests may call it directly.
    pub fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::SessionChanged(session) => self.on_session_changed(session),
            HostEvent::StatusChanged {
                notebook_path,
                status,
            } => self.on_status_changed(&notebook_path, status),
            HostEvent::Progress { notebook_path, msg } => self.on_progress(&notebook_path, msg),
            HostEvent::ViewerOpen { notebook_path, tx } => self.on_viewer_open(&notebook_path, tx),
            HostEvent::ViewerClosed { notebook_path } => self.relay.close(&notebook_path),
            HostEvent::NotebookClosed { notebook_path } => self.on_notebook_closed(&notebook_path),
        }
    }

    /// The latest snapshot for `path`, when the path is tracked.
    pub fn snapshot(&self, path: &str) -> Option<&ProgressSnapshot> {
        self.sessions.get(path).map(|b| &b.snapshot)
    }

    fn on_session_changed(&mut self, session: Session) {
        let path = session.notebook_path.clone();
        match self.sessions.get_mut(&path) {
            Some(binding) => {
                if binding.bind(session) {
                    // The old session's pending reset must not fire against
                    // the new session's state.
                    self.cancel_reset(&path);
                }
            }
            None => {
                log::info!("tracking session for {path}");
                self.sessions.insert(path, SessionBinding::new(session));
            }
        }
    }

    fn on_status_changed(&mut self, path: &str, status: SessionStatus) {
        let Some(binding) = self.sessions.get_mut(path) else {
            log::debug!("status change for untracked notebook {path}");
            return;
        };
        binding.note_status(status);
        self.apply(path, Event::Status(status));
    }

    fn on_progress(&mut self, path: &str, msg: ProgressMsg) {
        let Some(binding) = self.sessions.get_mut(path) else {
            log::debug!("progress message for untracked notebook {path}");
            return;
        };
        if let Some(payload) = binding.classify(msg) {
            self.apply(path, Event::Data(payload));
        }
    }

    fn on_viewer_open(&mut self, path: &str, tx: UnboundedSender<RelayMsg>) {
        self.relay.open(path, tx);

        // State sync on join: a late joiner gets the whole accumulated run
        // in one message, applied without animating a redraw.
        let sync = self.sessions.get(path).and_then(|binding| {
            if binding.accumulator.is_empty() {
                return None;
            }
            let mut update = compose_update(binding, path);
            update.update_graph = false;
            update.display_graph = false;
            Some(update)
        });
        if let Some(update) = sync {
            log::debug!("late-join sync for {path}");
            self.relay.send(path, update);
        }
    }

    fn on_notebook_closed(&mut self, path: &str) {
        self.cancel_reset(path);
        self.relay.remove(path);
        if let Some(mut binding) = self.sessions.remove(path) {
            binding.teardown();
            log::info!("dropped state for closed notebook {path}");
        }
    }

    /// Runs one machine transition for `path` and performs its effects, in
    /// order, after the new snapshot is installed.
    fn apply(&mut self, path: &str, event: Event) {
        let Some(binding) = self.sessions.get_mut(path) else {
            return;
        };
        let (next, effects) = machine::transition(&binding.snapshot, event);
        binding.snapshot = next;
        for effect in effects {
            self.perform(path, effect);
        }
    }

    fn perform(&mut self, path: &str, effect: Effect) {
        match effect {
            Effect::Append => {
                if let Some(binding) = self.sessions.get_mut(path) {
                    binding.accumulator.push(binding.snapshot.metrics.clone());
                }
            }
            Effect::ClearHistory => {
                if let Some(binding) = self.sessions.get_mut(path) {
                    binding.accumulator.clear();
                }
            }
            Effect::Relay { update_graph } => {
                if !self.relay.is_sending(path) {
                    return;
                }
                if let Some(binding) = self.sessions.get(path) {
                    let mut update = compose_update(binding, path);
                    update.update_graph = update_graph;
                    self.relay.send(path, update);
                }
            }
            Effect::ScheduleReset => self.schedule_reset(path),
            Effect::CancelReset => self.cancel_reset(path),
            Effect::CloseChannels => {
                if let Some(binding) = self.sessions.get_mut(path) {
                    binding.close_channels();
                }
            }
        }
    }

    fn schedule_reset(&mut self, path: &str) {
        let delay = self.cfg.reset_delay();
        match self.reset_keys.get(path) {
            Some(key) => self.resets.reset(key, delay),
            None => {
                let key = self.resets.insert(path.to_string(), delay);
                self.reset_keys.insert(path.to_string(), key);
            }
        }
    }

    fn cancel_reset(&mut self, path: &str) {
        if let Some(key) = self.reset_keys.remove(path) {
            self.resets.remove(&key);
            log::debug!("pending reset for {path} superseded");
        }
    }
}

/// Builds the relay payload from a binding's current state. Callers set the
/// `update_graph`/`display_graph` flags for their context.
fn compose_update(binding: &SessionBinding, path: &str) -> RelayUpdate {
    let snapshot = &binding.snapshot;
    RelayUpdate {
        run_time: snapshot.run_time,
        data_set: binding.accumulator.to_vec(),
        data_item: snapshot.metrics.clone(),
        spec: snapshot.chart_specs.clone(),
        current_step: snapshot.step,
        update_graph: false,
        display_graph: snapshot.display_graph,
        done: snapshot.done,
        title: path.to_string(),
    }
}
