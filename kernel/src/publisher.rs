use std::sync::atomic::{AtomicU64, Ordering};

use comms::{ChartSpec, CommId, MetricMap, ProgressMsg, ProgressPayload, SessionBus};
use serde_json::json;

/// Source of process-unique comm identities.
static NEXT_COMM: AtomicU64 = AtomicU64::new(1);

/// The progress-publishing API held by a training callback inside the
/// compute session.
///
/// Counters follow the publishing convention: each of `total_steps` steps
/// iterates over `size` units. Percentages are derived from the counters,
/// never supplied directly; a zero denominator therefore surfaces as `NaN`
/// downstream instead of a fake 0%.
///
/// Construction registers the comm and sends the open handshake; reaching
/// 100% total progress closes the comm. A publisher whose comm is closed
/// drops further sends silently.
pub struct ProgressPublisher {
    bus: SessionBus,
    notebook_path: String,
    comm_id: CommId,
    spec: Vec<ChartSpec>,
    size: u64,
    total_steps: u64,
    current_step: u64,
    current_progress: u64,
    total_progress: u64,
    runtime: u64,
    data_set: MetricMap,
    closed: bool,
}

impl ProgressPublisher {
    /// Registers the progress comm for `notebook_path` and performs the
    /// open handshake.
    ///
    /// # Args
    /// * `bus` - Transport into the status loop.
    /// * `notebook_path` - The notebook this training run belongs to.
    /// * `spec` - Chart descriptors describing the desired visualization.
    /// * `size` - Units of work per step.
    /// * `total_steps` - Steps in the run.
    pub fn new(
        bus: SessionBus,
        notebook_path: impl Into<String>,
        spec: Vec<ChartSpec>,
        size: u64,
        total_steps: u64,
    ) -> Self {
        let notebook_path = notebook_path.into();
        let comm_id = CommId::new(format!("plyto-{}", NEXT_COMM.fetch_add(1, Ordering::Relaxed)));
        log::info!("registering progress comm {comm_id} for {notebook_path}");
        bus.publish(&notebook_path, ProgressMsg::open(comm_id.clone()));
        Self {
            bus,
            notebook_path,
            comm_id,
            spec,
            size,
            total_steps,
            current_step: 1,
            current_progress: 0,
            total_progress: 0,
            runtime: 0,
            data_set: MetricMap::new(),
            closed: false,
        }
    }

    pub fn update_current_progress(&mut self, progress: u64) {
        self.current_progress = progress;
    }

    pub fn update_total_progress(&mut self, progress: u64) {
        self.total_progress = progress;
    }

    pub fn update_size(&mut self, size: u64) {
        self.size = size;
    }

    pub fn update_total_steps(&mut self, steps: u64) {
        self.total_steps = steps;
    }

    pub fn update_current_step(&mut self, step: u64) {
        self.current_step = step;
    }

    pub fn update_runtime(&mut self, runtime: u64) {
        self.runtime = runtime;
    }

    /// Replaces the current metric slice.
    pub fn update_data_set(&mut self, data_set: MetricMap) {
        self.data_set = data_set;
    }

    /// The total progress percentage the next send will carry.
    pub fn total_percent(&self) -> f64 {
        percent(self.total_progress, self.size * self.total_steps)
    }

    /// Sends one data message with the current counters; closes the comm
    /// once the run completes.
    pub fn send_data(&mut self) {
        if self.closed {
            log::debug!("progress comm {} already closed, not sending", self.comm_id);
            return;
        }

        let total = self.total_percent();
        let payload = ProgressPayload {
            total_progress: json!(total),
            current_progress: json!(percent(self.current_progress, self.size)),
            current_step: json!(self.current_step),
            run_time: json!(self.runtime),
            spec: self.spec.clone(),
            data_set: self.data_set.clone(),
        };
        self.bus
            .publish(&self.notebook_path, ProgressMsg::data(self.comm_id.clone(), payload));

        if total >= 100.0 {
            self.close();
        }
    }

    /// Closes the comm. Idempotent.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            log::info!("progress comm {} closed", self.comm_id);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn comm_id(&self) -> &CommId {
        &self.comm_id
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        // No meaningful percentage; reads back as NaN downstream.
        f64::NAN
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comms::{HostEvent, MsgKind};

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<HostEvent>) -> Vec<ProgressMsg> {
        let mut msgs = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let HostEvent::Progress { msg, .. } = event {
                msgs.push(msg);
            }
        }
        msgs
    }

    #[tokio::test]
    async fn construction_sends_the_open_handshake() {
        let (bus, mut rx) = SessionBus::new();
        let publisher = ProgressPublisher::new(bus, "A.ipynb", Vec::new(), 10, 2);

        let msgs = drain(&mut rx);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].kind, MsgKind::Open);
        assert_eq!(&msgs[0].comm_id, publisher.comm_id());
    }

    #[tokio::test]
    async fn percentages_are_derived_from_the_counters() {
        let (bus, mut rx) = SessionBus::new();
        let mut publisher = ProgressPublisher::new(bus, "A.ipynb", Vec::new(), 10, 2);
        let _ = drain(&mut rx);

        publisher.update_current_step(1);
        publisher.update_current_progress(5);
        publisher.update_total_progress(5);
        publisher.send_data();

        let msgs = drain(&mut rx);
        let data = msgs[0].data.as_ref().unwrap();
        assert_eq!(comms::coerce::to_f64(&data.current_progress), 50.0);
        assert_eq!(comms::coerce::to_f64(&data.total_progress), 25.0);
    }

    #[tokio::test]
    async fn completion_closes_the_comm_and_stops_sending() {
        let (bus, mut rx) = SessionBus::new();
        let mut publisher = ProgressPublisher::new(bus, "A.ipynb", Vec::new(), 10, 1);
        let _ = drain(&mut rx);

        publisher.update_total_progress(10);
        publisher.send_data();
        assert!(publisher.is_closed());

        publisher.send_data();
        assert_eq!(drain(&mut rx).len(), 1, "no sends after close");
    }

    #[tokio::test]
    async fn zero_sized_runs_surface_nan_not_zero() {
        let (bus, mut rx) = SessionBus::new();
        let mut publisher = ProgressPublisher::new(bus, "A.ipynb", Vec::new(), 0, 0);
        let _ = drain(&mut rx);

        publisher.send_data();
        let msgs = drain(&mut rx);
        let data = msgs[0].data.as_ref().unwrap();
        // json! turns NaN into null; the coercion layer reads it back as NaN.
        assert!(comms::coerce::to_f64(&data.total_progress).is_nan());
    }
}
