use comms::{RelayMsg, SessionBus};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::model::ViewerModel;

/// Title sentinel meaning "leave the current title alone".
const NO_TITLE: &str = "none";

/// Drives one viewer surface from the relay channel.
pub struct ViewerState {
    model: ViewerModel,
    updates: UnboundedReceiver<RelayMsg>,
}

impl ViewerState {
    /// Mounts a viewer for `notebook_path`: performs the relay handshake
    /// and returns the state the updates will flow into. If training has
    /// already progressed, the first update is the full-state catch-up.
    pub fn mount(bus: &SessionBus, notebook_path: &str) -> Self {
        let updates = bus.open_viewer(notebook_path);
        log::debug!("viewer mounted for {notebook_path}");
        Self {
            model: ViewerModel::default(),
            updates,
        }
    }

    /// The current model for rendering.
    pub fn view(&self) -> &ViewerModel {
        &self.model
    }

    /// Drains all updates that are ready right now. Non-blocking; call once
    /// per frame.
    pub fn tick(&mut self) {
        while let Ok(msg) = self.updates.try_recv() {
            self.apply(msg);
        }
    }

    /// Waits for the next update and applies it.
    ///
    /// # Returns
    /// The refreshed model, or `None` once the relay is gone.
    pub async fn next(&mut self) -> Option<&ViewerModel> {
        let msg = self.updates.recv().await?;
        self.apply(msg);
        Some(&self.model)
    }

    fn apply(&mut self, msg: RelayMsg) {
        match msg {
            // Handshakes travel viewer -> status; nothing to do on an echo.
            RelayMsg::Open { .. } => {}
            RelayMsg::Update(update) => {
                let update = *update;
                if update.title != NO_TITLE {
                    self.model.title = update.title;
                }
                self.model.run_time = update.run_time;
                self.model.data_set = update.data_set;
                self.model.data_item = update.data_item;
                self.model.spec = update.spec;
                self.model.current_step = update.current_step;
                self.model.update_graph = update.update_graph;
                self.model.display_graph = update.display_graph;
                self.model.done = update.done;
            }
        }
    }
}
