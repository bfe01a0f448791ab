//! End-to-end demo: a simulated two-epoch training run published into the
//! status loop, with a viewer mounting mid-run to exercise the late-join
//! sync. Run with `RUST_LOG=debug` to watch the protocol.

use std::time::Duration;

use anyhow::Result;
use comms::{ChartSpec, MetricMap, Session, SessionBus, SessionId, SessionStatus};
use kernel::ProgressPublisher;
use serde_json::json;
use status::{StatusConfig, StatusLoop};
use viewer::{present, ViewerState};

const NOTEBOOK: &str = "demo.ipynb";
const STEPS: u64 = 2;
const SIZE: u64 = 10;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let (bus, events) = SessionBus::new();
    let status_loop = tokio::spawn(StatusLoop::new(StatusConfig::default(), events).run());

    bus.session_changed(Session {
        id: SessionId::new("kernel-1"),
        notebook_path: NOTEBOOK.to_string(),
        status: SessionStatus::Connected,
    });

    let spec = vec![
        ChartSpec::new(json!({"name": "loss", "mark": "line"})),
        ChartSpec::new(json!({"name": "accuracy", "mark": "line"})),
    ];
    let mut publisher = ProgressPublisher::new(bus.clone(), NOTEBOOK, spec, SIZE, STEPS);

    let mut viewer: Option<ViewerState> = None;
    let mut runtime = 0;

    for step in 1..=STEPS {
        publisher.update_current_step(step);
        for unit in 1..=SIZE {
            publisher.update_current_progress(unit);
            publisher.update_total_progress((step - 1) * SIZE + unit);
            publisher.update_runtime(runtime);

            let mut slice = MetricMap::new();
            slice.insert("loss".into(), json!(1.0 / (runtime + 1) as f64));
            slice.insert("accuracy".into(), json!(0.5 + runtime as f64 * 0.02));
            publisher.update_data_set(slice);

            publisher.send_data();
            runtime += 1;
            tokio::time::sleep(Duration::from_millis(50)).await;

            if let Some(viewer) = viewer.as_mut() {
                viewer.tick();
                let model = viewer.view();
                log::info!(
                    "viewer: step {} runtime {} redraw {:?}",
                    model.current_step,
                    present::format_runtime(model.run_time),
                    present::redraw_targets(model),
                );
            }
        }

        if step == 1 {
            // Late joiner: mounts after a full epoch already ran.
            viewer = Some(ViewerState::mount(&bus, NOTEBOOK));
        }
    }

    // Let the done update land before tearing the host down.
    tokio::time::sleep(Duration::from_millis(100)).await;
    if let Some(viewer) = viewer.as_mut() {
        viewer.tick();
        let model = viewer.view();
        log::info!(
            "training done: {} slices over {}",
            model.data_set.len(),
            present::format_runtime(model.run_time),
        );
        for (name, value) in &model.data_item {
            log::info!("  {name} = {}", present::format_metric(value));
        }
    }

    drop(publisher);
    drop(bus);
    status_loop.await?;
    Ok(())
}
