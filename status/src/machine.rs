//! The progress state machine.
//!
//! One pure transition function interprets everything that can happen to a
//! session's progress state: data messages, session-status transitions, and
//! the display-window timeout. It returns the next snapshot plus the side
//! effects the caller must perform afterwards; nothing here touches a
//! channel or a timer, so a re-entrant callback can never observe a
//! half-applied update.

use comms::{coerce, ProgressPayload, SessionStatus};

use crate::snapshot::{Phase, ProgressSnapshot, INTERRUPTED};

/// Input to one transition.
#[derive(Debug)]
pub enum Event {
    /// A data message arrived on the live inbound channel.
    Data(ProgressPayload),
    /// The bound session reported a status transition.
    Status(SessionStatus),
    /// The post-completion/interruption display window elapsed with no
    /// newer message.
    ResetElapsed,
}

/// Side effects requested by a transition, executed in order by the caller
/// after the new snapshot is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Append the new snapshot's metric slice to the run history.
    Append,
    /// Drop the accumulated history (new run, restart, or reset).
    ClearHistory,
    /// Relay the current state to the open viewer for this path.
    /// `update_graph` carries the redraw-worthiness decision.
    Relay { update_graph: bool },
    /// Arm the display-window reset, superseding any pending one.
    ScheduleReset,
    /// Disarm a pending display-window reset.
    CancelReset,
    /// Close this session's inbound channel (run finished or interrupted).
    CloseChannels,
}

/// Applies one event to the previous snapshot.
pub fn transition(prev: &ProgressSnapshot, event: Event) -> (ProgressSnapshot, Vec<Effect>) {
    match event {
        Event::Data(payload) => on_data(prev, payload),
        Event::Status(status) => on_status(prev, status),
        Event::ResetElapsed => on_reset(prev),
    }
}

fn on_data(prev: &ProgressSnapshot, payload: ProgressPayload) -> (ProgressSnapshot, Vec<Effect>) {
    let overall = coerce::round2(coerce::to_f64(&payload.total_progress));
    let step_progress = coerce::round2(coerce::to_f64(&payload.current_progress));
    let step = coerce::to_u64(&payload.current_step);
    let run_time = coerce::to_u64(&payload.run_time);
    let done = overall == 100.0;

    let mut effects = Vec::new();

    // A genuine message supersedes a pending reset; the timeout must not
    // fire against state it was never scheduled for.
    effects.push(Effect::CancelReset);

    // Step index regressing means a new run started on the same channel.
    if step < prev.step {
        log::info!("step regressed from {} to {step}, starting a new run", prev.step);
        effects.push(Effect::ClearHistory);
    }

    // Charts stay hidden until a full second of runtime has accumulated.
    let display_graph = run_time > 0;

    // Redraw-worthiness: only a step boundary or the completion edge is
    // worth re-rendering a chart for. Progress ticks within a step update
    // the counters and nothing else.
    let step_changed = step != prev.step && step != 0;
    let just_done = done && !prev.done;
    let update_graph = step_changed || just_done;

    if step_changed && display_graph {
        effects.push(Effect::Append);
    }

    effects.push(Effect::Relay { update_graph });

    if done {
        effects.push(Effect::ScheduleReset);
        effects.push(Effect::CloseChannels);
    }

    let next = ProgressSnapshot {
        overall,
        step_progress,
        step,
        run_time,
        metrics: payload.data_set,
        chart_specs: payload.spec,
        done,
        display_graph,
    };
    (next, effects)
}

fn on_status(prev: &ProgressSnapshot, status: SessionStatus) -> (ProgressSnapshot, Vec<Effect>) {
    match status {
        // Interruption: the kernel went idle mid-run.
        SessionStatus::Idle if prev.overall > 0.0 && prev.overall < 100.0 => {
            log::info!("session went idle at {:.2}%, marking run interrupted", prev.overall);
            let next = ProgressSnapshot {
                overall: INTERRUPTED,
                done: false,
                ..prev.clone()
            };
            (next, vec![Effect::ScheduleReset, Effect::CloseChannels])
        }
        // Restart: everything is discarded; the inbound channel re-registers
        // once the new kernel instance reports connected.
        SessionStatus::Restarting => {
            log::info!("session restarting, clearing progress state");
            (
                ProgressSnapshot::default(),
                vec![Effect::CancelReset, Effect::ClearHistory, Effect::CloseChannels],
            )
        }
        _ => (prev.clone(), Vec::new()),
    }
}

fn on_reset(prev: &ProgressSnapshot) -> (ProgressSnapshot, Vec<Effect>) {
    match prev.phase() {
        Phase::Completed | Phase::Interrupted => {
            (ProgressSnapshot::default(), vec![Effect::ClearHistory])
        }
        // A newer message superseded the timeout before it was canceled.
        _ => (prev.clone(), Vec::new()),
    }
}
