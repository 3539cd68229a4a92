use feed_logging::{harvest_debug, harvest_info};

use crate::{Effect, FinishReason, Growth, HarvestState, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: HarvestState, msg: Msg) -> (HarvestState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested { limit } => {
            if state.is_running() {
                harvest_debug!("start ignored: session {} already running", state.session());
                Vec::new()
            } else {
                state.begin_session(limit);
                harvest_info!("session {} started with limit {}", state.session(), limit);
                // Arming never fires synchronously, so the scan still runs first.
                vec![Effect::ArmTriggers, Effect::Scan]
            }
        }
        Msg::StopRequested => finish(&mut state, FinishReason::Requested),
        Msg::TimerTick { extent } => {
            if !state.is_running() {
                return (state, Vec::new());
            }
            match state.observe_extent(extent) {
                Growth::Stalled => {
                    harvest_info!("extent stuck at {}; feed exhausted", extent);
                    finish(&mut state, FinishReason::Stalled)
                }
                Growth::Unchanged {
                    stall_ticks,
                    threshold,
                } => {
                    harvest_debug!("no extent change ({}/{})", stall_ticks, threshold);
                    vec![Effect::ScrollTo { position: extent }]
                }
                Growth::Grew => vec![Effect::ScrollTo { position: extent }],
            }
        }
        Msg::NodesAdded { added } => {
            if state.is_running() && added > 0 {
                state.reset_stall();
                vec![Effect::Scan]
            } else {
                Vec::new()
            }
        }
        Msg::ScanCompleted { batch } => {
            if !state.is_running() {
                return (state, Vec::new());
            }
            let mut effects = Vec::with_capacity(3);
            if !batch.is_empty() {
                harvest_debug!(
                    "scan produced {} new records ({} total)",
                    batch.len(),
                    state.emitted()
                );
                effects.push(Effect::Deliver(batch));
            }
            if state.limit_reached() {
                effects.extend(finish(&mut state, FinishReason::LimitReached));
            }
            effects
        }
    };

    (state, effects)
}

/// Shared teardown for every termination cause. No-op unless running, so the
/// finish effect is produced once per session.
fn finish(state: &mut HarvestState, reason: FinishReason) -> Vec<Effect> {
    if !state.is_running() {
        return Vec::new();
    }
    harvest_info!(
        "session {} stopped ({}); total {}",
        state.session(),
        reason,
        state.emitted()
    );
    state.end_session();
    vec![Effect::DisarmTriggers, Effect::Finish { reason }]
}
