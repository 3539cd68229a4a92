use feed_core::{update, Effect, HarvestState, Msg};
use feed_logging::{harvest_trace, set_harvest_tick};

use crate::extract::ExtractorError;
use crate::host::{Clock, FeedConsumer, FeedHost, MutationRecord, SystemClock};
use crate::scan::Scanner;
use crate::settings::HarvestSettings;

/// The harvesting automaton bound to one host and one consumer.
///
/// All entry points run to completion on the caller's thread; timer ticks and
/// mutation notices are fed in by whoever owns the event loop (see
/// [`crate::HarvestRuntime`]). Lifecycle decisions are made by
/// [`feed_core::update`]; this type only executes the resulting effects.
pub struct FeedHarvester<H, C> {
    host: H,
    consumer: C,
    scanner: Scanner,
    clock: Box<dyn Clock>,
    state: HarvestState,
    armed: bool,
    arm_generation: u64,
    tick: u64,
}

impl<H: FeedHost, C: FeedConsumer> FeedHarvester<H, C> {
    pub fn new(host: H, consumer: C, settings: &HarvestSettings) -> Result<Self, ExtractorError> {
        let scanner = Scanner::new(settings.base_url.clone())?;
        Ok(Self::with_scanner(host, consumer, scanner, settings))
    }

    pub fn with_scanner(
        host: H,
        consumer: C,
        scanner: Scanner,
        settings: &HarvestSettings,
    ) -> Self {
        Self {
            host,
            consumer,
            scanner,
            clock: Box::new(SystemClock),
            state: HarvestState::with_stall_threshold(settings.stall_threshold),
            armed: false,
            arm_generation: 0,
            tick: 0,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Begins a fresh session; a no-op while one is running.
    pub fn start(&mut self, limit: usize) {
        if !self.state.is_running() {
            self.tick = 0;
            set_harvest_tick(0);
        }
        self.dispatch(Msg::StartRequested { limit });
    }

    pub fn stop(&mut self) {
        self.dispatch(Msg::StopRequested);
    }

    /// Growth trigger: samples the extent, then either scrolls or ends a stalled session.
    pub fn handle_timer_tick(&mut self) {
        if !self.armed {
            return;
        }
        self.tick += 1;
        set_harvest_tick(self.tick);
        let extent = self.host.scroll_extent();
        self.dispatch(Msg::TimerTick { extent });
    }

    pub fn handle_mutations(&mut self, records: &[MutationRecord]) {
        if !self.armed {
            return;
        }
        let added = records.iter().map(|record| record.added_nodes).sum();
        self.dispatch(Msg::NodesAdded { added });
    }

    pub fn state(&self) -> &HarvestState {
        &self.state
    }

    /// True between arming and teardown of a session's timer and subscription.
    pub fn triggers_armed(&self) -> bool {
        self.armed
    }

    /// Bumped on every arm, so an event loop can tell a re-armed timer from a stale one.
    pub fn arm_generation(&self) -> u64 {
        self.arm_generation
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::ArmTriggers => {
                self.armed = true;
                self.arm_generation += 1;
                self.host.observe();
            }
            Effect::DisarmTriggers => {
                self.armed = false;
                self.host.unobserve();
            }
            Effect::Scan => {
                let now = self.clock.now_millis();
                let batch = self.scanner.scan(self.host.document(), &mut self.state, now);
                self.dispatch(Msg::ScanCompleted { batch });
            }
            Effect::ScrollTo { position } => {
                harvest_trace!("scrolling to {}", position);
                self.host.scroll_to(position);
            }
            Effect::Deliver(batch) => self.consumer.on_data(batch),
            Effect::Finish { reason } => self.consumer.on_finish(reason),
        }
    }
}
