use crate::{Admission, DedupLedger, Growth, StallDetector, DEFAULT_STALL_THRESHOLD};

/// Lifecycle phase. `Stopped` behaves like `Idle` for the next `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// Session state owned by one automaton. Mutated by [`crate::update`] and,
/// during a scan, through [`HarvestState::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestState {
    phase: Phase,
    ledger: DedupLedger,
    stall: StallDetector,
    stall_threshold: u32,
    session: u64,
}

impl HarvestState {
    pub fn new() -> Self {
        Self::with_stall_threshold(DEFAULT_STALL_THRESHOLD)
    }

    pub fn with_stall_threshold(stall_threshold: u32) -> Self {
        Self {
            phase: Phase::Idle,
            ledger: DedupLedger::default(),
            stall: StallDetector::new(stall_threshold),
            stall_threshold,
            session: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Number of sessions started on this state so far.
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn limit(&self) -> usize {
        self.ledger.limit()
    }

    pub fn emitted(&self) -> usize {
        self.ledger.emitted()
    }

    pub fn limit_reached(&self) -> bool {
        self.ledger.limit_reached()
    }

    pub fn stall_ticks(&self) -> u32 {
        self.stall.stall_ticks()
    }

    /// Offers a candidate id to the dedup ledger. Refused outside a running session.
    pub fn admit(&mut self, id: &str) -> Admission {
        if !self.is_running() {
            return Admission::Refused;
        }
        self.ledger.admit(id)
    }

    pub(crate) fn begin_session(&mut self, limit: usize) {
        self.phase = Phase::Running;
        self.ledger = DedupLedger::new(limit);
        self.stall = StallDetector::new(self.stall_threshold);
        self.session += 1;
    }

    pub(crate) fn end_session(&mut self) {
        self.phase = Phase::Stopped;
        self.ledger = DedupLedger::default();
        self.stall = StallDetector::new(self.stall_threshold);
    }

    pub(crate) fn observe_extent(&mut self, extent: u64) -> Growth {
        self.stall.observe(extent)
    }

    pub(crate) fn reset_stall(&mut self) {
        self.stall.reset_counter();
    }
}

impl Default for HarvestState {
    fn default() -> Self {
        Self::new()
    }
}
