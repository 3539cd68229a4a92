/// Consecutive unchanged ticks after which the feed is considered exhausted.
pub const DEFAULT_STALL_THRESHOLD: u32 = 5;

/// Result of sampling the scrollable extent on a timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    Grew,
    Unchanged { stall_ticks: u32, threshold: u32 },
    Stalled,
}

/// Infers end-of-feed from a scrollable extent that stops changing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StallDetector {
    last_extent: u64,
    stall_ticks: u32,
    threshold: u32,
}

impl StallDetector {
    /// A zero threshold is treated as one.
    pub fn new(threshold: u32) -> Self {
        Self {
            last_extent: 0,
            stall_ticks: 0,
            threshold: threshold.max(1),
        }
    }

    pub fn observe(&mut self, extent: u64) -> Growth {
        if extent == self.last_extent {
            self.stall_ticks += 1;
        } else {
            self.stall_ticks = 0;
            self.last_extent = extent;
        }

        if self.stall_ticks >= self.threshold {
            Growth::Stalled
        } else if self.stall_ticks > 0 {
            Growth::Unchanged {
                stall_ticks: self.stall_ticks,
                threshold: self.threshold,
            }
        } else {
            Growth::Grew
        }
    }

    /// New nodes were observed; the recorded extent is kept.
    pub fn reset_counter(&mut self) {
        self.stall_ticks = 0;
    }

    pub fn stall_ticks(&self) -> u32 {
        self.stall_ticks
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

impl Default for StallDetector {
    fn default() -> Self {
        Self::new(DEFAULT_STALL_THRESHOLD)
    }
}
