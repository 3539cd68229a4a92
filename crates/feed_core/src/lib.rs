//! Feed harvester core: pure lifecycle state machine, dedup ledger and stall detection.
mod effect;
mod ledger;
mod msg;
mod record;
mod stall;
mod state;
mod update;

pub use effect::{Effect, FinishReason};
pub use ledger::{Admission, DedupLedger};
pub use msg::Msg;
pub use record::{HarvestedRecord, UNKNOWN};
pub use stall::{Growth, StallDetector, DEFAULT_STALL_THRESHOLD};
pub use state::{HarvestState, Phase};
pub use update::update;
