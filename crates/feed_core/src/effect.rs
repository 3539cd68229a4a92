use crate::HarvestedRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Arm the repeating timer and the change-notification subscription.
    ArmTriggers,
    /// Cancel the timer and the subscription.
    DisarmTriggers,
    /// Scan the currently rendered document for new records.
    Scan,
    /// Scroll the host view.
    ScrollTo { position: u64 },
    /// Hand a non-empty batch to the consumer.
    Deliver(Vec<HarvestedRecord>),
    /// Signal the consumer that the session is over.
    Finish { reason: FinishReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Requested,
    LimitReached,
    Stalled,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Requested => write!(f, "stop requested"),
            FinishReason::LimitReached => write!(f, "limit reached"),
            FinishReason::Stalled => write!(f, "feed stalled"),
        }
    }
}
