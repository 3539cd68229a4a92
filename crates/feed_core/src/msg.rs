use crate::HarvestedRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Consumer asked for a new session. `limit == 0` means unlimited.
    StartRequested { limit: usize },
    /// Consumer asked to end the session early.
    StopRequested,
    /// Growth trigger fired; `extent` is the scrollable extent sampled before scrolling.
    TimerTick { extent: u64 },
    /// Change notification from the host; `added` is the number of added nodes.
    NodesAdded { added: usize },
    /// A scan finished; `batch` holds the records admitted by the ledger, in document order.
    ScanCompleted { batch: Vec<HarvestedRecord> },
}
