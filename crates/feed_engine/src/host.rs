use scraper::Html;
use tokio::sync::mpsc;

use feed_core::{FinishReason, HarvestedRecord};

/// One observed structural change. Only additions matter to the harvester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutationRecord {
    pub added_nodes: usize,
}

/// Read-only view over the rendered feed plus the scroll and subscription
/// primitives the harvester drives.
pub trait FeedHost {
    /// The currently rendered document.
    fn document(&self) -> &Html;
    /// Total scrollable extent of the document.
    fn scroll_extent(&self) -> u64;
    fn scroll_to(&mut self, position: u64);
    /// Begin forwarding subtree additions under the document root to the
    /// host's [`MutationSink`].
    fn observe(&mut self);
    /// Stop forwarding. Nothing is delivered after this returns.
    fn unobserve(&mut self);
}

/// Receives batches from the harvester. Called on the harvester's thread.
pub trait FeedConsumer {
    /// Non-empty, in document order, never repeating an id within a session.
    fn on_data(&mut self, records: Vec<HarvestedRecord>);
    /// Exactly once per session, after teardown.
    fn on_finish(&mut self, reason: FinishReason);
}

pub trait Clock: Send {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock pinned to one instant; surrogate ids become reproducible.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Sending half handed to a host at construction.
#[derive(Debug, Clone)]
pub struct MutationSink {
    tx: mpsc::UnboundedSender<Vec<MutationRecord>>,
}

impl MutationSink {
    /// Returns false once the receiving side is gone.
    pub fn notify(&self, records: Vec<MutationRecord>) -> bool {
        self.tx.send(records).is_ok()
    }
}

/// Receiving half, drained by the runtime loop (or by hand in tests).
#[derive(Debug)]
pub struct MutationInbox {
    rx: mpsc::UnboundedReceiver<Vec<MutationRecord>>,
}

impl MutationInbox {
    pub async fn recv(&mut self) -> Option<Vec<MutationRecord>> {
        self.rx.recv().await
    }

    pub fn try_next(&mut self) -> Option<Vec<MutationRecord>> {
        self.rx.try_recv().ok()
    }

    /// Drops every queued batch, returning how many there were.
    pub fn discard_pending(&mut self) -> usize {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

pub fn mutation_channel() -> (MutationSink, MutationInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MutationSink { tx }, MutationInbox { rx })
}
