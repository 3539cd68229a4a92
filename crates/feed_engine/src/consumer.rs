use std::sync::mpsc;

use feed_core::{FinishReason, HarvestedRecord};

use crate::FeedConsumer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    Batch(Vec<HarvestedRecord>),
    Finished(FinishReason),
}

/// Forwards consumer callbacks over a channel, for consumers living on another thread.
pub struct ChannelConsumer {
    tx: mpsc::Sender<HarvestEvent>,
}

impl ChannelConsumer {
    pub fn new(tx: mpsc::Sender<HarvestEvent>) -> Self {
        Self { tx }
    }
}

impl FeedConsumer for ChannelConsumer {
    fn on_data(&mut self, records: Vec<HarvestedRecord>) {
        let _ = self.tx.send(HarvestEvent::Batch(records));
    }

    fn on_finish(&mut self, reason: FinishReason) {
        let _ = self.tx.send(HarvestEvent::Finished(reason));
    }
}
