//! Feed harvester engine: document-facing side of the automaton.
//!
//! Candidate selection and field extraction over a rendered feed, the
//! synchronous automaton shell that executes core effects, and a tokio-driven
//! runtime that feeds it timer ticks and mutation notices.
mod consumer;
mod decode;
mod extract;
mod harvester;
mod host;
mod links;
mod runtime;
mod scan;
mod settings;
mod snapshot;
mod surrogate;

pub use consumer::{ChannelConsumer, HarvestEvent};
pub use decode::{decode_snapshot, DecodeError, DecodedSnapshot};
pub use extract::{CardExtractor, CardIdentity, ExtractorError};
pub use harvester::FeedHarvester;
pub use host::{
    mutation_channel, Clock, FeedConsumer, FeedHost, FixedClock, MutationInbox, MutationRecord,
    MutationSink, SystemClock,
};
pub use links::normalize_link;
pub use runtime::{HarvestRuntime, RuntimeError, RuntimeHandle};
pub use scan::{CandidateStrategy, Scanner};
pub use settings::{HarvestSettings, DEFAULT_BASE_URL, DEFAULT_TICK_INTERVAL};
pub use snapshot::SnapshotHost;
pub use surrogate::surrogate_id;
