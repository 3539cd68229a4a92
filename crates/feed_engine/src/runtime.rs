use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use feed_logging::{harvest_debug, harvest_info};

use crate::extract::ExtractorError;
use crate::harvester::FeedHarvester;
use crate::host::{
    mutation_channel, Clock, FeedConsumer, FeedHost, MutationInbox, MutationSink, SystemClock,
};
use crate::scan::Scanner;
use crate::settings::HarvestSettings;

const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to build harvest runtime: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Extractor(#[from] ExtractorError),
    #[error("harvest runtime is no longer running")]
    Closed,
    #[error("harvest runtime thread panicked")]
    Panicked,
}

enum RuntimeCommand {
    Start { limit: usize },
    Stop,
}

/// Control surface for a harvester running on its own thread.
pub struct RuntimeHandle {
    cmd_tx: mpsc::UnboundedSender<RuntimeCommand>,
    cancel: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl RuntimeHandle {
    pub fn start(&self, limit: usize) -> Result<(), RuntimeError> {
        self.cmd_tx
            .send(RuntimeCommand::Start { limit })
            .map_err(|_| RuntimeError::Closed)
    }

    pub fn stop(&self) -> Result<(), RuntimeError> {
        self.cmd_tx
            .send(RuntimeCommand::Stop)
            .map_err(|_| RuntimeError::Closed)
    }

    /// Ends any running session (its finish signal still fires) and joins the thread.
    pub fn shutdown(mut self) -> Result<(), RuntimeError> {
        self.cancel.cancel();
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| RuntimeError::Panicked),
            None => Ok(()),
        }
    }
}

impl Drop for RuntimeHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Runs a [`FeedHarvester`] on a dedicated thread with a current-thread tokio
/// runtime, so timer ticks, mutation notices and commands are handled one at
/// a time.
pub struct HarvestRuntime;

impl HarvestRuntime {
    /// `make_host` runs on the harvester thread and receives the sink the host
    /// must forward mutations to while observing.
    pub fn spawn<H, C, F>(
        make_host: F,
        consumer: C,
        settings: HarvestSettings,
    ) -> Result<RuntimeHandle, RuntimeError>
    where
        H: FeedHost + 'static,
        C: FeedConsumer + Send + 'static,
        F: FnOnce(MutationSink) -> H + Send + 'static,
    {
        Self::spawn_with_clock(make_host, consumer, settings, SystemClock)
    }

    pub fn spawn_with_clock<H, C, F, K>(
        make_host: F,
        consumer: C,
        settings: HarvestSettings,
        clock: K,
    ) -> Result<RuntimeHandle, RuntimeError>
    where
        H: FeedHost + 'static,
        C: FeedConsumer + Send + 'static,
        F: FnOnce(MutationSink) -> H + Send + 'static,
        K: Clock + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let scanner = Scanner::new(settings.base_url.clone())?;
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();

        let thread = thread::Builder::new()
            .name("feed-harvester".to_string())
            .spawn(move || {
                let (sink, inbox) = mutation_channel();
                let host = make_host(sink);
                let harvester = FeedHarvester::with_scanner(host, consumer, scanner, &settings)
                    .with_clock(clock);
                let period = settings.tick_interval.max(MIN_TICK_INTERVAL);
                runtime.block_on(event_loop(harvester, cmd_rx, inbox, loop_cancel, period));
            })?;

        Ok(RuntimeHandle {
            cmd_tx,
            cancel,
            thread: Some(thread),
        })
    }
}

async fn event_loop<H: FeedHost, C: FeedConsumer>(
    mut harvester: FeedHarvester<H, C>,
    mut commands: mpsc::UnboundedReceiver<RuntimeCommand>,
    mut inbox: MutationInbox,
    cancel: CancellationToken,
    period: Duration,
) {
    let mut ticker: Option<Interval> = None;
    let mut ticker_generation = 0u64;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                harvester.stop();
                break;
            }
            command = commands.recv() => match command {
                Some(RuntimeCommand::Start { limit }) => harvester.start(limit),
                Some(RuntimeCommand::Stop) => harvester.stop(),
                None => {
                    harvester.stop();
                    break;
                }
            },
            Some(records) = inbox.recv() => harvester.handle_mutations(&records),
            _ = next_tick(&mut ticker) => harvester.handle_timer_tick(),
        }

        if !harvester.triggers_armed() {
            if ticker.take().is_some() {
                discard_stale(&mut inbox);
            }
        } else if ticker.is_none() || ticker_generation != harvester.arm_generation() {
            // Notices queued before this arm belong to an earlier session.
            discard_stale(&mut inbox);
            // First tick one period after arming; the initial scan already ran.
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker = Some(interval);
            ticker_generation = harvester.arm_generation();
        }
    }

    harvest_info!(
        "harvest runtime shut down after {} sessions",
        harvester.state().session()
    );
}

fn discard_stale(inbox: &mut MutationInbox) {
    let dropped = inbox.discard_pending();
    if dropped > 0 {
        harvest_debug!("discarded {} stale mutation batches", dropped);
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    use feed_core::{FinishReason, HarvestedRecord};
    use scraper::Html;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use super::{event_loop, RuntimeCommand};
    use crate::harvester::FeedHarvester;
    use crate::host::{mutation_channel, FeedConsumer, FeedHost, MutationRecord};
    use crate::settings::HarvestSettings;

    struct CountingHost {
        document: Html,
        scans: Rc<Cell<usize>>,
    }

    impl FeedHost for CountingHost {
        fn document(&self) -> &Html {
            self.scans.set(self.scans.get() + 1);
            &self.document
        }

        fn scroll_extent(&self) -> u64 {
            100
        }

        fn scroll_to(&mut self, _position: u64) {}

        fn observe(&mut self) {}

        fn unobserve(&mut self) {}
    }

    struct NullConsumer;

    impl FeedConsumer for NullConsumer {
        fn on_data(&mut self, _records: Vec<HarvestedRecord>) {}

        fn on_finish(&mut self, _reason: FinishReason) {}
    }

    #[tokio::test]
    async fn notices_from_an_earlier_session_do_not_trigger_scans() {
        let scans = Rc::new(Cell::new(0));
        let host = CountingHost {
            document: Html::parse_document(
                r#"<article mid="1"><p class="detail_text">x</p></article>"#,
            ),
            scans: Rc::clone(&scans),
        };
        let mut harvester =
            FeedHarvester::new(host, NullConsumer, &HarvestSettings::default()).unwrap();
        let (sink, inbox) = mutation_channel();

        harvester.start(0);
        assert!(sink.notify(vec![MutationRecord { added_nodes: 2 }]));
        harvester.stop();
        assert_eq!(scans.get(), 1);

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        assert!(cmd_tx.send(RuntimeCommand::Start { limit: 0 }).is_ok());
        let run = event_loop(
            harvester,
            cmd_rx,
            inbox,
            CancellationToken::new(),
            Duration::from_secs(3600),
        );
        let _ = tokio::time::timeout(Duration::from_millis(50), run).await;

        // Only the new session's initial scan.
        assert_eq!(scans.get(), 2);
    }
}
