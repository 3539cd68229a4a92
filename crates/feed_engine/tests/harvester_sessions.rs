use std::sync::Once;

use feed_core::{FinishReason, HarvestedRecord, Phase};
use feed_engine::{
    FeedConsumer, FeedHarvester, FeedHost, FixedClock, HarvestSettings, MutationRecord,
};
use pretty_assertions::assert_eq;
use scraper::Html;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(feed_logging::initialize_for_tests);
}

struct FakeHost {
    document: Html,
    extent: u64,
    observing: bool,
    observe_calls: usize,
    unobserve_calls: usize,
    scrolls: Vec<u64>,
}

impl FakeHost {
    fn new(html: &str, extent: u64) -> Self {
        Self {
            document: Html::parse_document(html),
            extent,
            observing: false,
            observe_calls: 0,
            unobserve_calls: 0,
            scrolls: Vec::new(),
        }
    }

    fn render(&mut self, html: &str, extent: u64) {
        self.document = Html::parse_document(html);
        self.extent = extent;
    }
}

impl FeedHost for FakeHost {
    fn document(&self) -> &Html {
        &self.document
    }

    fn scroll_extent(&self) -> u64 {
        self.extent
    }

    fn scroll_to(&mut self, position: u64) {
        self.scrolls.push(position);
    }

    fn observe(&mut self) {
        self.observing = true;
        self.observe_calls += 1;
    }

    fn unobserve(&mut self) {
        self.observing = false;
        self.unobserve_calls += 1;
    }
}

#[derive(Default)]
struct RecordingConsumer {
    batches: Vec<Vec<HarvestedRecord>>,
    finishes: Vec<FinishReason>,
}

impl RecordingConsumer {
    fn ids(&self) -> Vec<Vec<String>> {
        self.batches
            .iter()
            .map(|batch| batch.iter().map(|r| r.id.clone()).collect())
            .collect()
    }
}

impl FeedConsumer for RecordingConsumer {
    fn on_data(&mut self, records: Vec<HarvestedRecord>) {
        self.batches.push(records);
    }

    fn on_finish(&mut self, reason: FinishReason) {
        self.finishes.push(reason);
    }
}

fn feed(ids: &[u32]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<article mid="{id}"><header><a class="name"><span>user{id}</span></a></header>
                   <div class="detail_text">post {id}</div></article>"#
            )
        })
        .collect();
    format!("<html><body><main>{cards}</main></body></html>")
}

fn harvester(html: &str, extent: u64) -> FeedHarvester<FakeHost, RecordingConsumer> {
    init_logging();
    FeedHarvester::new(
        FakeHost::new(html, extent),
        RecordingConsumer::default(),
        &HarvestSettings::default(),
    )
    .unwrap()
    .with_clock(FixedClock(1_700_000_000_000))
}

fn added(count: usize) -> Vec<MutationRecord> {
    vec![MutationRecord {
        added_nodes: count,
    }]
}

#[test]
fn limit_caps_the_first_scan() {
    let mut h = harvester(&feed(&[1, 2, 3, 4, 5]), 1000);
    h.start(3);

    assert_eq!(h.consumer().ids(), vec![vec!["1", "2", "3"]]);
    assert_eq!(h.consumer().finishes, vec![FinishReason::LimitReached]);
    assert_eq!(h.state().phase(), Phase::Stopped);
    assert!(!h.triggers_armed());
    assert!(!h.host().observing);

    h.handle_timer_tick();
    h.handle_mutations(&added(4));
    assert_eq!(h.consumer().batches.len(), 1);
    assert_eq!(h.consumer().finishes.len(), 1);
    assert!(h.host().scrolls.is_empty());
}

#[test]
fn limit_equal_to_available_cards_finishes_in_the_same_scan() {
    let mut h = harvester(&feed(&[1, 2]), 1000);
    h.start(2);
    assert_eq!(h.consumer().ids(), vec![vec!["1", "2"]]);
    assert_eq!(h.consumer().finishes, vec![FinishReason::LimitReached]);
}

#[test]
fn later_scan_delivers_only_new_cards() {
    let mut h = harvester(&feed(&[1, 2, 3]), 1000);
    h.start(0);
    h.host_mut().render(&feed(&[1, 2, 3, 4, 5]), 2000);
    h.handle_mutations(&added(2));

    assert_eq!(
        h.consumer().ids(),
        vec![vec!["1", "2", "3"], vec!["4", "5"]]
    );
    assert!(h.consumer().finishes.is_empty());
}

#[test]
fn rescanning_unchanged_feed_emits_nothing() {
    let mut h = harvester(&feed(&[1, 2]), 1000);
    h.start(0);
    h.handle_mutations(&added(1));
    h.handle_mutations(&added(1));
    assert_eq!(h.consumer().batches.len(), 1);
}

#[test]
fn limit_spans_multiple_scans() {
    let mut h = harvester(&feed(&[1, 2]), 1000);
    h.start(3);
    h.host_mut().render(&feed(&[1, 2, 3, 4]), 2000);
    h.handle_mutations(&added(2));

    assert_eq!(h.consumer().ids(), vec![vec!["1", "2"], vec!["3"]]);
    assert_eq!(h.consumer().finishes, vec![FinishReason::LimitReached]);
}

#[test]
fn unchanged_extent_ends_session_as_stalled() {
    let mut h = harvester(&feed(&[1]), 1000);
    h.start(0);

    // First sample moves the extent off zero; five identical samples follow.
    for _ in 0..5 {
        h.handle_timer_tick();
    }
    assert!(h.consumer().finishes.is_empty());
    assert_eq!(h.host().scrolls, vec![1000; 5]);

    h.handle_timer_tick();
    assert_eq!(h.consumer().finishes, vec![FinishReason::Stalled]);
    assert_eq!(h.host().scrolls.len(), 5);
    assert_eq!(h.host().unobserve_calls, 1);
}

#[test]
fn notification_postpones_stall() {
    let mut h = harvester(&feed(&[1]), 1000);
    h.start(0);
    for _ in 0..5 {
        h.handle_timer_tick();
    }
    h.handle_mutations(&added(1));
    for _ in 0..4 {
        h.handle_timer_tick();
    }
    assert!(h.state().is_running());
    h.handle_timer_tick();
    assert_eq!(h.consumer().finishes, vec![FinishReason::Stalled]);
}

#[test]
fn growing_extent_keeps_session_alive() {
    let mut h = harvester(&feed(&[1]), 1000);
    h.start(0);
    for step in 1..=10u64 {
        h.host_mut().extent = 1000 + step * 500;
        h.handle_timer_tick();
    }
    assert!(h.state().is_running());
    assert_eq!(h.host().scrolls.last(), Some(&6000));
}

#[test]
fn explicit_stop_finishes_once_and_is_idempotent() {
    let mut h = harvester(&feed(&[1]), 1000);
    h.start(0);
    h.stop();
    h.stop();

    assert_eq!(h.consumer().finishes, vec![FinishReason::Requested]);
    assert_eq!(h.host().observe_calls, 1);
    assert_eq!(h.host().unobserve_calls, 1);
}

#[test]
fn stop_before_start_is_a_noop() {
    let mut h = harvester(&feed(&[1]), 1000);
    h.stop();
    assert!(h.consumer().finishes.is_empty());
    assert_eq!(h.host().unobserve_calls, 0);
}

#[test]
fn second_start_while_running_does_not_rearm() {
    let mut h = harvester(&feed(&[1, 2]), 1000);
    h.start(0);
    let generation = h.arm_generation();
    h.start(0);

    assert_eq!(h.host().observe_calls, 1);
    assert_eq!(h.arm_generation(), generation);
    assert_eq!(h.consumer().batches.len(), 1);
}

#[test]
fn restart_after_stop_resets_the_ledger() {
    let mut h = harvester(&feed(&[1, 2]), 1000);
    h.start(0);
    h.stop();
    h.start(0);

    assert_eq!(h.consumer().ids(), vec![vec!["1", "2"], vec!["1", "2"]]);
    assert_eq!(h.state().session(), 2);
    assert!(h.triggers_armed());
}

#[test]
fn identical_cards_without_ids_collapse_within_a_scan() {
    let html = r#"<body>
        <article><p class="detail_text">same words</p></article>
        <article><p class="detail_text">same words</p></article>
        <article><p class="detail_text">other words</p></article>
        <article><span class="name">no content here</span></article>
    </body>"#;
    let mut h = harvester(html, 10);
    h.start(0);

    let batches = &h.consumer().batches;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 2);
    assert_eq!(batches[0][0].content, "same words");
    assert_eq!(batches[0][1].content, "other words");
}

#[test]
fn empty_feed_keeps_waiting() {
    let mut h = harvester("<body></body>", 0);
    h.start(0);
    assert!(h.consumer().batches.is_empty());
    assert!(h.state().is_running());
    assert!(h.host().observing);
}
