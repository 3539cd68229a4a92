use std::collections::HashSet;
use std::sync::{mpsc, Once};
use std::time::Duration;

use feed_core::FinishReason;
use feed_engine::{
    mutation_channel, ChannelConsumer, HarvestEvent, HarvestRuntime, HarvestSettings,
    MutationRecord, SnapshotHost,
};

const WAIT: Duration = Duration::from_secs(5);

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(feed_logging::initialize_for_tests);
}

fn page(ids: std::ops::RangeInclusive<u32>) -> String {
    let cards: String = ids
        .map(|id| format!(r#"<article mid="{id}"><div class="detail_text">post {id}</div></article>"#))
        .collect();
    format!("<html><body>{cards}</body></html>")
}

fn fast_settings(stall_threshold: u32) -> HarvestSettings {
    HarvestSettings {
        tick_interval: Duration::from_millis(5),
        stall_threshold,
        ..HarvestSettings::default()
    }
}

fn collect_until_finished(rx: &mpsc::Receiver<HarvestEvent>) -> (Vec<Vec<String>>, FinishReason) {
    let mut batches = Vec::new();
    loop {
        match rx.recv_timeout(WAIT).expect("runtime event") {
            HarvestEvent::Batch(records) => {
                batches.push(records.into_iter().map(|r| r.id).collect());
            }
            HarvestEvent::Finished(reason) => return (batches, reason),
        }
    }
}

#[test]
fn replayed_feed_is_harvested_until_it_stalls() {
    init_logging();
    let pages = vec![page(1..=3), page(1..=6), page(1..=8)];
    let (tx, rx) = mpsc::channel();
    let handle = HarvestRuntime::spawn(
        move |sink| SnapshotHost::new(pages, sink),
        ChannelConsumer::new(tx),
        fast_settings(3),
    )
    .unwrap();

    handle.start(0).unwrap();
    let (batches, reason) = collect_until_finished(&rx);

    assert_eq!(reason, FinishReason::Stalled);
    assert_eq!(batches[0], vec!["1", "2", "3"]);
    let all: Vec<String> = batches.into_iter().flatten().collect();
    let unique: HashSet<&String> = all.iter().collect();
    assert_eq!(all.len(), 8);
    assert_eq!(unique.len(), 8);

    handle.shutdown().unwrap();
    assert!(rx.try_recv().is_err());
}

#[test]
fn limit_finishes_without_stalling() {
    init_logging();
    let pages = vec![page(1..=2), page(1..=5)];
    let (tx, rx) = mpsc::channel();
    let handle = HarvestRuntime::spawn(
        move |sink| SnapshotHost::new(pages, sink),
        ChannelConsumer::new(tx),
        fast_settings(50),
    )
    .unwrap();

    handle.start(4).unwrap();
    let (batches, reason) = collect_until_finished(&rx);

    assert_eq!(reason, FinishReason::LimitReached);
    assert_eq!(batches.concat(), vec!["1", "2", "3", "4"]);
    handle.shutdown().unwrap();
}

#[test]
fn shutdown_ends_a_running_session() {
    init_logging();
    let (tx, rx) = mpsc::channel();
    let handle = HarvestRuntime::spawn(
        move |sink| SnapshotHost::new(vec![page(1..=1)], sink),
        ChannelConsumer::new(tx),
        HarvestSettings::default(),
    )
    .unwrap();

    handle.start(0).unwrap();
    assert!(matches!(
        rx.recv_timeout(WAIT).unwrap(),
        HarvestEvent::Batch(_)
    ));
    handle.stop().unwrap();
    assert_eq!(
        rx.recv_timeout(WAIT).unwrap(),
        HarvestEvent::Finished(FinishReason::Requested)
    );
    handle.shutdown().unwrap();
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn mutation_inbox_delivers_in_order() {
    let (sink, mut inbox) = mutation_channel();
    assert!(sink.notify(vec![MutationRecord { added_nodes: 1 }]));
    assert!(sink.notify(vec![MutationRecord { added_nodes: 2 }]));

    assert_eq!(inbox.recv().await.unwrap()[0].added_nodes, 1);
    assert_eq!(inbox.recv().await.unwrap()[0].added_nodes, 2);
    drop(inbox);
    assert!(!sink.notify(Vec::new()));
}
