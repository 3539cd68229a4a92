use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{bail, Context, Result};
use feed_core::FinishReason;
use feed_engine::{
    decode_snapshot, ChannelConsumer, HarvestEvent, HarvestRuntime, HarvestSettings, SnapshotHost,
};
use feed_logging::harvest_debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReplaySummary {
    pub records: usize,
    pub reason: FinishReason,
}

/// Reads and decodes every snapshot up front so bad input fails before harvesting starts.
pub(crate) fn read_snapshots(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|path| {
            let bytes =
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let decoded = decode_snapshot(&bytes)
                .with_context(|| format!("failed to decode {}", path.display()))?;
            harvest_debug!("{} decoded as {}", path.display(), decoded.encoding_label);
            Ok(decoded.html)
        })
        .collect()
}

/// Runs one session over `pages` and writes each record to `out` as a JSON line.
pub(crate) fn replay(
    pages: Vec<String>,
    limit: usize,
    settings: HarvestSettings,
    out: &mut impl Write,
) -> Result<ReplaySummary> {
    let (tx, rx) = mpsc::channel();
    let handle = HarvestRuntime::spawn(
        move |sink| SnapshotHost::new(pages, sink),
        ChannelConsumer::new(tx),
        settings,
    )?;
    handle.start(limit)?;

    let mut records = 0;
    let reason = loop {
        match rx.recv() {
            Ok(HarvestEvent::Batch(batch)) => {
                for record in &batch {
                    serde_json::to_writer(&mut *out, record)?;
                    writeln!(out)?;
                }
                out.flush()?;
                records += batch.len();
            }
            Ok(HarvestEvent::Finished(reason)) => break reason,
            Err(_) => bail!("harvest runtime exited before the session finished"),
        }
    };

    handle.shutdown()?;
    Ok(ReplaySummary { records, reason })
}
