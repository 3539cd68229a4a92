use scraper::Html;

use feed_logging::harvest_debug;

use crate::host::{FeedHost, MutationRecord, MutationSink};

/// In-memory host replaying successive renders of a growing feed.
///
/// Each snapshot is the full document after one more page has loaded.
/// Scrolling to (or past) the bottom loads the next snapshot and, while
/// observing, reports the added nodes through the sink. The extent is the
/// byte length of the current snapshot, so it stops changing once the last
/// snapshot is shown.
pub struct SnapshotHost {
    pages: Vec<String>,
    current: usize,
    document: Html,
    sink: MutationSink,
    observing: bool,
    scroll_position: u64,
}

impl SnapshotHost {
    pub fn new(pages: Vec<String>, sink: MutationSink) -> Self {
        let pages = if pages.is_empty() {
            vec![String::new()]
        } else {
            pages
        };
        let document = Html::parse_document(&pages[0]);
        Self {
            pages,
            current: 0,
            document,
            sink,
            observing: false,
            scroll_position: 0,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn scroll_position(&self) -> u64 {
        self.scroll_position
    }

    /// Renders the next snapshot as if it arrived on its own. Returns false on the last page.
    pub fn advance(&mut self) -> bool {
        if self.current + 1 >= self.pages.len() {
            return false;
        }
        let before = node_count(&self.document);
        self.current += 1;
        self.document = Html::parse_document(&self.pages[self.current]);
        let added = node_count(&self.document).saturating_sub(before);
        harvest_debug!(
            "snapshot {}/{} rendered, {} nodes added",
            self.current + 1,
            self.pages.len(),
            added
        );
        if self.observing && added > 0 {
            self.sink.notify(vec![MutationRecord { added_nodes: added }]);
        }
        true
    }
}

impl FeedHost for SnapshotHost {
    fn document(&self) -> &Html {
        &self.document
    }

    fn scroll_extent(&self) -> u64 {
        self.pages[self.current].len() as u64
    }

    fn scroll_to(&mut self, position: u64) {
        self.scroll_position = position;
        if position >= self.scroll_extent() {
            self.advance();
        }
    }

    fn observe(&mut self) {
        self.observing = true;
    }

    fn unobserve(&mut self) {
        self.observing = false;
    }
}

fn node_count(document: &Html) -> usize {
    document.root_element().descendants().count()
}
