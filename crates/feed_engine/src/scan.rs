use scraper::{ElementRef, Html, Selector};
use url::Url;

use feed_core::{Admission, HarvestState, HarvestedRecord};
use feed_logging::{harvest_debug, harvest_trace};

use crate::extract::{compile, CardExtractor, ExtractorError};

const ITEM_VIEW_CSS: &str = "div.vue-recycle-scroller__item-view";

/// Markup conventions for a feed item, highest fidelity first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStrategy {
    /// Semantic `<article>` containers.
    Article,
    /// `div[action-type="feed_list_item"]` from the list layout.
    FeedListItem,
    /// Bare content wrappers, widened to their card.
    ContentWrapper,
}

impl CandidateStrategy {
    pub const ORDER: [CandidateStrategy; 3] = [
        CandidateStrategy::Article,
        CandidateStrategy::FeedListItem,
        CandidateStrategy::ContentWrapper,
    ];

    fn css(self) -> &'static str {
        match self {
            CandidateStrategy::Article => "article",
            CandidateStrategy::FeedListItem => r#"div[action-type="feed_list_item"]"#,
            CandidateStrategy::ContentWrapper => ".wbpro-feed-content",
        }
    }
}

/// Per-scan candidate selection plus extraction, deduplicated against the session ledger.
#[derive(Debug, Clone)]
pub struct Scanner {
    strategies: Vec<(CandidateStrategy, Selector)>,
    item_view: Selector,
    extractor: CardExtractor,
}

impl Scanner {
    pub fn new(base_url: Option<Url>) -> Result<Self, ExtractorError> {
        let strategies = CandidateStrategy::ORDER
            .iter()
            .map(|&strategy| compile(strategy.css()).map(|sel| (strategy, sel)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            strategies,
            item_view: compile(ITEM_VIEW_CSS)?,
            extractor: CardExtractor::new(base_url)?,
        })
    }

    /// Cards from the first strategy with any match, in document order.
    /// Strategies are never merged.
    pub fn select_cards<'a>(
        &self,
        document: &'a Html,
    ) -> Option<(CandidateStrategy, Vec<ElementRef<'a>>)> {
        self.strategies.iter().find_map(|(strategy, selector)| {
            let nodes: Vec<ElementRef<'a>> = document.select(selector).collect();
            if nodes.is_empty() {
                return None;
            }
            let cards = match strategy {
                CandidateStrategy::ContentWrapper => {
                    nodes.into_iter().map(|node| self.widen(node)).collect()
                }
                _ => nodes,
            };
            Some((*strategy, cards))
        })
    }

    /// Admits new cards into `state` and returns their records. Stops at the
    /// first card past the session limit.
    pub fn scan(
        &self,
        document: &Html,
        state: &mut HarvestState,
        now_millis: i64,
    ) -> Vec<HarvestedRecord> {
        let mut batch = Vec::new();
        let Some((strategy, cards)) = self.select_cards(document) else {
            harvest_trace!("scan found no candidates");
            return batch;
        };
        harvest_trace!("scan matched {} candidates via {:?}", cards.len(), strategy);

        let mut dropped = 0usize;
        for card in cards {
            let Some(identity) = self.extractor.identify(card, now_millis) else {
                dropped += 1;
                continue;
            };
            match state.admit(&identity.id) {
                Admission::Accepted => batch.push(self.extractor.complete(card, identity)),
                Admission::Duplicate => {}
                Admission::Refused => break,
            }
            if state.limit_reached() {
                break;
            }
        }
        if dropped > 0 {
            harvest_debug!("dropped {} candidates without id or content", dropped);
        }
        batch
    }

    /// Nearest recycle-scroller item view, else grandparent, else parent.
    fn widen<'a>(&self, node: ElementRef<'a>) -> ElementRef<'a> {
        if let Some(card) = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| self.item_view.matches(el))
        {
            return card;
        }
        let mut ancestors = node.ancestors().filter_map(ElementRef::wrap);
        let parent = ancestors.next();
        ancestors.next().or(parent).unwrap_or(node)
    }
}
