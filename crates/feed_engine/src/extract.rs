use scraper::{ElementRef, Selector};
use url::Url;

use feed_core::{HarvestedRecord, UNKNOWN};
use feed_logging::harvest_trace;

use crate::links::normalize_link;
use crate::surrogate::surrogate_id;

/// Card attribute carrying the feed's own post id.
const NATIVE_ID_ATTR: &str = "mid";
/// Lowest-fidelity content wrapper; also a candidate selector of last resort.
pub(crate) const CONTENT_WRAPPER_CLASS: &str = "wbpro-feed-content";
/// Expand/collapse toggle labels that leak into post text.
const FOLD_GLYPHS: &[&str] = &["展开", "收起"];
/// Elements rendered on their own line.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "dd", "dt", "footer", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "li", "ol", "p", "pre", "section", "table", "tr", "ul",
];

const CONTENT_CSS: &str = r#".detail_text, .wbpro-feed-content, [class*="wbtext"]"#;
const AUTHOR_NAME_CSS: &str = r#"[class*="name"] span, .screen_name, .name"#;
const AUTHOR_AVATAR_CSS: &str = "header .woo-avatar-main, .face .img_wrapper";
const TIME_MARKED_LINK_CSS: &str = r#"a[class*="_time"]"#;
const HEADER_CSS: &str = "header";
const TIME_GENERIC_CSS: &str = r#"a[class*="time"], .from a, .head-info .time, .created_at"#;
const STATUS_LINK_CSS: &str = r#"a[class*="time"], a[href*="/status/"]"#;
const CONTENT_TYPE_CSS: &str = "[contenttype]";
const REPOST_CSS: &str = ".feed_list_forwardContent, .wbpro-feed-repost";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractorError {
    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },
}

pub(crate) fn compile(css: &str) -> Result<Selector, ExtractorError> {
    Selector::parse(css).map_err(|err| ExtractorError::InvalidSelector {
        selector: css.to_string(),
        message: format!("{err:?}"),
    })
}

/// The part of a card needed to decide whether it is new.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardIdentity {
    pub id: String,
    pub content: String,
    /// False when `id` is a surrogate hash.
    pub native: bool,
}

struct TimeHit<'a> {
    value: String,
    anchor: Option<ElementRef<'a>>,
}

type TextStrategy = fn(&CardExtractor, ElementRef<'_>) -> Option<String>;
type TimeStrategy = for<'a> fn(&CardExtractor, ElementRef<'a>) -> Option<TimeHit<'a>>;

const CONTENT_CHAIN: &[TextStrategy] = &[
    CardExtractor::content_by_selectors,
    CardExtractor::content_of_wrapper_card,
];
const AUTHOR_CHAIN: &[TextStrategy] = &[
    CardExtractor::author_by_name_class,
    CardExtractor::author_by_avatar,
    CardExtractor::author_by_link_label,
];
const TIME_CHAIN: &[(&str, TimeStrategy)] = &[
    ("marked link title", CardExtractor::time_by_marked_link),
    ("header attribute", CardExtractor::time_by_header_attr),
    ("generic selectors", CardExtractor::time_by_generic_selectors),
];

/// Field extraction for one feed card.
///
/// Every field is an ordered chain of strategies; the first one that yields
/// a non-empty value wins and later ones are never consulted. No strategy
/// fails: missing markup just means `None` and the next strategy runs.
#[derive(Debug, Clone)]
pub struct CardExtractor {
    content: Selector,
    author_name: Selector,
    author_avatar: Selector,
    time_marked_link: Selector,
    header: Selector,
    time_generic: Selector,
    status_link: Selector,
    content_type: Selector,
    repost: Selector,
    base_url: Option<Url>,
}

impl CardExtractor {
    pub fn new(base_url: Option<Url>) -> Result<Self, ExtractorError> {
        Ok(Self {
            content: compile(CONTENT_CSS)?,
            author_name: compile(AUTHOR_NAME_CSS)?,
            author_avatar: compile(AUTHOR_AVATAR_CSS)?,
            time_marked_link: compile(TIME_MARKED_LINK_CSS)?,
            header: compile(HEADER_CSS)?,
            time_generic: compile(TIME_GENERIC_CSS)?,
            status_link: compile(STATUS_LINK_CSS)?,
            content_type: compile(CONTENT_TYPE_CSS)?,
            repost: compile(REPOST_CSS)?,
            base_url,
        })
    }

    /// Resolves the id and cleaned content. `None` when the card has neither
    /// a native id nor any content.
    pub fn identify(&self, card: ElementRef<'_>, now_millis: i64) -> Option<CardIdentity> {
        let content = self
            .first_text(card, CONTENT_CHAIN)
            .map(|raw| strip_fold_glyphs(&raw))
            .unwrap_or_default();

        if let Some(id) = attr(card, NATIVE_ID_ATTR) {
            return Some(CardIdentity {
                id,
                content,
                native: true,
            });
        }
        if content.is_empty() {
            return None;
        }
        Some(CardIdentity {
            id: surrogate_id(&content, now_millis),
            content,
            native: false,
        })
    }

    /// Resolves the remaining fields of an identified card.
    pub fn complete(&self, card: ElementRef<'_>, identity: CardIdentity) -> HarvestedRecord {
        let author = self
            .first_text(card, AUTHOR_CHAIN)
            .unwrap_or_else(|| UNKNOWN.to_string());
        let time = TIME_CHAIN.iter().find_map(|(name, strategy)| {
            let hit = strategy(self, card)?;
            harvest_trace!("card {}: publish time {:?} via {}", identity.id, hit.value, name);
            Some(hit)
        });
        let link = self.link(card, time.as_ref().and_then(|hit| hit.anchor));
        let publish_time = time
            .map(|hit| hit.value)
            .unwrap_or_else(|| UNKNOWN.to_string());

        HarvestedRecord {
            id: identity.id,
            author,
            content: identity.content,
            publish_time,
            link,
            is_retweet: self.is_retweet(card),
        }
    }

    pub fn extract(&self, card: ElementRef<'_>, now_millis: i64) -> Option<HarvestedRecord> {
        self.identify(card, now_millis)
            .map(|identity| self.complete(card, identity))
    }

    fn first_text(&self, card: ElementRef<'_>, chain: &[TextStrategy]) -> Option<String> {
        chain
            .iter()
            .find_map(|strategy| strategy(self, card).filter(|value| !value.is_empty()))
    }

    fn content_by_selectors(&self, card: ElementRef<'_>) -> Option<String> {
        card.select(&self.content).next().map(collapsed_text)
    }

    fn content_of_wrapper_card(&self, card: ElementRef<'_>) -> Option<String> {
        has_class(card, CONTENT_WRAPPER_CLASS).then(|| collapsed_text(card))
    }

    fn author_by_name_class(&self, card: ElementRef<'_>) -> Option<String> {
        let el = card.select(&self.author_name).next()?;
        non_empty(collapsed_text(el)).or_else(|| attr(el, "title"))
    }

    fn author_by_avatar(&self, card: ElementRef<'_>) -> Option<String> {
        let el = card.select(&self.author_avatar).next()?;
        non_empty(collapsed_text(el)).or_else(|| attr(el, "title"))
    }

    /// `aria-label` of the link wrapping the name element, else the avatar.
    fn author_by_link_label(&self, card: ElementRef<'_>) -> Option<String> {
        card.select(&self.author_name)
            .chain(card.select(&self.author_avatar))
            .filter_map(|el| enclosing_link(el, card))
            .find_map(|link| attr(link, "aria-label"))
    }

    fn time_by_marked_link<'a>(&self, card: ElementRef<'a>) -> Option<TimeHit<'a>> {
        let el = card.select(&self.time_marked_link).next()?;
        let value = attr(el, "title")?;
        Some(TimeHit {
            value,
            anchor: Some(el),
        })
    }

    fn time_by_header_attr<'a>(&self, card: ElementRef<'a>) -> Option<TimeHit<'a>> {
        let header = card.select(&self.header).next()?;
        attr(header, "time").map(|value| TimeHit {
            value,
            anchor: None,
        })
    }

    fn time_by_generic_selectors<'a>(&self, card: ElementRef<'a>) -> Option<TimeHit<'a>> {
        let el = card.select(&self.time_generic).next()?;
        let value = attr(el, "title").or_else(|| non_empty(collapsed_text(el)))?;
        Some(TimeHit {
            value,
            anchor: Some(el),
        })
    }

    fn link(&self, card: ElementRef<'_>, time_anchor: Option<ElementRef<'_>>) -> Option<String> {
        let raw = time_anchor
            .filter(|el| el.value().name().eq_ignore_ascii_case("a"))
            .and_then(|el| attr(el, "href"))
            .or_else(|| {
                card.select(&self.status_link)
                    .find_map(|el| attr(el, "href"))
            })?;
        normalize_link(&raw, self.base_url.as_ref())
    }

    fn is_retweet(&self, card: ElementRef<'_>) -> bool {
        match card.select(&self.content_type).next() {
            Some(el) => el
                .value()
                .attr("contenttype")
                .map(str::trim)
                .is_some_and(|kind| !kind.is_empty() && kind != "original"),
            None => card.select(&self.repost).next().is_some(),
        }
    }
}

/// Rendered text of `el`. `<br>` and block elements start a new line; within
/// a line whitespace runs collapse to one space. Blank lines are dropped.
pub(crate) fn collapsed_text(el: ElementRef<'_>) -> String {
    let mut lines = LineBuffer::default();
    push_rendered(el, &mut lines);
    lines.finish()
}

fn push_rendered(el: ElementRef<'_>, lines: &mut LineBuffer) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            lines.push_text(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let name = child.value().name();
            if name.eq_ignore_ascii_case("br") {
                lines.break_line();
            } else if BLOCK_ELEMENTS.contains(&name) {
                lines.break_line();
                push_rendered(child, lines);
                lines.break_line();
            } else {
                push_rendered(child, lines);
            }
        }
    }
}

#[derive(Default)]
struct LineBuffer {
    lines: Vec<String>,
    current: String,
    pending_space: bool,
}

impl LineBuffer {
    fn push_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                self.pending_space = !self.current.is_empty();
            } else {
                if self.pending_space {
                    self.current.push(' ');
                    self.pending_space = false;
                }
                self.current.push(ch);
            }
        }
    }

    fn break_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
        self.pending_space = false;
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}

pub(crate) fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

fn attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Nearest `<a>` ancestor of `el` inside `card`.
fn enclosing_link<'a>(el: ElementRef<'a>, card: ElementRef<'_>) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|ancestor| ancestor.id() != card.id())
        .find(|ancestor| ancestor.value().name().eq_ignore_ascii_case("a"))
}

fn strip_fold_glyphs(raw: &str) -> String {
    let mut content = raw.to_string();
    for glyph in FOLD_GLYPHS {
        content = content.replace(glyph, "");
    }
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
