//! Block Factory
//!
//! Wraps raw generated content into well-formed blocks, assigns render
//! order from a monotonically increasing counter, sanitizes model text,
//! and applies document-wide diversity caps once a document's blocks are
//! assembled.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::blocks::{
    BlockBody, BlockMetadata, ChecklistItem, ContentBlock, DividerColor, InteractiveVariant,
    ListVariant, QuoteEntry, QuoteVariant, StatementVariant, TextVariant,
};
use super::quiz::QuizQuestion;

// ============================================================================
// Diversity Caps
// ============================================================================

/// Document-wide limits on repetitive-looking block variants.
#[derive(Debug, Clone, Copy)]
pub struct DiversityCaps {
    pub numbered_lists: usize,
    pub bulleted_lists: usize,
    pub tables: usize,
    pub quote_carousels: usize,
}

impl Default for DiversityCaps {
    fn default() -> Self {
        Self {
            numbered_lists: 3,
            bulleted_lists: 3,
            tables: 2,
            quote_carousels: 1,
        }
    }
}

// ============================================================================
// Sanitation
// ============================================================================

static LEADING_LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+").expect("valid regex"));

/// Normalize model prose: CRLF to LF, symmetric wrapping quotes removed.
pub fn sanitize_text(raw: &str) -> String {
    let mut text = raw.replace("\r\n", "\n").trim().to_string();

    loop {
        let stripped = strip_wrapping_quotes(&text);
        if stripped == text {
            break;
        }
        text = stripped;
    }
    text
}

fn strip_wrapping_quotes(text: &str) -> String {
    let pairs = [('"', '"'), ('\u{201C}', '\u{201D}'), ('\u{2018}', '\u{2019}'), ('\'', '\'')];
    for (open, close) in pairs {
        if text.len() >= 2 && text.starts_with(open) && text.ends_with(close) {
            let inner = &text[open.len_utf8()..text.len() - close.len_utf8()];
            // Only strip when the pair actually wraps, not when an interior
            // quote happens to end the string.
            if !inner.contains(open) || open != close {
                return inner.trim().to_string();
            }
        }
    }
    text.to_string()
}

/// Normalize one list item: sanitation plus leading-marker removal.
pub fn sanitize_list_item(raw: &str) -> String {
    let text = sanitize_text(raw);
    LEADING_LIST_MARKER.replace(&text, "").trim().to_string()
}

/// Split a generated blob into cleaned, non-empty list items.
pub fn split_into_items(raw: &str) -> Vec<String> {
    raw.replace("\r\n", "\n")
        .lines()
        .map(sanitize_list_item)
        .filter(|line| !line.is_empty())
        .collect()
}

// ============================================================================
// BlockFactory
// ============================================================================

/// Constructs typed blocks with sequential order values
pub struct BlockFactory {
    next_order: u32,
}

impl BlockFactory {
    pub fn new() -> Self {
        Self { next_order: 0 }
    }

    fn next(&mut self) -> u32 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }

    pub fn text(&mut self, variant: TextVariant, text: &str, meta: BlockMetadata) -> ContentBlock {
        ContentBlock::new(
            self.next(),
            BlockBody::Text {
                variant,
                heading: None,
                text: sanitize_text(text),
            },
            meta,
        )
    }

    pub fn heading_paragraph(
        &mut self,
        variant: TextVariant,
        heading: &str,
        text: &str,
        meta: BlockMetadata,
    ) -> ContentBlock {
        ContentBlock::new(
            self.next(),
            BlockBody::Text {
                variant,
                heading: Some(sanitize_text(heading)),
                text: sanitize_text(text),
            },
            meta,
        )
    }

    pub fn list(
        &mut self,
        variant: ListVariant,
        title: Option<&str>,
        raw_items: &[String],
        meta: BlockMetadata,
    ) -> ContentBlock {
        let items: Vec<String> = raw_items
            .iter()
            .map(|i| sanitize_list_item(i))
            .filter(|i| !i.is_empty())
            .collect();
        ContentBlock::new(
            self.next(),
            BlockBody::List {
                variant,
                title: title.map(sanitize_text),
                items,
            },
            meta,
        )
    }

    pub fn image(
        &mut self,
        url: &str,
        alt: &str,
        caption: Option<&str>,
        meta: BlockMetadata,
    ) -> ContentBlock {
        ContentBlock::new(
            self.next(),
            BlockBody::Image {
                url: url.to_string(),
                alt: sanitize_text(alt),
                caption: caption.map(sanitize_text),
            },
            meta,
        )
    }

    pub fn statement(
        &mut self,
        variant: StatementVariant,
        text: &str,
        meta: BlockMetadata,
    ) -> ContentBlock {
        ContentBlock::new(
            self.next(),
            BlockBody::Statement {
                variant,
                text: sanitize_text(text),
            },
            meta,
        )
    }

    pub fn quote(
        &mut self,
        variant: QuoteVariant,
        entries: Vec<QuoteEntry>,
        meta: BlockMetadata,
    ) -> ContentBlock {
        let entries = entries
            .into_iter()
            .map(|e| QuoteEntry {
                text: sanitize_text(&e.text),
                attribution: e.attribution.map(|a| sanitize_text(&a)),
            })
            .filter(|e| !e.text.is_empty())
            .collect();
        ContentBlock::new(self.next(), BlockBody::Quote { variant, entries }, meta)
    }

    pub fn table(
        &mut self,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        meta: BlockMetadata,
    ) -> ContentBlock {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .filter(|r| r.len() == width && !r.is_empty())
            .map(|r| r.iter().map(|c| sanitize_text(c)).collect())
            .collect();
        ContentBlock::new(
            self.next(),
            BlockBody::Table {
                headers: headers.iter().map(|h| sanitize_text(h)).collect(),
                rows,
            },
            meta,
        )
    }

    pub fn checklist(
        &mut self,
        title: Option<&str>,
        raw_items: &[String],
        meta: BlockMetadata,
    ) -> ContentBlock {
        let items = raw_items
            .iter()
            .map(|i| sanitize_list_item(i))
            .filter(|i| !i.is_empty())
            .map(|text| ChecklistItem { text, checked: false })
            .collect();
        ContentBlock::new(
            self.next(),
            BlockBody::Checklist {
                title: title.map(sanitize_text),
                items,
            },
            meta,
        )
    }

    pub fn link(
        &mut self,
        url: &str,
        title: &str,
        description: Option<&str>,
        meta: BlockMetadata,
    ) -> ContentBlock {
        ContentBlock::new(
            self.next(),
            BlockBody::Link {
                url: url.to_string(),
                title: sanitize_text(title),
                description: description.map(sanitize_text),
            },
            meta,
        )
    }

    pub fn quiz(&mut self, questions: Vec<QuizQuestion>, meta: BlockMetadata) -> ContentBlock {
        ContentBlock::new(
            self.next(),
            BlockBody::Interactive {
                variant: InteractiveVariant::Quiz,
                questions,
            },
            meta,
        )
    }

    pub fn divider(&mut self, label: Option<&str>, color: DividerColor) -> ContentBlock {
        ContentBlock::new(
            self.next(),
            BlockBody::Divider {
                label: label.map(String::from),
                color,
            },
            BlockMetadata::scaffolding(),
        )
    }
}

impl Default for BlockFactory {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Diversity Enforcement
// ============================================================================

/// Apply document-wide diversity caps to an assembled block list.
///
/// Over-cap blocks are dropped; surviving blocks keep their original `order`
/// (renumbering would invalidate references the caller may already hold).
/// Bulleted lists with styles outside the allow-list are coerced to `Disc`.
pub fn enforce_diversity(blocks: Vec<ContentBlock>, caps: DiversityCaps) -> Vec<ContentBlock> {
    let mut numbered = 0usize;
    let mut bulleted = 0usize;
    let mut tables = 0usize;
    let mut carousels = 0usize;
    let before = blocks.len();

    let kept: Vec<ContentBlock> = blocks
        .into_iter()
        .filter(|block| match &block.body {
            BlockBody::List {
                variant: ListVariant::Numbered,
                ..
            } => {
                numbered += 1;
                numbered <= caps.numbered_lists
            }
            BlockBody::List {
                variant: ListVariant::Bulleted(_),
                ..
            } => {
                bulleted += 1;
                bulleted <= caps.bulleted_lists
            }
            BlockBody::Table { .. } => {
                tables += 1;
                tables <= caps.tables
            }
            BlockBody::Quote {
                variant: QuoteVariant::Carousel,
                ..
            } => {
                carousels += 1;
                carousels <= caps.quote_carousels
            }
            _ => true,
        })
        .collect();

    if kept.len() < before {
        debug!(dropped = before - kept.len(), "diversity caps trimmed blocks");
    }
    kept
}
