//! Semantic segmentation of staged documents into retrieval chunks.
//!
//! Pages are split into paragraph blocks, adjacent blocks are merged while a
//! [`ContinuityJudge`] reports the same topic, and each resulting segment is
//! repacked against a token budget so no chunk exceeds `max_tokens`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::hashing;

pub mod continuity;
pub mod error;
pub mod sentence;


pub use continuity::{ContinuityJudge, HeadingHeuristic, LlmContinuityJudge};
#[cfg(any(test, feature = "mock"))]
pub use continuity::ScriptedJudge;
pub use error::SegmentError;

pub const DEFAULT_TARGET_TOKENS: usize = 1000;
pub const DEFAULT_MIN_TOKENS: usize = 400;
pub const DEFAULT_MAX_TOKENS: usize = 1400;

/// One page of a source document. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub text: String,
}

/// A paragraph block tagged with the page it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub page: u32,
    pub text: String,
}

/// A topically coherent run of merged blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub pages: Vec<u32>,
    pub text: String,
}

impl Segment {
    /// Lowest and highest source page covered by this segment.
    pub fn page_range(&self) -> (u32, u32) {
        let start = self.pages.iter().copied().min().unwrap_or(0);
        let end = self.pages.iter().copied().max().unwrap_or(0);
        (start, end)
    }
}

/// An indexable chunk with provenance back to its source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub doc_id: String,
    pub source_path: String,
    pub text: String,
    pub page_start: u32,
    pub page_end: u32,
    pub char_start: usize,
    pub char_end: usize,
}

/// Token budgets governing chunk repacking.
///
/// Only `max_tokens` participates in the greedy packing loop; `target_tokens`
/// and `min_tokens` are validated for consistency and carried for callers
/// that tune budgets as a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub target_tokens: usize,
    pub min_tokens: usize,
    pub max_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_tokens: DEFAULT_TARGET_TOKENS,
            min_tokens: DEFAULT_MIN_TOKENS,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl ChunkingConfig {
    pub fn with_target_tokens(mut self, target_tokens: usize) -> Self {
        self.target_tokens = target_tokens;
        self
    }

    pub fn with_min_tokens(mut self, min_tokens: usize) -> Self {
        self.min_tokens = min_tokens;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Budgets must satisfy `min <= target <= max` with a nonzero `max`.
    pub fn validate(&self) -> Result<(), SegmentError> {
        if self.max_tokens == 0 {
            return Err(SegmentError::InvalidConfig {
                reason: "max_tokens must be at least 1".to_string(),
            });
        }
        if self.min_tokens > self.target_tokens || self.target_tokens > self.max_tokens {
            return Err(SegmentError::InvalidConfig {
                reason: format!(
                    "token budgets must satisfy min <= target <= max, got min={} target={} max={}",
                    self.min_tokens, self.target_tokens, self.max_tokens
                ),
            });
        }
        Ok(())
    }
}

/// Whitespace-word count scaled by 4/3 (tokens per word), rounded up.
/// Never returns zero so empty text cannot produce an unbounded chunk.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words * 4).div_ceil(3).max(1)
}

/// Splits page text on blank lines into whitespace-normalized paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut words: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !words.is_empty() {
                paragraphs.push(words.join(" "));
                words.clear();
            }
        } else {
            words.extend(line.split_whitespace());
        }
    }
    if !words.is_empty() {
        paragraphs.push(words.join(" "));
    }
    paragraphs
}

/// Expands pages into paragraph blocks, each tagged with its source page.
pub fn blocks_from_pages(pages: &[Page]) -> Vec<Block> {
    pages
        .iter()
        .flat_map(|page| {
            split_paragraphs(&page.text)
                .into_iter()
                .map(move |text| Block {
                    page: page.number,
                    text,
                })
        })
        .collect()
}

/// Drives block merging and token-budget repacking for one document.
pub struct Segmenter {
    config: ChunkingConfig,
}

impl Segmenter {
    /// Builds a segmenter, rejecting inconsistent token budgets up front.
    pub fn new(config: ChunkingConfig) -> Result<Self, SegmentError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Segments one document's pages into chunks.
    ///
    /// Chunk ordinals run across the whole document, so chunk ids are stable
    /// for identical input regardless of segment boundaries.
    #[instrument(skip(self, pages, judge), fields(doc_id = %doc_id, page_count = pages.len()))]
    pub async fn chunk_document(
        &self,
        doc_id: &str,
        source_path: &str,
        pages: &[Page],
        judge: &dyn ContinuityJudge,
    ) -> Result<Vec<Chunk>, SegmentError> {
        let blocks = blocks_from_pages(pages);
        if blocks.is_empty() {
            debug!("No text blocks; document yields no chunks");
            return Ok(Vec::new());
        }

        let segments = merge_blocks(blocks, judge).await?;
        let segment_count = segments.len();

        let mut chunks = Vec::new();
        for segment in segments {
            let (page_start, page_end) = segment.page_range();
            let texts = if estimate_tokens(&segment.text) <= self.config.max_tokens {
                vec![sentence::finalize_text(&segment.text)]
            } else {
                self.pack_sentences(&segment.text)
            };
            for text in texts {
                if text.is_empty() {
                    continue;
                }
                let ordinal = chunks.len();
                let char_end = text.chars().count();
                chunks.push(Chunk {
                    id: hashing::chunk_id(doc_id, ordinal),
                    doc_id: doc_id.to_string(),
                    source_path: source_path.to_string(),
                    text,
                    page_start,
                    page_end,
                    char_start: 0,
                    char_end,
                });
            }
        }

        info!(
            segments = segment_count,
            chunks = chunks.len(),
            "Segmented document"
        );
        Ok(chunks)
    }

    /// Greedily packs sentences so each emitted chunk stays within
    /// `max_tokens`. A single sentence above the budget still becomes its
    /// own chunk rather than being dropped.
    fn pack_sentences(&self, text: &str) -> Vec<String> {
        let mut packed = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0usize;
        for sentence in sentence::split_sentences(text) {
            let tokens = estimate_tokens(sentence);
            if !current.is_empty() && current_tokens + tokens > self.config.max_tokens {
                packed.push(current.join(" "));
                current.clear();
                current_tokens = 0;
            }
            current.push(sentence);
            current_tokens += tokens;
        }
        if !current.is_empty() {
            packed.push(current.join(" "));
        }
        packed
    }
}

/// Folds blocks left to right, merging while the judge reports continuity.
async fn merge_blocks(
    blocks: Vec<Block>,
    judge: &dyn ContinuityJudge,
) -> Result<Vec<Segment>, SegmentError> {
    let mut blocks = blocks.into_iter();
    let Some(first) = blocks.next() else {
        return Ok(Vec::new());
    };

    let mut segments = Vec::new();
    let mut current = first.text;
    let mut current_pages = vec![first.page];

    for block in blocks {
        if judge.same_topic(&current, &block.text).await? {
            current.push('\n');
            current.push_str(&block.text);
            current_pages.push(block.page);
        } else {
            debug!(pages = ?current_pages, "Closing segment at topic boundary");
            segments.push(Segment {
                pages: std::mem::take(&mut current_pages),
                text: std::mem::take(&mut current),
            });
            current = block.text;
            current_pages = vec![block.page];
        }
    }
    segments.push(Segment {
        pages: current_pages,
        text: current,
    });
    Ok(segments)
}
