//! Continuity judgment capabilities for the segmentation fold.
//!
//! The boundary decision is injected so the fold itself stays deterministic
//! and testable: an LLM oracle for semantic judgments, a heading-pattern
//! heuristic when no oracle is configured, and a scripted judge for tests.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::error::SegmentError;
use crate::llm::ChatClient;

/// Accumulated-segment tail / next-block head submitted to the oracle, in
/// characters.
pub const ORACLE_WINDOW_CHARS: usize = 1200;

const BOUNDARY_SYSTEM: &str =
    "You evaluate topical continuity between two segments and return minimal JSON only.";

const BOUNDARY_TEMPERATURE: f32 = 0.0;
const BOUNDARY_MAX_TOKENS: usize = 80;

/// Binary "same topic" decision between the running segment and the next block.
#[async_trait]
pub trait ContinuityJudge: Send + Sync {
    /// Returns `true` if `next` continues the topic of the accumulated
    /// `current` segment text.
    async fn same_topic(&self, current: &str, next: &str) -> Result<bool, SegmentError>;
}

/// LLM-backed continuity oracle.
///
/// Submits the segment-A tail and segment-B head (each capped at
/// [`ORACLE_WINDOW_CHARS`]) and reads the verdict as the case-insensitive
/// presence of the literal token "true" anywhere in the raw response. No
/// structured parsing: a malformed response means "false", which starts a
/// new segment.
pub struct LlmContinuityJudge {
    client: ChatClient,
}

impl LlmContinuityJudge {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContinuityJudge for LlmContinuityJudge {
    async fn same_topic(&self, current: &str, next: &str) -> Result<bool, SegmentError> {
        let a_tail = tail_chars(current, ORACLE_WINDOW_CHARS);
        let b_head = head_chars(next, ORACLE_WINDOW_CHARS);

        let user = format!(
            "You score whether two adjacent text segments continue the same topic.\n\
             Return JSON: {{\"same_topic\": true|false, \"confidence\": 0..1}}\n\
             Segment A:\n---\n{}\n---\nSegment B:\n---\n{}\n---",
            a_tail, b_head
        );

        let response = self
            .client
            .complete(BOUNDARY_SYSTEM, &user, BOUNDARY_TEMPERATURE, BOUNDARY_MAX_TOKENS)
            .await?;

        let same = response.to_lowercase().contains("true");
        debug!(same_topic = same, response_len = response.len(), "Oracle boundary verdict");
        Ok(same)
    }
}

/// Heading-pattern fallback used when no oracle is configured.
///
/// A block that looks like a heading (short capitalized label ending in a
/// colon, or a markdown heading marker) starts a new segment; anything else
/// merges into the running segment.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadingHeuristic;

fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[A-Z][\w\s]{0,40}:|#[#\s]|[A-Z][A-Za-z\s]{3,}:)")
            .expect("heading regex must compile")
    })
}

#[async_trait]
impl ContinuityJudge for HeadingHeuristic {
    async fn same_topic(&self, _current: &str, next: &str) -> Result<bool, SegmentError> {
        Ok(!heading_pattern().is_match(next))
    }
}

/// Deterministic judge driven by a pre-scripted verdict sequence.
///
/// Verdicts are consumed in call order; once exhausted every further call
/// answers the exhausted-fallback verdict (`false` unless built with
/// [`ScriptedJudge::always`]). Submitted text pairs are recorded for
/// assertions.
#[cfg(any(test, feature = "mock"))]
pub struct ScriptedJudge {
    verdicts: parking_lot::Mutex<std::collections::VecDeque<bool>>,
    exhausted_verdict: bool,
    calls: parking_lot::Mutex<Vec<(String, String)>>,
}

#[cfg(any(test, feature = "mock"))]
impl ScriptedJudge {
    /// Judge that answers from `verdicts` in order, then `false`.
    pub fn new(verdicts: Vec<bool>) -> Self {
        Self {
            verdicts: parking_lot::Mutex::new(verdicts.into()),
            exhausted_verdict: false,
            calls: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Judge that always answers `verdict`.
    pub fn always(verdict: bool) -> Self {
        Self {
            verdicts: parking_lot::Mutex::new(std::collections::VecDeque::new()),
            exhausted_verdict: verdict,
            calls: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Returns the `(current, next)` pairs submitted so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[cfg(any(test, feature = "mock"))]
#[async_trait]
impl ContinuityJudge for ScriptedJudge {
    async fn same_topic(&self, current: &str, next: &str) -> Result<bool, SegmentError> {
        self.calls
            .lock()
            .push((current.to_string(), next.to_string()));
        Ok(self
            .verdicts
            .lock()
            .pop_front()
            .unwrap_or(self.exhausted_verdict))
    }
}

/// Returns the first `n` characters of `s` (UTF-8 safe).
pub(crate) fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Returns the last `n` characters of `s` (UTF-8 safe).
pub(crate) fn tail_chars(s: &str, n: usize) -> &str {
    let total = s.chars().count();
    if total <= n {
        return s;
    }
    match s.char_indices().nth(total - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
