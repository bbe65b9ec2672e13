//! Optional support verification of surviving excerpts.
//!
//! Annotation only: rows keep their place in the output whether or not the
//! model judges them supportive, and a verification failure leaves the row
//! unverified rather than dropping it.

use tracing::debug;

use crate::llm::{ChatClient, LlmError};
use crate::segment::continuity::head_chars;

#[cfg(test)]
mod tests;

/// Longest note carried into the output row, in characters.
pub const VERIFY_NOTE_MAX_CHARS: usize = 160;

const VERIFY_SYSTEM: &str =
    "You verify whether an excerpt evidences a sub-criterion and return minimal JSON only.";

const VERIFY_TEMPERATURE: f32 = 0.0;
const VERIFY_MAX_TOKENS: usize = 120;

/// Verdict for one excerpt.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub supports: bool,
    /// Raw model response, truncated.
    pub note: String,
}

/// Judges whether excerpts evidence their sub-criterion.
pub struct SupportVerifier {
    client: ChatClient,
}

impl SupportVerifier {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// Submits one excerpt for judgment.
    ///
    /// The verdict is the case-insensitive presence of the literal token
    /// "true" in the raw response, the same tolerant reading the continuity
    /// oracle uses; the note is the raw response truncated to
    /// [`VERIFY_NOTE_MAX_CHARS`].
    pub async fn verify(
        &self,
        subcriterion: &str,
        excerpt: &str,
    ) -> Result<Verification, LlmError> {
        let user = format!(
            "You are verifying if the excerpt provides evidence for the sub-criterion.\n\
             Return JSON: {{\"supports\": true|false, \"reason\": \"<=140 chars\"}}\n\
             Sub-criterion: {}\nExcerpt:\n---\n{}\n---",
            subcriterion, excerpt
        );

        let response = self
            .client
            .complete(VERIFY_SYSTEM, &user, VERIFY_TEMPERATURE, VERIFY_MAX_TOKENS)
            .await?;

        let verification = parse_verification(&response);
        debug!(
            supports = verification.supports,
            note_len = verification.note.len(),
            "Verified excerpt"
        );
        Ok(verification)
    }
}

fn parse_verification(response: &str) -> Verification {
    Verification {
        supports: response.to_lowercase().contains("true"),
        note: head_chars(response, VERIFY_NOTE_MAX_CHARS).to_string(),
    }
}
