//! Sentence boundary detection and chunk text finalization.
//!
//! Boundaries follow UAX #29, which handles enumerations and most
//! abbreviation punctuation better than naive `split('.')` over legal text.

use unicode_segmentation::UnicodeSegmentation;

/// Splits text into trimmed, non-empty sentences at UAX #29 boundaries.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Re-joins sentence-detector output with single spaces.
///
/// This is the finalization pass applied to every chunk: it collapses
/// inter-sentence whitespace (including the line breaks inserted while
/// merging blocks) without touching whitespace inside a sentence. Running it
/// on already-finalized text yields the identical string.
pub fn finalize_text(text: &str) -> String {
    split_sentences(text).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences_basic() {
        let sents = split_sentences("First sentence. Second sentence. Third?");
        assert_eq!(
            sents,
            vec!["First sentence.", "Second sentence.", "Third?"]
        );
    }

    #[test]
    fn test_split_sentences_line_breaks_are_boundaries() {
        let sents = split_sentences("Access controls reviewed\nScope: production systems.");
        assert_eq!(sents.len(), 2);
        assert_eq!(sents[0], "Access controls reviewed");
    }

    #[test]
    fn test_split_sentences_empty_input() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n\n  ").is_empty());
    }

    #[test]
    fn test_finalize_collapses_inter_sentence_whitespace() {
        let text = "Policy approved by the board.\n\nEffective from January.";
        assert_eq!(
            finalize_text(text),
            "Policy approved by the board. Effective from January."
        );
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let samples = [
            "One sentence only",
            "First. Second.  Third!\nFourth line? Yes.",
            "Sec. 4.2 applies. The auditor noted exceptions (see Appendix A). Remediation is due Q3.",
            "Findings:\nno material weaknesses.\n\nManagement response follows.",
        ];

        for sample in samples {
            let once = finalize_text(sample);
            let twice = finalize_text(&once);
            assert_eq!(once, twice, "finalization must be idempotent: {sample:?}");
        }
    }
}
