//! Title and summary heuristics for stories created from diary OCR output.
//!
//! These are deliberately cheap, synchronous text heuristics (no model call):
//! the create-story endpoint exists to close the loop fast for a user waiting
//! on the UI, and the text can be retitled later.

/// A sentence must be at least this long to be used as a title.
const TITLE_MIN_CHARS: usize = 10;
/// Maximum title length in characters.
const TITLE_MAX_CHARS: usize = 80;
/// Maximum summary length in characters.
const SUMMARY_MAX_CHARS: usize = 200;

/// Truncate to at most `max` characters (not bytes), trimming trailing space.
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect::<String>().trim_end().to_string()
}

/// Derive a title: the first sentence of at least [`TITLE_MIN_CHARS`]
/// characters, capped at [`TITLE_MAX_CHARS`]. Falls back to the leading text,
/// then to a fixed placeholder for empty input.
pub fn derive_title(text: &str) -> String {
    for sentence in text.split(['.', '!', '?']) {
        let sentence = sentence.trim();
        if sentence.chars().count() >= TITLE_MIN_CHARS {
            return truncate_chars(sentence, TITLE_MAX_CHARS);
        }
    }

    let fallback = truncate_chars(text.trim(), TITLE_MAX_CHARS);
    if fallback.is_empty() {
        "Family story".to_string()
    } else {
        fallback
    }
}

/// Derive a summary: the first [`SUMMARY_MAX_CHARS`] characters of the text.
pub fn derive_summary(text: &str) -> String {
    truncate_chars(text.trim(), SUMMARY_MAX_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_uses_first_long_sentence() {
        let text = "Oct 3. We drove out to the lake before sunrise. The fish were biting.";
        assert_eq!(derive_title(text), "We drove out to the lake before sunrise");
    }

    #[test]
    fn test_title_skips_short_fragments() {
        assert_eq!(derive_title("Hi. Ok! This one is long enough to be a title."),
            "This one is long enough to be a title");
    }

    #[test]
    fn test_title_is_capped() {
        let text = "a".repeat(300);
        assert_eq!(derive_title(&text).chars().count(), 80);
    }

    #[test]
    fn test_title_fallback_for_short_text() {
        assert_eq!(derive_title("Oct 3."), "Oct 3.");
    }

    #[test]
    fn test_title_placeholder_for_empty_text() {
        assert_eq!(derive_title(""), "Family story");
        assert_eq!(derive_title("   "), "Family story");
    }

    #[test]
    fn test_summary_is_first_200_chars() {
        let text = "x".repeat(500);
        assert_eq!(derive_summary(&text).chars().count(), 200);

        assert_eq!(derive_summary("A short entry."), "A short entry.");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // Multi-byte characters must not be split.
        let text = "日記".repeat(200);
        let summary = derive_summary(&text);
        assert_eq!(summary.chars().count(), 200);
    }
}
