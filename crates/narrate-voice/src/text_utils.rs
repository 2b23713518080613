//! Text preprocessing for speech.
//!
//! Splits text into the sentence segments the local engine speaks one
//! utterance at a time, and measures them for progress reporting.

/// Whether `text` contains anything worth speaking.
pub fn is_speakable(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Split text into sentences on terminal punctuation (`.`, `!`, `?`).
///
/// Punctuation stays attached to the sentence it ends, and a run of marks
/// like `?!` or `...` ends a single sentence. No whitespace is needed after
/// the mark: `Hello.World.` is two sentences. The one exception is a `.`
/// between two digits (`3.14`), which is a decimal point. Segments are
/// trimmed and empty ones dropped; trailing text without a terminal mark
/// becomes the last sentence.
#[must_use]
pub fn segment_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut previous = None;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let next = chars.peek().copied();

        let decimal_point = c == '.'
            && previous.is_some_and(|p: char| p.is_ascii_digit())
            && next.is_some_and(|n| n.is_ascii_digit());
        let at_boundary =
            is_terminal(c) && !decimal_point && !next.is_some_and(is_terminal);
        if at_boundary {
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
        previous = Some(c);
    }

    push_trimmed(&mut sentences, &current);
    sentences
}

const fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Length of a segment as counted by progress offsets.
pub fn char_len(segment: &str) -> usize {
    segment.chars().count()
}

/// Cumulative character offsets after each segment.
///
/// `offsets[i]` is the number of characters spoken once segment `i` has
/// finished.
pub fn cumulative_offsets(segments: &[String]) -> Vec<usize> {
    segments
        .iter()
        .scan(0usize, |spoken, segment| {
            *spoken += char_len(segment);
            Some(*spoken)
        })
        .collect()
}

/// Characters counted once all of `text` has been spoken.
///
/// Matches the last offset of the segmented text, so both engines report
/// the same final position for the same document.
pub fn spoken_len(text: &str) -> usize {
    cumulative_offsets(&segment_sentences(text))
        .last()
        .copied()
        .unwrap_or_default()
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_trimmed(sentences: &mut Vec<String>, segment: &str) {
    let trimmed = segment.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        assert_eq!(segment_sentences("Hello. World."), vec!["Hello.", "World."]);
    }

    #[test]
    fn keeps_punctuation_with_preceding_sentence() {
        assert_eq!(
            segment_sentences("Really? Yes! Fine."),
            vec!["Really?", "Yes!", "Fine."]
        );
    }

    #[test]
    fn keeps_unterminated_tail() {
        assert_eq!(
            segment_sentences("First one. and then some"),
            vec!["First one.", "and then some"]
        );
    }

    #[test]
    fn discards_empty_segments() {
        assert_eq!(segment_sentences("  .  Ok.  "), vec![".", "Ok."]);
        assert!(segment_sentences("   \n\t ").is_empty());
    }

    #[test]
    fn punctuation_runs_and_decimals_stay_together() {
        assert_eq!(
            segment_sentences("Wait... what?! Pi is 3.14 today."),
            vec!["Wait...", "what?!", "Pi is 3.14 today."]
        );
    }

    #[test]
    fn splits_without_whitespace_after_the_mark() {
        assert_eq!(segment_sentences("Hello.World."), vec!["Hello.", "World."]);
        assert_eq!(
            segment_sentences("Hello.World.How are you?Fine."),
            vec!["Hello.", "World.", "How are you?", "Fine."]
        );
        assert_eq!(segment_sentences("Stop!!Go...now"), vec!["Stop!!", "Go...", "now"]);
    }

    #[test]
    fn decimal_point_needs_digits_on_both_sides() {
        assert_eq!(segment_sentences("Version 2.5.Done."), vec!["Version 2.5.", "Done."]);
        assert_eq!(segment_sentences("Room 4.B wing."), vec!["Room 4.", "B wing."]);
    }

    #[test]
    fn newlines_separate_sentences() {
        assert_eq!(
            segment_sentences("One.\nTwo!\n\nThree?"),
            vec!["One.", "Two!", "Three?"]
        );
    }

    #[test]
    fn segments_rejoin_to_whitespace_normalized_text() {
        let text = "  The quick   brown fox.\n Jumps over!  The lazy\tdog?  Done ";
        let segments = segment_sentences(text);
        assert_eq!(
            collapse_whitespace(&segments.join(" ")),
            collapse_whitespace(text)
        );
    }

    #[test]
    fn offsets_accumulate_character_lengths() {
        let segments = segment_sentences("Hello. World.");
        assert_eq!(cumulative_offsets(&segments), vec![6, 12]);
    }

    #[test]
    fn offsets_count_chars_not_bytes() {
        let segments = segment_sentences("Café. Naïve.");
        assert_eq!(cumulative_offsets(&segments), vec![5, 11]);
    }

    #[test]
    fn spoken_len_matches_last_offset() {
        assert_eq!(spoken_len("Hello. World."), 12);
        assert_eq!(spoken_len("  Hello.\n\n World.  "), 12);
        assert_eq!(spoken_len("   "), 0);
    }

    #[test]
    fn speakable_requires_non_whitespace() {
        assert!(is_speakable(" a "));
        assert!(!is_speakable(" \n "));
        assert!(!is_speakable(""));
    }
}
