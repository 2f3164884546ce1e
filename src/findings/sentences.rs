//! Sentence segmentation and snippet normalization

use crate::crawler::collapse_whitespace;
use crate::findings::rules::{BRACKETED_ELLIPSIS, FEATURE_CUE, SECONDARY_DELIMITER};

/// Segments longer than this are candidates for secondary splitting
pub const OVERLONG_SEGMENT_CHARS: usize = 240;

/// Splits text into sentences
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace and then an
/// upper-case letter or `(`. Overlong segments containing a feature cue word
/// are split again on `;`, em-dash, middle-dot and bullet when that yields
/// more than one piece.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        if matches!(c, '.' | '!' | '?') {
            let mut next = i + 1;
            while next < chars.len() && chars[next].1.is_whitespace() {
                next += 1;
            }

            let has_gap = next > i + 1;
            let opens_sentence = chars
                .get(next)
                .map(|&(_, n)| n.is_uppercase() || n == '(')
                .unwrap_or(false);

            if has_gap && opens_sentence {
                push_segment(&mut segments, &text[start..offset + c.len_utf8()]);
                start = chars[next].0;
                i = next;
                continue;
            }
        }
        i += 1;
    }
    push_segment(&mut segments, &text[start..]);

    segments.into_iter().flat_map(resplit_overlong).collect()
}

fn push_segment(segments: &mut Vec<String>, raw: &str) {
    let segment = collapse_whitespace(raw);
    if !segment.is_empty() {
        segments.push(segment);
    }
}

fn resplit_overlong(segment: String) -> Vec<String> {
    if segment.chars().count() <= OVERLONG_SEGMENT_CHARS || !FEATURE_CUE.is_match(&segment) {
        return vec![segment];
    }

    let pieces: Vec<String> = SECONDARY_DELIMITER
        .split(&segment)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect();

    if pieces.len() > 1 {
        pieces
    } else {
        vec![segment]
    }
}

/// Removes bracketed ellipses, normalizes em/en dashes and collapses whitespace
pub fn clean_snippet(s: &str) -> String {
    let without_ellipses = BRACKETED_ELLIPSIS.replace_all(s, " ");
    let dashes = without_ellipses.replace(['—', '–'], "-");
    collapse_whitespace(&dashes)
}

/// Dedup key for a snippet
///
/// Lower-cased, cleaned as in [`clean_snippet`], with smart quotes removed and
/// trailing punctuation and whitespace trimmed.
pub fn dedup_key(s: &str) -> String {
    let cleaned = clean_snippet(s)
        .to_lowercase()
        .replace(['“', '”', '‘', '’'], "");

    cleaned
        .trim_end_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation() || c == '…')
        .to_string()
}
