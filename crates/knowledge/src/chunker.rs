//! Text chunking with configurable size and overlap.
//!
//! Works on characters, not bytes. Whitespace runs are collapsed first,
//! then each chunk is cut at the last `". "` inside its window unless that
//! would leave it under half the target size.

use std::ops::Range;

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Character ranges of each chunk over the normalized text.
///
/// Consecutive ranges overlap by up to `overlap` characters. Every step
/// advances the start by at least one character, so this terminates for
/// any `max_chars` and `overlap`.
pub fn chunk_spans(chars: &[char], max_chars: usize, overlap: usize) -> Vec<Range<usize>> {
    let len = chars.len();
    let mut spans = Vec::new();
    let mut start = 0;

    while start < len {
        let end = (start + max_chars).min(len);
        let min_cut = start as f64 + max_chars as f64 * 0.5;

        // The period itself must sit at least half a window past the start
        let cut = match last_sentence_end(chars, start, end) {
            Some(cut) if (cut - 1) as f64 >= min_cut => cut,
            _ => end,
        };

        spans.push(start..cut);

        if cut >= len {
            break;
        }
        start = cut.saturating_sub(overlap).max(start + 1);
    }

    spans
}

/// Position just past the last `.` that is followed by a space, with both
/// characters inside `[start, end)`.
fn last_sentence_end(chars: &[char], start: usize, end: usize) -> Option<usize> {
    if end < start + 2 {
        return None;
    }
    (start..end - 1)
        .rev()
        .find(|&i| chars[i] == '.' && chars[i + 1] == ' ')
        .map(|i| i + 1)
}

/// Chunk text into overlapping, trimmed, non-empty passages.
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    let normalized = normalize_whitespace(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = normalized.chars().collect();
    let chunks: Vec<String> = chunk_spans(&chars, max_chars, overlap)
        .into_iter()
        .map(|span| chars[span].iter().collect::<String>().trim().to_string())
        .filter(|chunk| !chunk.is_empty())
        .collect();

    tracing::debug!(
        "Chunked {} chars into {} chunks (size: {}, overlap: {})",
        chars.len(),
        chunks.len(),
        max_chars,
        overlap
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans_of(text: &str, max_chars: usize, overlap: usize) -> (Vec<char>, Vec<Range<usize>>) {
        let chars: Vec<char> = normalize_whitespace(text).chars().collect();
        let spans = chunk_spans(&chars, max_chars, overlap);
        (chars, spans)
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(chunk_text("", 100, 10).is_empty());
        assert!(chunk_text(" \n\t  ", 100, 10).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("  One   rule.\nTwo rules. ", 900, 120);
        assert_eq!(chunks, vec!["One rule. Two rules."]);
    }

    #[test]
    fn test_prefers_sentence_boundary() {
        let text = format!("{}. {}", "a".repeat(70), "b".repeat(60));
        let chunks = chunk_text(&text, 100, 0);
        assert_eq!(chunks[0], format!("{}.", "a".repeat(70)));
        assert_eq!(chunks[1], "b".repeat(60));
    }

    #[test]
    fn test_early_boundary_falls_back_to_hard_cut() {
        // The only ". " sits at 10 of 100, under half the target size
        let text = format!("{}. {}", "a".repeat(9), "b".repeat(200));
        let chunks = chunk_text(&text, 100, 0);
        assert_eq!(chunks[0].chars().count(), 100);
    }

    #[test]
    fn test_half_window_threshold_uses_period_position() {
        // Period at index 9 of a 20-char window: just under half, rejected
        let early = format!("{}. {}", "a".repeat(9), "b".repeat(30));
        assert_eq!(chunk_text(&early, 20, 0)[0].chars().count(), 20);

        // Period at index 10: exactly half, accepted
        let half = format!("{}. {}", "a".repeat(10), "b".repeat(30));
        assert_eq!(chunk_text(&half, 20, 0)[0], format!("{}.", "a".repeat(10)));
    }

    #[test]
    fn test_hard_cut_with_overlap() {
        let text = "x".repeat(250);
        let (_, spans) = spans_of(&text, 100, 20);
        assert_eq!(spans, vec![0..100, 80..180, 160..250]);
    }

    #[test]
    fn test_overlap_larger_than_chunk_still_progresses() {
        let text = "y".repeat(50);
        let (_, spans) = spans_of(&text, 10, 30);
        assert!(spans.windows(2).all(|w| w[1].start > w[0].start));
        assert_eq!(spans.last().map(|s| s.end), Some(50));
    }

    #[test]
    fn test_zero_max_chars_terminates() {
        assert!(chunk_text("some text here", 0, 0).is_empty());
    }

    #[test]
    fn test_chunks_are_non_empty_and_bounded() {
        let text = "Clients must be identified. Transfers above the limit need review. "
            .repeat(40);
        for (max_chars, overlap) in [(50, 10), (120, 0), (300, 299), (900, 120)] {
            let chunks = chunk_text(&text, max_chars, overlap);
            assert!(!chunks.is_empty());
            assert!(chunks
                .iter()
                .all(|c| !c.is_empty() && c.chars().count() <= max_chars));
        }
    }

    #[test]
    fn test_spans_cover_normalized_text() {
        let text = "Правило первое. Правило второе про санкции.   Третье правило!\n\n".repeat(25);
        for (max_chars, overlap) in [(40, 5), (90, 30), (500, 120)] {
            let (chars, spans) = spans_of(&text, max_chars, overlap);
            assert_eq!(spans.first().map(|s| s.start), Some(0));
            assert_eq!(spans.last().map(|s| s.end), Some(chars.len()));

            // Each span starts inside or at the end of the previous one
            let mut rebuilt: String = chars[spans[0].clone()].iter().collect();
            for pair in spans.windows(2) {
                assert!(pair[1].start <= pair[0].end);
                rebuilt.extend(&chars[pair[0].end..pair[1].end]);
            }
            assert_eq!(rebuilt, normalize_whitespace(&text));
        }
    }

    #[test]
    fn test_multibyte_text_is_safe() {
        let text = "Санкционный контроль обязателен. ".repeat(30);
        let chunks = chunk_text(&text, 64, 16);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 64));
    }
}
