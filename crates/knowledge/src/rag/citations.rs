//! Citation block formatting and enforcement.

use crate::types::SearchResult;
use regex::Regex;

/// Header of an appended citation block.
pub const SOURCES_HEADER: &str = "Sources:";

/// One line per passage, `[i] title - source_uri`, numbered from 1 in
/// ranked order.
pub fn format_citations(passages: &[SearchResult]) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, p)| format!("[{}] {} - {}", i + 1, p.chunk.title, p.chunk.source_uri))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether `answer` already names a sources section.
///
/// Markers match as whole words, ignoring case, so "resources" does not
/// count as "Sources".
pub fn has_citation_marker(answer: &str, markers: &[String]) -> bool {
    markers
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .any(|m| marker_pattern(m).is_some_and(|re| re.is_match(answer)))
}

fn marker_pattern(marker: &str) -> Option<Regex> {
    match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(marker))) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("Ignoring citation marker {:?}: {}", marker, e);
            None
        }
    }
}

/// Append `citations` under a sources header unless a marker is present.
pub fn ensure_citations(answer: &str, citations: &str, markers: &[String]) -> String {
    if has_citation_marker(answer, markers) {
        return answer.to_string();
    }
    format!("{}\n\n{}\n{}", answer.trim_end(), SOURCES_HEADER, citations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    fn passage(title: &str) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: format!("{}-0", title),
                parent_document_id: title.to_string(),
                title: title.to_string(),
                source_uri: format!("file:///kb/{}", title),
                text: "text".to_string(),
                ordinal: 0,
            },
            score: 0.1,
        }
    }

    fn markers() -> Vec<String> {
        vec!["Sources".to_string(), "Источники".to_string()]
    }

    #[test]
    fn test_format_citations_in_ranked_order() {
        let block = format_citations(&[passage("kyc.md"), passage("aml.md")]);
        assert_eq!(
            block,
            "[1] kyc.md - file:///kb/kyc.md\n[2] aml.md - file:///kb/aml.md"
        );
    }

    #[test]
    fn test_appends_when_marker_missing() {
        let block = format_citations(&[passage("kyc.md")]);
        let answer = ensure_citations("Verify the client [1].\n", &block, &markers());
        assert_eq!(
            answer,
            "Verify the client [1].\n\nSources:\n[1] kyc.md - file:///kb/kyc.md"
        );
    }

    #[test]
    fn test_existing_marker_is_kept_any_case() {
        let markers = markers();
        let en = "Answer.\n\nsources: [1]";
        assert_eq!(ensure_citations(en, "[1] x - y", &markers), en);

        let ru = "Ответ.\n\nИСТОЧНИКИ: [1]";
        assert_eq!(ensure_citations(ru, "[1] x - y", &markers), ru);
    }

    #[test]
    fn test_marker_inside_longer_word_does_not_count() {
        let markers = markers();
        for answer in [
            "See the HR resources [1].",
            "Outsources the screening [1].",
            "Ресурсы и первоисточники [1].",
        ] {
            assert!(!has_citation_marker(answer, &markers), "{}", answer);
            let cited = ensure_citations(answer, "[1] a.md - file:///a.md", &markers);
            assert!(cited.ends_with("Sources:\n[1] a.md - file:///a.md"));
        }
    }

    #[test]
    fn test_marker_with_punctuation_counts() {
        let markers = markers();
        assert!(has_citation_marker("Done.\n\n**Sources**: [1]", &markers));
        assert!(has_citation_marker("Готово.\nИсточники:\n[1]", &markers));
    }

    #[test]
    fn test_blank_markers_ignored() {
        assert!(!has_citation_marker("anything", &["  ".to_string()]));
    }
}
