//! Markdown report of answered questions.

use crate::rag::types::LogEntry;

pub const REPORT_TITLE: &str = "# Compliance Assistant report";
pub const EMPTY_REPORT: &str = "# Empty report";

/// Render history as Markdown, one section per question in chronological
/// order.
pub fn render_markdown(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return format!("{}\n", EMPTY_REPORT);
    }

    let mut lines: Vec<String> = vec![REPORT_TITLE.to_string(), String::new()];
    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!("## Query #{}", i + 1));
        lines.push(format!("**Question:** {}", entry.question));
        lines.push(String::new());
        lines.push("**Answer:**".to_string());
        lines.push(entry.answer.trim_end().to_string());
        lines.push(String::new());
        lines.push("**Sources:**".to_string());
        lines.push(entry.citations.clone());
        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}
