//! Prompt templates for section summaries and change explanations

use specgraph_core::search::highlight::truncate_snippet;
use specgraph_core::ChangeType;

use super::bridge::{ExplainRequest, SummaryRequest};

/// Section text beyond this many characters is cut before prompting.
pub const MAX_SECTION_CHARS: usize = 6000;

pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a standards analyst. Summarize specification sections precisely and briefly.";

pub const EXPLAIN_SYSTEM_PROMPT: &str =
    "You are a standards analyst. Explain specification changes and their consequences for implementers.";

fn change_phrase(change_type: ChangeType) -> &'static str {
    match change_type {
        ChangeType::Added => "was added in the new version",
        ChangeType::Removed => "was removed in the new version",
        ChangeType::Modified => "was modified between versions",
        ChangeType::Unchanged => "is unchanged between versions",
    }
}

fn section_header(request: &SummaryRequest) -> String {
    let mut header = format!(
        "Section {} \"{}\" {}.",
        request.id,
        request.title,
        change_phrase(request.change_type)
    );
    if let Some(parent) = &request.parent_title {
        header.push_str(&format!("\nIt belongs to \"{parent}\"."));
    }
    if let Some(counterpart) = &request.counterpart {
        header.push_str(&format!(
            "\nIt corresponds to section {counterpart} in the other version (renumbered)."
        ));
    }
    header
}

/// Generate a prompt for a one-to-two sentence section summary
pub fn summary_prompt(request: &SummaryRequest) -> String {
    format!(
        r#"{}

Section text:
"""
{}
"""

Summarize in at most two sentences what this section specifies. Do not repeat the section number."#,
        section_header(request),
        truncate_snippet(&request.text, MAX_SECTION_CHARS)
    )
}

/// Generate a prompt explaining a change and its downstream effect
pub fn explain_prompt(request: &ExplainRequest) -> String {
    let impacted = if request.impacted.is_empty() {
        "(none)".to_string()
    } else {
        request
            .impacted
            .iter()
            .map(|s| format!("- {} {}", s.id, s.title))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"{}

Section text:
"""
{}
"""

Sections directly affected by this change:
{}

Explain what changed, why an implementer should care, and which of the affected sections need review."#,
        section_header(&request.section),
        truncate_snippet(&request.section.text, MAX_SECTION_CHARS),
        impacted
    )
}
