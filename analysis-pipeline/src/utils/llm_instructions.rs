//! Prompt text handed to the summarization oracle.

/// Formatting contract for every diagram the oracle emits, so downstream renderers can parse it.
pub static DIAGRAM_RULES: &str = "\
- Wrap each diagram in a ```mermaid fenced code block.
- Start with `graph TD` or `graph LR`.
- Node IDs must be plain identifiers without spaces, quotes or punctuation (e.g. `Client`, `ApiServer`).
- Every node label must be wrapped in double quotes, e.g. `Client[\"Client Browser\"]`.
- Escape double quotes inside a label as `\\\"`.";

pub fn full_analysis_prompt(repo_name: &str, files: &[String]) -> String {
    format!(
        "Analyze this file list for the repository \"{repo_name}\".\n\n\
         1. Describe the tech stack and the overall architecture.\n\
         2. Generate a high-level system architecture diagram using Mermaid.js syntax.\n\n\
         Diagram rules:\n{DIAGRAM_RULES}\n\n\
         File list:\n{files}",
        files = files.join("\n")
    )
}

pub fn patch_prompt(repo_name: &str, current_summary: &str, changed_files: &[String]) -> String {
    format!(
        "You are updating an existing architecture summary for the repository \"{repo_name}\".\n\n\
         ### Current summary:\n{current_summary}\n\n\
         ### Changed files:\n{changed}\n\n\
         ### Task:\n\
         Revise the summary to reflect these changes. Keep its structure and copy unchanged \
         sections verbatim. Only update the Mermaid diagram if the architecture changed \
         materially.\n\n\
         Diagram rules:\n{DIAGRAM_RULES}",
        changed = changed_files.join("\n")
    )
}

pub fn comparison_prompt(
    first_name: &str,
    first_summary: &str,
    second_name: &str,
    second_summary: &str,
) -> String {
    format!(
        "Compare these two repositories.\n\n\
         ### {first_name}\n{first_summary}\n\n\
         ### {second_name}\n{second_summary}\n\n\
         Produce a Markdown battle report with the sections:\n\
         1. Tech Stack Face-off\n\
         2. Architecture Comparison\n\
         3. Use Case Verdict: when to choose one over the other."
    )
}
