// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Appended to prompts whose output is parsed mechanically.
pub const PLAIN_LIST_INSTRUCTION: &str = "Return the final answer as a comma-separated list only. \
    Do NOT number the items. Do NOT include explanations or markdown.";

/// Fills `{name}` placeholders in a prompt template.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}
