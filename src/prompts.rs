//! Prompts for the remote summarizer.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the summary contract (sentence
//!    count, tone, the batched JSON shape) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can import and inspect prompts directly
//!    without calling a real model, making prompt regressions easy to catch.
//!
//! Callers can override the system prompt via
//! [`crate::config::PosterConfig::system_prompt`]; the constants here are
//! used only when no override is provided.

/// Default system prompt for per-section summarization.
///
/// Used when `PosterConfig::system_prompt` is `None`.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a research assistant that summarizes sections of academic papers for a one-page poster.

Follow these rules precisely:

1. LENGTH
   - Write exactly three concise sentences
   - Each sentence under 30 words

2. CONTENT
   - State what the section actually says, not what it is about
   - Keep key numbers, dataset names, and method names verbatim
   - Never invent results that are not in the text

3. OUTPUT FORMAT
   - Output plain prose only
   - No markdown, no bullet points, no headings, no quotation marks
   - Do NOT begin with phrases like "This section" or "Summary:""#;

/// System prompt for batched mode: one request, all sections, strict JSON.
///
/// The `{names}` placeholder is filled by [`batched_system_prompt`].
const BATCHED_SYSTEM_PROMPT: &str = r#"You are a research assistant that summarizes academic papers for a one-page poster.

You will receive the full text of a paper. Respond with a single JSON object and nothing else.

Follow these rules precisely:

1. KEYS
   - The object must contain exactly these keys: {names}
   - Do not add, rename, or omit keys

2. VALUES
   - Each value is a plain-text summary of that section in exactly three concise sentences
   - Keep key numbers, dataset names, and method names verbatim
   - If the paper has no such section, use an empty string "" as the value

3. OUTPUT FORMAT
   - Output raw JSON only
   - No markdown fences, no commentary before or after the object"#;

/// Build the user message for a single-section summary request.
pub fn section_user_prompt(section_name: &str, text: &str) -> String {
    format!(
        "Summarize the {section_name} section of this paper in three concise sentences:\n\n{text}"
    )
}

/// Build the system prompt for batched mode from the requested section names.
pub fn batched_system_prompt(names: &[&str]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("\"{n}\"")).collect();
    BATCHED_SYSTEM_PROMPT.replace("{names}", &quoted.join(", "))
}

/// Build the user message for a batched summary request.
pub fn batched_user_prompt(text: &str) -> String {
    format!("Full paper text:\n\n{text}")
}
