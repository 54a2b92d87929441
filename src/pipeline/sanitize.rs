//! Sanitation: deterministic cleanup of model-produced summary text.
//!
//! ## Why is sanitation necessary?
//!
//! The prompt demands plain prose, but chat models still garnish their
//! output with artefacts the poster must never show:
//!
//! - Wrapping the whole answer in ` ``` ` fences
//! - Opening with a label like "Summary:" despite being told not to
//! - Quoting the entire answer
//! - Markdown emphasis (`**bold**`, `*italic*`, backticks) that would
//!   render as literal asterisks on the canvas
//! - Hard line breaks and bullet markers that fight the compositor's own
//!   word wrapping
//!
//! Each rule is a cheap regex or string pass, independently testable, and
//! the pipeline is a fixed-order composition of them. Sentinel texts travel
//! through unchanged; they contain none of the patterns above.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule to raw model output, in order:
///
/// 1. Strip outer code fences
/// 2. Drop a leading "Summary:" style label
/// 3. Unwrap whole-answer quotes
/// 4. Remove markdown emphasis and bullet markers
/// 5. Collapse all whitespace runs to single spaces and trim
pub fn clean_summary(input: &str) -> String {
    let s = strip_code_fences(input);
    let s = strip_leading_label(&s);
    let s = strip_wrapping_quotes(&s);
    let s = strip_markdown_emphasis(&s);
    collapse_whitespace(&s)
}

// ── Rule 1: Strip outer code fences ─────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\n?(.*?)\n?```\s*$").unwrap());

/// Remove a fence pair wrapping the whole text, tolerating a language tag.
/// Public because the batched-response parser needs the raw JSON inside.
pub fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Drop a leading label ────────────────────────────────────────

static RE_LEAD_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:(?:here(?:'s| is)\s+(?:a\s+|the\s+)?)?summary(?:\s+of\s+[^:\n]{0,60})?|answer)\s*:\s*")
        .unwrap()
});

fn strip_leading_label(input: &str) -> String {
    RE_LEAD_LABEL.replace(input, "").to_string()
}

// ── Rule 3: Unwrap whole-answer quotes ──────────────────────────────────

const QUOTE_PAIRS: [(char, char); 3] = [('"', '"'), ('\u{201c}', '\u{201d}'), ('\'', '\'')];

fn strip_wrapping_quotes(input: &str) -> String {
    let trimmed = input.trim();
    for (open, close) in QUOTE_PAIRS {
        if trimmed.len() > open.len_utf8() + close.len_utf8()
            && trimmed.starts_with(open)
            && trimmed.ends_with(close)
        {
            return trimmed[open.len_utf8()..trimmed.len() - close.len_utf8()].to_string();
        }
    }
    trimmed.to_string()
}

// ── Rule 4: Remove markdown emphasis and bullets ────────────────────────

static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static RE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static RE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-•*][ \t]+").unwrap());

fn strip_markdown_emphasis(input: &str) -> String {
    let s = RE_BOLD.replace_all(input, "$1");
    let s = RE_ITALIC.replace_all(&s, "$1");
    let s = RE_CODE.replace_all(&s, "$1");
    RE_BULLET.replace_all(&s, "").to_string()
}

// ── Rule 5: Collapse whitespace ─────────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_with_language_tag_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\nplain\n```"), "plain");
    }

    #[test]
    fn unfenced_text_is_untouched_by_fence_rule() {
        assert_eq!(strip_code_fences("no fences here"), "no fences here");
        // an opening fence without a closing one is not a wrap
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}"), "```json\n{\"a\": 1}");
    }

    #[test]
    fn summary_label_is_dropped() {
        assert_eq!(strip_leading_label("Summary: The model works."), "The model works.");
        assert_eq!(
            strip_leading_label("Here is a summary of the section: Words."),
            "Words."
        );
        assert_eq!(strip_leading_label("No label at all."), "No label at all.");
    }

    #[test]
    fn label_rule_only_fires_at_the_start() {
        assert_eq!(
            strip_leading_label("The summary: statistics improved."),
            "The summary: statistics improved."
        );
    }

    #[test]
    fn wrapping_quotes_are_removed() {
        assert_eq!(strip_wrapping_quotes("\"quoted answer\""), "quoted answer");
        assert_eq!(strip_wrapping_quotes("\u{201c}smart\u{201d}"), "smart");
        assert_eq!(strip_wrapping_quotes("'single'"), "single");
    }

    #[test]
    fn interior_quotes_survive() {
        assert_eq!(
            strip_wrapping_quotes("the \"foo\" dataset wins"),
            "the \"foo\" dataset wins"
        );
    }

    #[test]
    fn emphasis_markers_are_removed_but_text_kept() {
        assert_eq!(
            strip_markdown_emphasis("**BERT** beats *all* `baselines`"),
            "BERT beats all baselines"
        );
    }

    #[test]
    fn bullet_markers_are_removed() {
        assert_eq!(
            strip_markdown_emphasis("- first point\n- second point"),
            "first point\nsecond point"
        );
    }

    #[test]
    fn whitespace_collapses_to_single_spaces() {
        assert_eq!(collapse_whitespace("a\nb\t c   d "), "a b c d");
    }

    #[test]
    fn full_pipeline_on_a_messy_answer() {
        let messy = "```\nSummary: **Widgets** improve\nresults   by *12%*.\n```";
        assert_eq!(clean_summary(messy), "Widgets improve results by 12%.");
    }

    #[test]
    fn sentinels_pass_through_unchanged() {
        let s = "[No Results section found in the paper.]";
        assert_eq!(clean_summary(s), s);
    }

    #[test]
    fn clean_summary_is_idempotent_on_clean_text() {
        let clean = "Three plain sentences. With numbers 42. And names.";
        assert_eq!(clean_summary(clean), clean);
        assert_eq!(clean_summary(&clean_summary(clean)), clean_summary(clean));
    }
}
