//! Section segmentation: locate named logical sections in linear full-text.
//!
//! ## Why keyword heuristics?
//!
//! Extracted paper text has no reliable structure: heading fonts are gone,
//! numbering schemes vary, and some PDFs interleave columns. Keyword search
//! with ordered synonym fallbacks is crude but predictable, and predictable
//! beats clever here because a miss degrades to a sentinel instead of
//! breaking the poster. The same policy has survived several revisions of
//! this pipeline unchanged.
//!
//! Two search tiers per synonym:
//!
//! 1. **Strict** — case-insensitive match anchored to line start, optionally
//!    preceded by a numeric or roman label ("3.", "3.1", "IV.").
//! 2. **Loose** — bare case-insensitive substring search, used only when the
//!    strict tier finds nothing for that synonym.
//!
//! Synonyms are tried in priority order and the first synonym with any hit
//! wins; later synonyms are never consulted, even if one of them would have
//! produced a more plausible span.
//!
//! The end of a span is the earliest later occurrence of any *other*
//! recognized keyword. Deliberately, "other" excludes only the current
//! section's synonyms, not those of sections already consumed, so a span can
//! run into a later repeat of an earlier heading. That quirk is part of the
//! observable contract (see `results_span_ends_at_repeat_of_earlier_heading`
//! below) and is not silently corrected.

use crate::config::SectionQuery;
use regex::Regex;
use tracing::debug;

/// A located section: byte offsets into the full-text string.
///
/// Non-empty spans satisfy `0 <= start < end <= full_text.len()`, with both
/// offsets on character boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpan {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

impl SectionSpan {
    /// The section's text within `full_text`.
    ///
    /// Callers must pass the same string the span was computed from.
    pub fn slice<'a>(&self, full_text: &'a str) -> &'a str {
        &full_text[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Locate one section. `recognized_others` is every keyword that may end the
/// span: other sections' synonyms plus terminal heading stems, all matched
/// case-insensitively as substrings.
///
/// Returns `None` when no synonym matches at all; callers render a sentinel
/// for that section rather than failing.
pub fn find_section(
    full_text: &str,
    query: &SectionQuery,
    recognized_others: &[String],
) -> Option<SectionSpan> {
    let lower = full_text.to_ascii_lowercase();

    let (start, matched_len) = query
        .keywords
        .iter()
        .filter(|kw| !kw.is_empty())
        .find_map(|kw| locate_keyword(full_text, &lower, kw))?;

    // Scan from the end of the matched keyword for the earliest occurrence
    // of any other recognized keyword; default is end-of-text.
    let scan_from = start + matched_len;
    let mut end = full_text.len();
    for other in recognized_others {
        let needle = other.to_ascii_lowercase();
        if needle.is_empty() {
            continue;
        }
        if let Some(pos) = lower[scan_from..].find(&needle) {
            end = end.min(scan_from + pos);
        }
    }

    debug!(
        section = %query.name,
        start,
        end,
        "located section span"
    );
    Some(SectionSpan {
        name: query.name.clone(),
        start,
        end,
    })
}

/// Locate a single keyword: strict heading match first, bare substring as
/// the fallback. Returns (byte offset, matched length).
fn locate_keyword(full_text: &str, lower: &str, keyword: &str) -> Option<(usize, usize)> {
    if let Some(pos) = strict_heading_find(full_text, keyword) {
        return Some((pos, keyword.len()));
    }
    lower
        .find(&keyword.to_ascii_lowercase())
        .map(|pos| (pos, keyword.len()))
}

/// Match `keyword` at the start of a line, optionally preceded by a numeric
/// ("3.", "3.1") or roman ("IV.") label. Returns the offset of the keyword
/// itself, not of the label.
fn strict_heading_find(full_text: &str, keyword: &str) -> Option<usize> {
    let pattern = format!(
        r"(?mi)^[ \t]*(?:(?:\d+(?:\.\d+)*|[IVXLCM]{{1,4}})[.)]?[ \t]+)?({})",
        regex::escape(keyword)
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(full_text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.start())
}

/// The boundary pool for section `current`: every other section's synonyms
/// plus the terminal stems, minus anything that is a synonym of the current
/// section (case-insensitive comparison).
pub fn other_keywords(
    sections: &[SectionQuery],
    current: usize,
    boundary_keywords: &[String],
) -> Vec<String> {
    let own: Vec<String> = sections[current]
        .keywords
        .iter()
        .map(|k| k.to_ascii_lowercase())
        .collect();

    let mut pool: Vec<String> = Vec::new();
    for (i, section) in sections.iter().enumerate() {
        if i == current {
            continue;
        }
        pool.extend(section.keywords.iter().cloned());
    }
    pool.extend(boundary_keywords.iter().cloned());
    pool.retain(|k| !own.contains(&k.to_ascii_lowercase()));
    pool
}

/// Segment every configured section. Each entry is `(name, span)` in the
/// order the sections were configured; `None` means the section was never
/// found.
pub fn segment_all(
    full_text: &str,
    sections: &[SectionQuery],
    boundary_keywords: &[String],
) -> Vec<(String, Option<SectionSpan>)> {
    sections
        .iter()
        .enumerate()
        .map(|(i, query)| {
            let others = other_keywords(sections, i, boundary_keywords);
            let span = find_section(full_text, query, &others);
            (query.name.clone(), span)
        })
        .collect()
}
