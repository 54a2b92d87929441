//! Layout math for the fixed-size canvas: column geometry, greedy block
//! placement, pixel-width word wrapping.
//!
//! Everything here is arithmetic over a measure closure, so the compositor
//! is the only module that ever touches a font. That keeps the wrap and
//! placement rules testable with a character-count measure and keeps the
//! output deterministic: same text, same measure, same lines.

use crate::config::PosterStyle;

/// Canvas dimensions are fixed; posters are landscape 16:9 regardless of
/// content volume. Overflowing content is clipped at column bounds, never
/// reflowed onto a second canvas.
pub const CANVAS_WIDTH: u32 = 1920;
pub const CANVAS_HEIGHT: u32 = 1080;

/// One body column. `cursor` is the next free y coordinate and only ever
/// grows as blocks are placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub x: u32,
    pub width: u32,
    pub cursor: u32,
}

/// Equal-width columns across the inner canvas area, starting below the
/// header band. Integer division slack stays on the right margin.
pub fn build_columns(style: &PosterStyle, count: u32) -> Vec<Column> {
    let count = count.max(1);
    let inner = CANVAS_WIDTH - 2 * style.margin - (count - 1) * style.column_gap;
    let width = inner / count;
    let top = style.header_height + style.margin;

    (0..count)
        .map(|i| Column {
            x: style.margin + i * (width + style.column_gap),
            width,
            cursor: top,
        })
        .collect()
}

/// Lowest usable y coordinate; blocks must not draw past it.
pub fn column_bottom(style: &PosterStyle) -> u32 {
    CANVAS_HEIGHT - style.margin
}

/// Index of the column with the lowest cursor. Ties go to the leftmost
/// column, which keeps placement deterministic.
pub fn shortest_column(columns: &[Column]) -> usize {
    columns
        .iter()
        .enumerate()
        .min_by_key(|(i, c)| (c.cursor, *i))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Greedy word wrap against a pixel measure.
///
/// A line is extended while `measure(line + word + " ")` stays within
/// `max_width`, matching how the line will eventually be drawn with an
/// advancing pen. The trailing space makes the check slightly conservative,
/// which reads better than occasionally kissing the column edge. A single
/// word wider than the column gets its own line; words are never split.
pub fn wrap_words<F>(text: &str, max_width: u32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> u32,
{
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = format!("{line}{word} ");
        if line.is_empty() || measure(&candidate) <= max_width {
            line = candidate;
        } else {
            lines.push(line.trim_end().to_string());
            line = format!("{word} ");
        }
    }
    let last = line.trim_end();
    if !last.is_empty() {
        lines.push(last.to_string());
    }
    lines
}
