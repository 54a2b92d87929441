//! Poster composition: deterministic rendering of the assembled spec onto
//! a fixed 1920x1080 canvas.
//!
//! ## Why determinism?
//!
//! The same [`PosterSpec`] must always produce byte-identical pixels. That
//! makes posters diffable, cacheable by content hash, and testable without
//! golden-image tolerance games. Everything here is pure arithmetic over
//! loaded font metrics: no clocks, no randomness, no hash-order iteration.
//!
//! ## Overflow policy
//!
//! The canvas never grows and text never reflows to a second page. Content
//! is placed top-down per column and clipped at the column floor: body
//! lines that would cross it are dropped, and a section or figure block
//! that cannot start above it is skipped entirely. A very long paper
//! produces a poster that simply stops, which is the correct behavior for
//! a glanceable one-page artifact.
//!
//! Fonts are the one external asset. A declared font path that cannot be
//! loaded is fatal ([`PosterError::FontAssetMissing`]); with no declared
//! path, well-known system locations are searched.

use crate::config::{Palette, PosterStyle};
use crate::error::PosterError;
use crate::output::PosterSpec;
use crate::pipeline::layout::{
    build_columns, column_bottom, shortest_column, wrap_words, Column, CANVAS_HEIGHT, CANVAS_WIDTH,
};
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use qrcode::{EcLevel, QrCode};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Left inset of heading text inside its accent bar.
const HEADING_TEXT_INSET: u32 = 12;

/// A composed poster before PNG encoding.
#[derive(Debug)]
pub struct Composition {
    pub canvas: RgbImage,
    /// Figures actually drawn; figures that could not fit were skipped.
    pub figures_placed: usize,
}

/// Render `spec` onto a fresh canvas. The only fallible step is font
/// loading; layout itself cannot fail, it can only clip.
pub fn compose_poster(spec: &PosterSpec, style: &PosterStyle) -> Result<Composition, PosterError> {
    let fonts = load_fonts(style)?;
    let palette = spec.theme.palette();
    let mut canvas = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, palette.background);

    draw_header(&mut canvas, spec, style, &fonts, &palette);

    let mut columns = build_columns(style, spec.columns);
    place_sections(&mut canvas, spec, style, &fonts, &palette, &mut columns);
    let figures_placed = place_figures(&mut canvas, spec, style, &fonts, &palette, &mut columns);

    info!(
        sections = spec.summaries.len(),
        figures = figures_placed,
        theme = %spec.theme,
        "poster composed"
    );
    Ok(Composition {
        canvas,
        figures_placed,
    })
}

// ── Header band ─────────────────────────────────────────────────────────

fn draw_header(
    canvas: &mut RgbImage,
    spec: &PosterSpec,
    style: &PosterStyle,
    fonts: &Fonts,
    palette: &Palette,
) {
    draw_filled_rect_mut(
        canvas,
        Rect::at(0, 0).of_size(CANVAS_WIDTH, style.header_height),
        palette.header,
    );

    // QR code first; the title wraps against whatever width remains.
    let mut title_right = CANVAS_WIDTH - style.margin;
    if let Some(link) = &spec.metadata.link {
        if let Some(qr) = qr_image(link, style.qr_size) {
            let x = CANVAS_WIDTH - style.qr_size - style.qr_margin;
            imageops::overlay(canvas, &qr, i64::from(x), i64::from(style.qr_margin));
            title_right = x.saturating_sub(style.qr_margin);
        }
    }
    let title_width = title_right.saturating_sub(style.margin);

    let title_scale = PxScale::from(style.title_px);
    let title_pitch = line_pitch(&fonts.bold, style.title_px, style.line_spacing);
    let author_pitch = line_pitch(&fonts.regular, style.author_px, style.line_spacing);
    let reserved = if spec.metadata.author_line().is_some() {
        author_pitch + style.line_spacing
    } else {
        0
    };

    let mut y = style.qr_margin;
    let lines = wrap_words(&spec.metadata.title, title_width, |s| {
        let (w, _) = text_size(title_scale, &fonts.bold, s);
        w as u32
    });
    for line in &lines {
        if y + title_pitch > style.header_height.saturating_sub(reserved) {
            debug!("title clipped to the header band");
            break;
        }
        draw_text_mut(
            canvas,
            palette.title,
            style.margin as i32,
            y as i32,
            title_scale,
            &fonts.bold,
            line,
        );
        y += title_pitch;
    }

    if let Some(authors) = spec.metadata.author_line() {
        let author_scale = PxScale::from(style.author_px);
        let mut wrapped = wrap_words(&authors, title_width, |s| {
            let (w, _) = text_size(author_scale, &fonts.regular, s);
            w as u32
        });
        let text = match wrapped.len() {
            0 => String::new(),
            1 => wrapped.remove(0),
            _ => format!("{} ...", wrapped.remove(0)),
        };
        if !text.is_empty() && y + author_pitch <= style.header_height {
            draw_text_mut(
                canvas,
                palette.title,
                style.margin as i32,
                y as i32,
                author_scale,
                &fonts.regular,
                &text,
            );
        }
    }
}

/// Standard black-on-white QR with a two-module quiet zone, scaled with
/// nearest-neighbor so modules stay crisp. Black on white scans reliably
/// on every theme.
fn qr_image(data: &str, size: u32) -> Option<RgbImage> {
    let code = QrCode::with_error_correction_level(data, EcLevel::M).ok()?;
    let width = code.width() as u32;
    let quiet = 2;
    let total = width + quiet * 2;

    let mut modules = RgbImage::from_pixel(total, total, Rgb([255, 255, 255]));
    for (i, color) in code.to_colors().into_iter().enumerate() {
        if color == qrcode::Color::Dark {
            let x = quiet + i as u32 % width;
            let y = quiet + i as u32 / width;
            modules.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }
    let side = size.max(total);
    Some(imageops::resize(&modules, side, side, FilterType::Nearest))
}

// ── Body columns ────────────────────────────────────────────────────────

fn place_sections(
    canvas: &mut RgbImage,
    spec: &PosterSpec,
    style: &PosterStyle,
    fonts: &Fonts,
    palette: &Palette,
    columns: &mut [Column],
) {
    let bottom = column_bottom(style);
    let heading_scale = PxScale::from(style.heading_px);
    let body_scale = PxScale::from(style.body_px);
    let body_pitch = line_pitch(&fonts.regular, style.body_px, style.line_spacing);
    let heading_ascent = ascent_px(&fonts.bold, style.heading_px);

    for summary in &spec.summaries {
        let idx = shortest_column(columns);
        let col = &mut columns[idx];
        if col.cursor + style.heading_bar_height > bottom {
            debug!(section = %summary.name, "no room left, section skipped");
            continue;
        }

        draw_filled_rect_mut(
            canvas,
            Rect::at(col.x as i32, col.cursor as i32)
                .of_size(col.width, style.heading_bar_height),
            palette.accent,
        );
        let text_y = col.cursor + style.heading_bar_height.saturating_sub(heading_ascent) / 2;
        draw_text_mut(
            canvas,
            palette.accent_text,
            (col.x + HEADING_TEXT_INSET) as i32,
            text_y as i32,
            heading_scale,
            &fonts.bold,
            &summary.name,
        );
        col.cursor += style.heading_bar_height + style.line_spacing;

        let lines = wrap_words(&summary.text, col.width, |s| {
            let (w, _) = text_size(body_scale, &fonts.regular, s);
            w as u32
        });
        for line in &lines {
            if col.cursor + body_pitch > bottom {
                debug!(section = %summary.name, "body clipped at column floor");
                break;
            }
            draw_text_mut(
                canvas,
                palette.text,
                col.x as i32,
                col.cursor as i32,
                body_scale,
                &fonts.regular,
                line,
            );
            col.cursor += body_pitch;
        }
        col.cursor += style.section_gap;
    }
}

fn place_figures(
    canvas: &mut RgbImage,
    spec: &PosterSpec,
    style: &PosterStyle,
    fonts: &Fonts,
    palette: &Palette,
    columns: &mut [Column],
) -> usize {
    let bottom = column_bottom(style);
    let caption_scale = PxScale::from(style.caption_px);
    let caption_pitch = line_pitch(&fonts.regular, style.caption_px, style.line_spacing);
    let mut placed = 0;

    for figure in &spec.figures {
        let idx = shortest_column(columns);
        let col = &mut columns[idx];

        // Thumbnail semantics: shrink to the column-width square box,
        // never enlarge.
        let box_side = f64::from(col.width);
        let scale = 1.0_f64
            .min(box_side / f64::from(figure.width))
            .min(box_side / f64::from(figure.height));
        let dw = ((f64::from(figure.width) * scale).round() as u32).max(1);
        let dh = ((f64::from(figure.height) * scale).round() as u32).max(1);

        let needed = dh + style.line_spacing + caption_pitch + style.figure_padding;
        if col.cursor + needed > bottom {
            debug!(page = figure.page, name = %figure.name, "figure skipped, no room");
            continue;
        }

        let bitmap = if (dw, dh) == (figure.width, figure.height) {
            figure.bitmap.clone()
        } else {
            imageops::resize(&figure.bitmap, dw, dh, FilterType::Lanczos3)
        };
        let x = col.x + (col.width - dw) / 2;
        imageops::overlay(canvas, &bitmap, i64::from(x), i64::from(col.cursor));
        placed += 1;

        let caption = format!("Fig. {placed}");
        let (cw, _) = text_size(caption_scale, &fonts.regular, &caption);
        let cx = col.x + col.width.saturating_sub(cw as u32) / 2;
        let cy = col.cursor + dh + style.line_spacing;
        draw_text_mut(
            canvas,
            palette.text,
            cx as i32,
            cy as i32,
            caption_scale,
            &fonts.regular,
            &caption,
        );
        col.cursor += needed;
    }
    placed
}

// ── Fonts ───────────────────────────────────────────────────────────────

pub(crate) struct Fonts {
    pub regular: FontVec,
    pub bold: FontVec,
}

const REGULAR_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/gnu-free/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:/Windows/Fonts/arial.ttf",
];

const BOLD_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    "/usr/share/fonts/gnu-free/FreeSansBold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:/Windows/Fonts/arialbd.ttf",
];

/// First readable regular sans-serif face in well-known locations.
pub fn find_system_font() -> Option<PathBuf> {
    REGULAR_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Bold companion of [`find_system_font`].
pub fn find_system_bold_font() -> Option<PathBuf> {
    BOLD_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

pub(crate) fn load_fonts(style: &PosterStyle) -> Result<Fonts, PosterError> {
    let regular_path = match &style.font_path {
        Some(path) => path.clone(),
        None => find_system_font().ok_or_else(|| PosterError::FontAssetMissing {
            path: PathBuf::from("(system font search)"),
            detail: "no usable sans-serif TTF found in standard locations".to_string(),
        })?,
    };
    let regular = load_face(&regular_path)?;
    let bold = match &style.bold_font_path {
        Some(path) => load_face(path)?,
        // Fall back to a doubled regular face rather than failing; a poster
        // without bold weight beats no poster.
        None => match find_system_bold_font() {
            Some(path) => load_face(&path)?,
            None => load_face(&regular_path)?,
        },
    };
    Ok(Fonts { regular, bold })
}

fn load_face(path: &Path) -> Result<FontVec, PosterError> {
    let bytes = fs::read(path).map_err(|e| PosterError::FontAssetMissing {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    FontVec::try_from_vec(bytes).map_err(|e| PosterError::FontAssetMissing {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

fn ascent_px(font: &FontVec, px: f32) -> u32 {
    font.as_scaled(PxScale::from(px)).ascent().ceil() as u32
}

/// Vertical advance between wrapped lines: glyph ascent plus the fixed
/// extra spacing.
fn line_pitch(font: &FontVec, px: f32, spacing: u32) -> u32 {
    ascent_px(font, px) + spacing
}
