//! Figure extraction: pull raster images out of each page, oriented the way
//! the page draws them.
//!
//! ## Why walk the content stream?
//!
//! The XObject dictionary alone says which images a page *could* draw, not
//! how. Scan/photo PDFs in particular draw a mirrored bitmap with a negative
//! horizontal scale in the current transformation matrix, and pasting the
//! raw bitmap onto a poster reproduces the mirroring. Walking the content
//! stream with a `q`/`Q`/`cm` matrix stack recovers the matrix in effect at
//! each `Do`, and a negative determinant tells us to flip the decoded bitmap
//! before anyone downstream sees it.
//!
//! Failure policy mirrors text extraction: one bad image never aborts the
//! run. Decode problems are recorded as [`FigureError`] values and the walk
//! moves on. Images that pass decoding but are smaller than the configured
//! minimum dimension are dropped silently; they are nearly always logos,
//! ruler ticks, or inline math rendered as bitmaps.
//!
//! Images listed in a page's resources but never drawn by its content
//! stream are still emitted, after the drawn ones, with an identity matrix
//! assumed. Some generators reference every figure from a shared resource
//! dictionary and draw them from annotation appearance streams we do not
//! walk.

use crate::error::FigureError;
use image::{imageops, RgbImage};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

// ── Types ───────────────────────────────────────────────────────────────

/// One decoded figure, normalized to 8-bit RGB.
#[derive(Clone)]
pub struct ExtractedFigure {
    /// Decoded pixels, already orientation-corrected where needed.
    pub bitmap: RgbImage,
    /// 1-based page number the image belongs to.
    pub page: u32,
    /// Resource name of the XObject, e.g. `Im1`.
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// True when the draw matrix had a negative determinant and the bitmap
    /// was flipped horizontally to compensate.
    pub orientation_corrected: bool,
}

impl ExtractedFigure {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

// Pixel data is megabytes; keep log output at the metadata level.
impl fmt::Debug for ExtractedFigure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractedFigure")
            .field("page", &self.page)
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("orientation_corrected", &self.orientation_corrected)
            .finish_non_exhaustive()
    }
}

/// Everything the figure pass produced for one document.
#[derive(Debug, Default)]
pub struct FigureHarvest {
    /// Figures that decoded cleanly and met the size threshold, page order.
    pub figures: Vec<ExtractedFigure>,
    /// Image XObjects encountered before any filtering.
    pub candidates: usize,
    /// Per-image failures; informational, never fatal.
    pub errors: Vec<FigureError>,
}

// ── Page walk ───────────────────────────────────────────────────────────

const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Extract every usable figure from the document.
///
/// `min_dim` filters on the decoded bitmap: images whose smaller dimension
/// is below it are skipped without an error entry.
pub fn extract_figures(doc: &Document, min_dim: u32) -> FigureHarvest {
    let mut harvest = FigureHarvest::default();

    for (page_no, page_id) in doc.get_pages() {
        let images = page_image_xobjects(doc, page_id);
        if images.is_empty() {
            continue;
        }
        harvest.candidates += images.len();

        let draws = match page_draw_events(doc, page_id) {
            Ok(draws) => draws,
            Err(err) => {
                warn!(
                    page = page_no,
                    error = %err,
                    "content stream unreadable, treating page images as undrawn"
                );
                Vec::new()
            }
        };

        let mut emitted: HashSet<&str> = HashSet::new();
        for (name, ctm) in &draws {
            let Some((_, stream)) = images.iter().find(|(n, _)| n == name) else {
                continue; // Form XObject or dangling name
            };
            if !emitted.insert(name.as_str()) {
                continue; // first draw fixes the orientation
            }
            harvest.admit(doc, stream, page_no, name, *ctm, min_dim);
        }
        for (name, stream) in &images {
            if emitted.contains(name.as_str()) {
                continue;
            }
            harvest.admit(doc, stream, page_no, name, IDENTITY, min_dim);
        }
    }

    debug!(
        figures = harvest.figures.len(),
        candidates = harvest.candidates,
        errors = harvest.errors.len(),
        "figure extraction complete"
    );
    harvest
}

impl FigureHarvest {
    fn admit(
        &mut self,
        doc: &Document,
        stream: &Stream,
        page: u32,
        name: &str,
        ctm: [f64; 6],
        min_dim: u32,
    ) {
        let mut bitmap = match decode_image(doc, stream, page, name) {
            Ok(bitmap) => bitmap,
            Err(err) => {
                warn!(page, name, error = %err, "skipping undecodable image");
                self.errors.push(err);
                return;
            }
        };
        let (width, height) = bitmap.dimensions();
        if width.min(height) < min_dim {
            debug!(page, name, width, height, "image below minimum dimension");
            return;
        }
        let orientation_corrected = determinant(&ctm) < 0.0;
        if orientation_corrected {
            imageops::flip_horizontal_in_place(&mut bitmap);
        }
        self.figures.push(ExtractedFigure {
            bitmap,
            page,
            name: name.to_string(),
            width,
            height,
            orientation_corrected,
        });
    }
}

/// Image XObjects reachable from the page's resources, in dictionary order.
/// Resources may be inherited from an ancestor Pages node.
fn page_image_xobjects(doc: &Document, page_id: ObjectId) -> Vec<(String, &Stream)> {
    let Some(resources) = page_resources(doc, page_id) else {
        return Vec::new();
    };
    let Some(xobjects) = dict_entry(doc, resources, b"XObject").and_then(|o| o.as_dict().ok())
    else {
        return Vec::new();
    };

    let mut images = Vec::new();
    for (name, value) in xobjects.iter() {
        let Ok((_, resolved)) = doc.dereference(value) else {
            continue;
        };
        let Object::Stream(stream) = resolved else {
            continue;
        };
        let is_image = matches!(
            stream.dict.get(b"Subtype"),
            Ok(Object::Name(subtype)) if subtype.as_slice() == b"Image"
        );
        if is_image {
            images.push((String::from_utf8_lossy(name).into_owned(), stream));
        }
    }
    images
}

fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_object(page_id).ok()?.as_dict().ok()?;
    loop {
        if let Some(resources) = dict_entry(doc, node, b"Resources") {
            return resources.as_dict().ok();
        }
        let parent = dict_entry(doc, node, b"Parent")?;
        node = parent.as_dict().ok()?;
    }
}

fn dict_entry<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let value = dict.get(key).ok()?;
    let (_, resolved) = doc.dereference(value).ok()?;
    Some(resolved)
}

/// Resource names drawn via `Do`, each with the transformation matrix in
/// effect at that point.
fn page_draw_events(doc: &Document, page_id: ObjectId) -> lopdf::Result<Vec<(String, [f64; 6])>> {
    let data = doc.get_page_content(page_id)?;
    let content = Content::decode(&data)?;

    let mut ctm = IDENTITY;
    let mut stack: Vec<[f64; 6]> = Vec::new();
    let mut draws = Vec::new();

    for op in &content.operations {
        match op.operator.as_str() {
            "q" => stack.push(ctm),
            "Q" => ctm = stack.pop().unwrap_or(IDENTITY),
            "cm" => {
                if let Some(m) = matrix_operands(&op.operands) {
                    ctm = concat(m, ctm);
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    draws.push((String::from_utf8_lossy(name).into_owned(), ctm));
                }
            }
            _ => {}
        }
    }
    Ok(draws)
}

fn matrix_operands(operands: &[Object]) -> Option<[f64; 6]> {
    if operands.len() != 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(m)
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Row-major concatenation of two PDF matrices: `m` applied before `ctm`.
fn concat(m: [f64; 6], ctm: [f64; 6]) -> [f64; 6] {
    [
        m[0] * ctm[0] + m[1] * ctm[2],
        m[0] * ctm[1] + m[1] * ctm[3],
        m[2] * ctm[0] + m[3] * ctm[2],
        m[2] * ctm[1] + m[3] * ctm[3],
        m[4] * ctm[0] + m[5] * ctm[2] + ctm[4],
        m[4] * ctm[1] + m[5] * ctm[3] + ctm[5],
    ]
}

fn determinant(m: &[f64; 6]) -> f64 {
    m[0] * m[3] - m[1] * m[2]
}

// ── Decoding ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelLayout {
    Gray,
    Rgb,
    Cmyk,
}

impl PixelLayout {
    fn samples_per_pixel(self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Rgb => 3,
            PixelLayout::Cmyk => 4,
        }
    }
}

/// Decode one image XObject to RGB8.
///
/// DCTDecode streams are handed to the JPEG decoder as-is; everything else
/// goes through lopdf's stream decompression and is rebuilt from raw
/// samples according to the declared color space.
fn decode_image(
    doc: &Document,
    stream: &Stream,
    page: u32,
    name: &str,
) -> Result<RgbImage, FigureError> {
    let dict = &stream.dict;
    let width = int_entry(doc, dict, b"Width").unwrap_or(0);
    let height = int_entry(doc, dict, b"Height").unwrap_or(0);
    if width <= 0 || height <= 0 {
        return Err(FigureError::BadDimensions {
            page,
            name: name.to_string(),
        });
    }
    let (width, height) = (width as u32, height as u32);

    let filters = filter_names(doc, dict);
    if filters.iter().any(|f| f == "DCTDecode") {
        if filters.len() != 1 {
            return Err(FigureError::Decode {
                page,
                name: name.to_string(),
                detail: format!("unsupported filter chain {filters:?}"),
            });
        }
        return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
            .map(|img| img.to_rgb8())
            .map_err(|e| FigureError::Decode {
                page,
                name: name.to_string(),
                detail: e.to_string(),
            });
    }
    if filters.iter().any(|f| f == "JPXDecode") {
        return Err(FigureError::Decode {
            page,
            name: name.to_string(),
            detail: "JPEG 2000 streams are not supported".to_string(),
        });
    }

    let bits = int_entry(doc, dict, b"BitsPerComponent").unwrap_or(8);
    let layout = pixel_layout(doc, dict).map_err(|colorspace| {
        FigureError::UnsupportedColorSpace {
            page,
            name: name.to_string(),
            colorspace,
            bits: bits.clamp(0, 255) as u8,
        }
    })?;
    if bits != 8 {
        return Err(FigureError::UnsupportedColorSpace {
            page,
            name: name.to_string(),
            colorspace: format!("{layout:?}"),
            bits: bits.clamp(0, 255) as u8,
        });
    }

    let data = stream.decompressed_content().map_err(|e| FigureError::Decode {
        page,
        name: name.to_string(),
        detail: format!("stream decompression failed: {e}"),
    })?;
    from_raw_samples(&data, width, height, layout).ok_or_else(|| FigureError::Decode {
        page,
        name: name.to_string(),
        detail: format!(
            "sample data too short: got {}, need {}",
            data.len(),
            width as usize * height as usize * layout.samples_per_pixel()
        ),
    })
}

fn from_raw_samples(data: &[u8], width: u32, height: u32, layout: PixelLayout) -> Option<RgbImage> {
    let pixels = width as usize * height as usize;
    let needed = pixels * layout.samples_per_pixel();
    if data.len() < needed {
        return None;
    }
    let data = &data[..needed];

    match layout {
        PixelLayout::Rgb => RgbImage::from_raw(width, height, data.to_vec()),
        PixelLayout::Gray => {
            let mut rgb = Vec::with_capacity(pixels * 3);
            for &g in data {
                rgb.extend_from_slice(&[g, g, g]);
            }
            RgbImage::from_raw(width, height, rgb)
        }
        PixelLayout::Cmyk => {
            let mut rgb = Vec::with_capacity(pixels * 3);
            for sample in data.chunks_exact(4) {
                let (c, m, y, k) = (
                    u32::from(sample[0]),
                    u32::from(sample[1]),
                    u32::from(sample[2]),
                    u32::from(sample[3]),
                );
                rgb.push(((255 - c) * (255 - k) / 255) as u8);
                rgb.push(((255 - m) * (255 - k) / 255) as u8);
                rgb.push(((255 - y) * (255 - k) / 255) as u8);
            }
            RgbImage::from_raw(width, height, rgb)
        }
    }
}

/// Map the /ColorSpace entry to a sample layout. `Err` carries the space's
/// printable name for the error record.
fn pixel_layout(doc: &Document, dict: &Dictionary) -> Result<PixelLayout, String> {
    if matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true))) {
        return Err("ImageMask".to_string());
    }
    let Some(colorspace) = dict_entry(doc, dict, b"ColorSpace") else {
        return Err("(missing)".to_string());
    };
    match colorspace {
        Object::Name(name) => match name.as_slice() {
            b"DeviceRGB" | b"CalRGB" => Ok(PixelLayout::Rgb),
            b"DeviceGray" | b"CalGray" => Ok(PixelLayout::Gray),
            b"DeviceCMYK" => Ok(PixelLayout::Cmyk),
            other => Err(String::from_utf8_lossy(other).into_owned()),
        },
        Object::Array(items) => icc_layout(doc, items),
        _ => Err("(malformed)".to_string()),
    }
}

fn icc_layout(doc: &Document, items: &[Object]) -> Result<PixelLayout, String> {
    let family = match items.first() {
        Some(Object::Name(name)) => name.clone(),
        _ => return Err("(malformed)".to_string()),
    };
    if family.as_slice() != b"ICCBased" {
        return Err(String::from_utf8_lossy(&family).into_owned());
    }
    let channels = items
        .get(1)
        .and_then(|o| doc.dereference(o).ok())
        .and_then(|(_, o)| match o {
            Object::Stream(s) => int_entry(doc, &s.dict, b"N"),
            _ => None,
        });
    match channels {
        Some(1) => Ok(PixelLayout::Gray),
        Some(3) => Ok(PixelLayout::Rgb),
        Some(4) => Ok(PixelLayout::Cmyk),
        Some(n) => Err(format!("ICCBased/N={n}")),
        None => Err("ICCBased/N=?".to_string()),
    }
}

fn int_entry(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match dict_entry(doc, dict, key) {
        Some(Object::Integer(i)) => Some(*i),
        Some(Object::Real(r)) => Some(*r as i64),
        _ => None,
    }
}

fn filter_names(doc: &Document, dict: &Dictionary) -> Vec<String> {
    match dict_entry(doc, dict, b"Filter") {
        Some(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|o| match o {
                Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

// ── Selection ───────────────────────────────────────────────────────────

/// Keep at most `max_figures`, preferring larger pixel area; the survivors
/// stay in document order. Ties go to the earlier figure.
pub fn select_figures(figures: Vec<ExtractedFigure>, max_figures: usize) -> Vec<ExtractedFigure> {
    if figures.len() <= max_figures {
        return figures;
    }
    let mut order: Vec<usize> = (0..figures.len()).collect();
    order.sort_by(|&a, &b| {
        figures[b]
            .area()
            .cmp(&figures[a].area())
            .then(a.cmp(&b))
    });
    let keep: HashSet<usize> = order.into_iter().take(max_figures).collect();
    figures
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, fig)| fig)
        .collect()
}
