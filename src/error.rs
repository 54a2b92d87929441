//! Error types for the pdf2poster library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PosterError`] — **Fatal**: the run cannot produce a poster at all
//!   (missing input, corrupt PDF, missing font). Returned as
//!   `Err(PosterError)` from the top-level `generate*` functions.
//!
//! * [`FigureError`] — **Non-fatal**: a single embedded image failed to
//!   decode but every other figure is fine. Collected in
//!   [`crate::output::PosterStats`] so callers can inspect what was skipped
//!   rather than losing the whole poster to one bad image.
//!
//! Everything recoverable degrades to placeholder content near its origin:
//! a section that is not found or fails to summarize becomes sentinel text
//! (see [`crate::pipeline::summarize`]), never an `Err`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2poster library.
///
/// Per-image failures use [`FigureError`] and are collected in
/// [`crate::output::PosterStats`] rather than propagated here.
#[derive(Debug, Error)]
pub enum PosterError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{}'\nCheck the path exists and is readable.", .path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{}'\nTry: chmod +r {path:?}", .path.display())]
    PermissionDenied { path: PathBuf },

    /// The input string is not a file path, URL, or arXiv identifier.
    #[error("Invalid input '{input}': not a file path, an HTTP/HTTPS URL, or an arXiv id (e.g. 1710.06945)")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{}'\nFirst bytes: {magic:?}", .path.display())]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Document errors ───────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{}' could not be parsed: {detail}\nTry repairing with: qpdf input.pdf repaired.pdf", .path.display())]
    CorruptPdf { path: PathBuf, detail: String },

    /// The document parsed but contains no pages.
    #[error("PDF '{}' contains no pages", .path.display())]
    EmptyDocument { path: PathBuf },

    // ── Compositor errors ─────────────────────────────────────────────────
    /// A declared font file is missing or not a parseable TrueType/OpenType face.
    ///
    /// Fatal by design: the poster cannot be laid out without glyph metrics
    /// at the declared sizes.
    #[error("Font asset missing or unreadable: '{}': {detail}\nPoint --font/--font-bold at .ttf files (e.g. DejaVuSans.ttf).", .path.display())]
    FontAssetMissing { path: PathBuf, detail: String },

    /// The final bitmap failed to encode to PNG.
    #[error("Failed to encode poster to PNG: {detail}")]
    EncodeFailed { detail: String },

    /// The poster encoded but could not be written to disk.
    #[error("Failed to write output file '{}': {source}", .path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Unrecognized color-theme name.
    #[error("Unknown color theme '{name}' (expected one of: light, dark, sepia)")]
    UnknownTheme { name: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single embedded image.
///
/// The extraction pass skips the affected image and continues; the errors
/// are kept so `--inspect` and run statistics can report what was dropped.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FigureError {
    /// The image stream exists but its bytes could not be decoded.
    #[error("Page {page} image '{name}': decode failed: {detail}")]
    Decode {
        page: u32,
        name: String,
        detail: String,
    },

    /// The declared color space / bit depth combination is not supported.
    #[error("Page {page} image '{name}': unsupported color space {colorspace} at {bits} bpc")]
    UnsupportedColorSpace {
        page: u32,
        name: String,
        colorspace: String,
        bits: u8,
    },

    /// The XObject dictionary lacks usable dimensions.
    #[error("Page {page} image '{name}': missing or zero /Width or /Height")]
    BadDimensions { page: u32, name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_pdf_display_shows_magic() {
        let e = PosterError::NotAPdf {
            path: PathBuf::from("notes.txt"),
            magic: [0x50, 0x4b, 0x03, 0x04],
        };
        let msg = e.to_string();
        assert!(msg.contains("notes.txt"), "got: {msg}");
        assert!(msg.contains("80"), "magic bytes should render: {msg}");
    }

    #[test]
    fn unknown_theme_lists_choices() {
        let e = PosterError::UnknownTheme {
            name: "neon".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("neon"));
        assert!(msg.contains("light"));
        assert!(msg.contains("sepia"));
    }

    #[test]
    fn font_missing_mentions_flag() {
        let e = PosterError::FontAssetMissing {
            path: PathBuf::from("/nope/font.ttf"),
            detail: "No such file".into(),
        };
        assert!(e.to_string().contains("--font"));
    }

    #[test]
    fn download_timeout_display() {
        let e = PosterError::DownloadTimeout {
            url: "https://arxiv.org/pdf/1710.06945".into(),
            secs: 30,
        };
        let msg = e.to_string();
        assert!(msg.contains("30s"));
        assert!(msg.contains("1710.06945"));
    }

    #[test]
    fn figure_decode_display() {
        let e = FigureError::Decode {
            page: 4,
            name: "Im2".into(),
            detail: "bad JPEG marker".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Page 4"));
        assert!(msg.contains("Im2"));
        assert!(msg.contains("bad JPEG marker"));
    }

    #[test]
    fn figure_colorspace_display() {
        let e = FigureError::UnsupportedColorSpace {
            page: 1,
            name: "Im0".into(),
            colorspace: "Separation".into(),
            bits: 4,
        };
        let msg = e.to_string();
        assert!(msg.contains("Separation"));
        assert!(msg.contains("4 bpc"));
    }
}
