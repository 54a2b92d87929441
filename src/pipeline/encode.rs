//! Final encoding: composed canvas → PNG bytes.
//!
//! PNG is the only output format. It is lossless, so byte-for-byte
//! determinism survives encoding: the same canvas always yields the same
//! file, which keeps posters diffable and content-addressable. A lossy
//! format would also smear the one-pixel QR modules and small caption
//! text.

use crate::error::PosterError;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Encode the canvas to an in-memory PNG.
pub fn encode_png(canvas: &RgbImage) -> Result<Vec<u8>, PosterError> {
    let mut buf = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| PosterError::EncodeFailed {
            detail: e.to_string(),
        })?;
    debug!(bytes = buf.len(), "poster encoded");
    Ok(buf)
}
