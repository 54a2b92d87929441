//! Full-text extraction and metadata recovery from the loaded document.
//!
//! The extractor is deliberately structure-blind: it returns one linear
//! string, every page's text in page order, and leaves section detection to
//! the segmenter. Per-page extraction failures are skipped (best-effort
//! concatenation); only a document that cannot be opened at all is fatal.

use crate::error::PosterError;
use lopdf::{Document, Object};
use std::path::Path;
use tracing::{debug, warn};

/// Open and parse a PDF from disk.
///
/// Fails with [`PosterError::CorruptPdf`] when the file cannot be parsed and
/// [`PosterError::EmptyDocument`] when it parses but has no pages. Encrypted
/// documents are rejected here rather than producing garbled downstream text.
pub fn open_document(path: &Path) -> Result<Document, PosterError> {
    let doc = Document::load(path).map_err(|e| PosterError::CorruptPdf {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    if doc.trailer.get(b"Encrypt").is_ok() {
        return Err(PosterError::CorruptPdf {
            path: path.to_path_buf(),
            detail: "document is encrypted".to_string(),
        });
    }
    if doc.get_pages().is_empty() {
        return Err(PosterError::EmptyDocument {
            path: path.to_path_buf(),
        });
    }
    Ok(doc)
}

/// Concatenate every page's linear text in page order.
///
/// Pages that fail to decode are skipped with a warning; the result is
/// whatever the remaining pages yielded (possibly empty, never an error).
pub fn extract_full_text(doc: &Document) -> String {
    let mut full_text = String::new();
    for (&page_num, _) in doc.get_pages().iter() {
        match doc.extract_text(&[page_num]) {
            Ok(text) => {
                if !full_text.is_empty() {
                    full_text.push('\n');
                }
                full_text.push_str(&text);
            }
            Err(e) => {
                warn!("Text extraction failed on page {}: {}", page_num, e);
            }
        }
    }
    debug!("Extracted {} chars of full text", full_text.len());
    full_text
}

/// Recover (title, authors) from the document's Info dictionary.
///
/// Both are best-effort: a missing or empty entry yields `None` / an empty
/// list, and the caller decides the fallback (input file stem, overrides).
pub fn recover_metadata(doc: &Document) -> (Option<String>, Vec<String>) {
    let info = match doc
        .trailer
        .get(b"Info")
        .and_then(|obj| doc.dereference(obj))
        .and_then(|(_, obj)| obj.as_dict())
    {
        Ok(dict) => dict,
        Err(_) => return (None, Vec::new()),
    };

    let title = info
        .get(b"Title")
        .ok()
        .and_then(|obj| pdf_string(doc, obj))
        .filter(|s| !s.is_empty());

    let authors = info
        .get(b"Author")
        .ok()
        .and_then(|obj| pdf_string(doc, obj))
        .map(|raw| split_authors(&raw))
        .unwrap_or_default();

    (title, authors)
}

/// Split a raw author field on the separators PDF producers actually use.
pub(crate) fn split_authors(raw: &str) -> Vec<String> {
    raw.replace(" and ", ",")
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Decode a PDF string object (literal or UTF-16BE with BOM) to Rust text.
fn pdf_string(doc: &Document, obj: &Object) -> Option<String> {
    let (_, resolved) = doc.dereference(obj).ok()?;
    match resolved {
        Object::String(bytes, _) => Some(decode_pdf_text(bytes).trim().to_string()),
        _ => None,
    }
}

/// PDF text strings are either UTF-16BE (with a FE FF BOM) or a Latin-1-like
/// single-byte encoding; this covers both well enough for titles and names.
fn decode_pdf_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};

    /// Build a minimal text PDF: one page per entry, one Helvetica text
    /// block per line. Each line gets its own BT..ET pair so extracted text
    /// keeps its line boundaries.
    pub(crate) fn text_pdf(pages: &[&[&str]]) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for lines in pages {
            let mut ops: Vec<Operation> = Vec::new();
            let mut y = 720;
            for line in *lines {
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new("Tf", vec!["F1".into(), 24.into()]));
                ops.push(Operation::new("Td", vec![72.into(), y.into()]));
                ops.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                ops.push(Operation::new("ET", vec![]));
                y -= 28;
            }
            let content = Content { operations: ops };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().unwrap(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn full_text_concatenates_pages_in_order() {
        let doc = text_pdf(&[
            &["Alpha beta gamma"],
            &["Delta epsilon"],
        ]);
        let text = extract_full_text(&doc);
        let alpha = text.find("Alpha").expect("page 1 text present");
        let delta = text.find("Delta").expect("page 2 text present");
        assert!(alpha < delta, "page order must be preserved: {text:?}");
    }

    #[test]
    fn metadata_recovered_from_info_dict() {
        let mut doc = text_pdf(&[&["Body"]]);
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Attention Is All You Need"),
            "Author" => Object::string_literal("A. Vaswani; N. Shazeer and L. Jones"),
        });
        doc.trailer.set("Info", info_id);

        let (title, authors) = recover_metadata(&doc);
        assert_eq!(title.as_deref(), Some("Attention Is All You Need"));
        assert_eq!(
            authors,
            vec!["A. Vaswani", "N. Shazeer", "L. Jones"]
        );
    }

    #[test]
    fn metadata_absent_yields_empty() {
        let doc = text_pdf(&[&["Body"]]);
        let (title, authors) = recover_metadata(&doc);
        assert_eq!(title, None);
        assert!(authors.is_empty());
    }

    #[test]
    fn utf16_title_decodes() {
        // "Über" as UTF-16BE with BOM
        let bytes = vec![0xFE, 0xFF, 0x00, 0xDC, 0x00, 0x62, 0x00, 0x65, 0x00, 0x72];
        assert_eq!(decode_pdf_text(&bytes), "Über");
    }

    #[test]
    fn split_authors_handles_separators() {
        assert_eq!(
            split_authors("A. One, B. Two and C. Three; D. Four"),
            vec!["A. One", "B. Two", "C. Three", "D. Four"]
        );
        assert_eq!(split_authors("  "), Vec::<String>::new());
        assert_eq!(split_authors("Solo Author"), vec!["Solo Author"]);
    }

    #[test]
    fn open_document_rejects_garbage() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\nthis is not a real pdf body").unwrap();
        let err = open_document(f.path()).unwrap_err();
        assert!(matches!(err, PosterError::CorruptPdf { .. }));
    }

    #[test]
    fn open_document_roundtrip() {
        let mut doc = text_pdf(&[&["Round trip"]]);
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        doc.save_to(&mut tmp).unwrap();
        let reopened = open_document(tmp.path()).unwrap();
        assert_eq!(reopened.get_pages().len(), 1);
    }
}
