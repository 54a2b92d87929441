//! Input resolution: normalise a path, URL, or arXiv identifier to a local PDF.
//!
//! ## Why download to a temp file?
//!
//! The rest of the pipeline opens the document from a file-system path.
//! Downloading to a `TempDir` gives us such a path while ensuring cleanup
//! happens automatically when `ResolvedInput` is dropped, even if the process
//! panics. We validate the PDF magic bytes (`%PDF`) before returning so
//! callers get a meaningful error rather than a parser failure deep in the
//! pipeline.
//!
//! Bare arXiv identifiers ("1710.06945", "2301.12345v2", "cs/0112017") are
//! expanded to the canonical `arxiv.org/pdf/` URL; the matching `abs` page
//! URL is derivable via [`derive_link`] for the poster's QR code.

use crate::error::PosterError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Modern arXiv id: YYMM.NNNNN with an optional version suffix.
static ARXIV_NEW_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}\.\d{4,5}(v\d+)?$").unwrap());

/// Pre-2007 arXiv id: archive[.subclass]/YYMMNNN, e.g. "math.GT/0309136".
static ARXIV_OLD_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z-]+(\.[A-Z]{2})?/\d{7}(v\d+)?$").unwrap());

/// The resolved input — either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL or arXiv id; PDF downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Check if the input string is a bare arXiv identifier.
pub fn is_arxiv_id(input: &str) -> bool {
    ARXIV_NEW_ID.is_match(input) || ARXIV_OLD_ID.is_match(input)
}

/// Canonical PDF download URL for an arXiv id.
pub fn arxiv_pdf_url(id: &str) -> String {
    format!("https://arxiv.org/pdf/{id}")
}

/// Canonical abstract-page URL for an arXiv id.
pub fn arxiv_abs_url(id: &str) -> String {
    format!("https://arxiv.org/abs/{id}")
}

/// Derive the poster link payload from the raw input string.
///
/// Only arXiv inputs produce a link: a bare id, or an `arxiv.org/pdf/...` /
/// `arxiv.org/abs/...` URL, normalise to the abs page. Plain paths and
/// non-arXiv URLs yield `None`; callers can still force a link through
/// [`crate::config::PosterConfig::link`].
pub fn derive_link(input: &str) -> Option<String> {
    if is_arxiv_id(input) {
        return Some(arxiv_abs_url(input));
    }
    if is_url(input) {
        let rest = input
            .split_once("arxiv.org/pdf/")
            .or_else(|| input.split_once("arxiv.org/abs/"))
            .map(|(_, id)| id)?;
        let id = rest.trim_end_matches(".pdf").trim_end_matches('/');
        if !id.is_empty() {
            return Some(arxiv_abs_url(id));
        }
    }
    None
}

/// Resolve the input string to a local PDF file path.
///
/// URLs are downloaded to a temporary directory; bare arXiv ids are expanded
/// to the canonical PDF URL first; anything else is treated as a local path
/// and validated for existence and PDF magic bytes.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, PosterError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else if is_arxiv_id(input) {
        let url = arxiv_pdf_url(input);
        info!("arXiv id {} -> {}", input, url);
        download_url(&url, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, PosterError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(PosterError::FileNotFound { path });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            // Verify PDF magic bytes
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(PosterError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PosterError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(PosterError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, PosterError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .user_agent(concat!("pdf2poster/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PosterError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            PosterError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            PosterError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(PosterError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = extract_filename(url);

    let temp_dir = TempDir::new().map_err(|e| PosterError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| PosterError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    // Verify PDF magic bytes before touching the file system
    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(PosterError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| PosterError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Extract a reasonable filename from the URL, always ending in `.pdf`.
fn extract_filename(url: &str) -> String {
    let mut name = "downloaded".to_string();
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    name = last.to_string();
                }
            }
        }
    }
    if !name.ends_with(".pdf") {
        name.push_str(".pdf");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_is_arxiv_id() {
        assert!(is_arxiv_id("1710.06945"));
        assert!(is_arxiv_id("2301.12345"));
        assert!(is_arxiv_id("2301.12345v2"));
        assert!(is_arxiv_id("math.GT/0309136"));
        assert!(is_arxiv_id("cs/0112017"));
        assert!(!is_arxiv_id("1710"));
        assert!(!is_arxiv_id("1710.069"));
        assert!(!is_arxiv_id("paper.pdf"));
        assert!(!is_arxiv_id("https://arxiv.org/abs/1710.06945"));
    }

    #[test]
    fn test_arxiv_urls() {
        assert_eq!(
            arxiv_pdf_url("1710.06945"),
            "https://arxiv.org/pdf/1710.06945"
        );
        assert_eq!(
            arxiv_abs_url("2301.12345v2"),
            "https://arxiv.org/abs/2301.12345v2"
        );
    }

    #[test]
    fn test_derive_link() {
        assert_eq!(
            derive_link("1710.06945").as_deref(),
            Some("https://arxiv.org/abs/1710.06945")
        );
        assert_eq!(
            derive_link("https://arxiv.org/pdf/2301.12345.pdf").as_deref(),
            Some("https://arxiv.org/abs/2301.12345")
        );
        assert_eq!(
            derive_link("https://arxiv.org/abs/2301.12345").as_deref(),
            Some("https://arxiv.org/abs/2301.12345")
        );
        assert_eq!(derive_link("https://example.com/paper.pdf"), None);
        assert_eq!(derive_link("local/paper.pdf"), None);
    }

    #[test]
    fn test_extract_filename() {
        assert_eq!(
            extract_filename("https://arxiv.org/pdf/1710.06945"),
            "1710.06945.pdf"
        );
        assert_eq!(
            extract_filename("https://example.com/papers/cool.pdf"),
            "cool.pdf"
        );
        assert_eq!(extract_filename("https://example.com/"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn resolve_local_rejects_non_pdf() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"PK\x03\x04 definitely a zip").unwrap();
        let err = resolve_input(f.path().to_str().unwrap(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, PosterError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn resolve_local_accepts_pdf_magic() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n%fake but valid magic").unwrap();
        let resolved = resolve_input(f.path().to_str().unwrap(), 5).await.unwrap();
        assert_eq!(resolved.path(), f.path());
    }

    #[tokio::test]
    async fn resolve_missing_file_errors() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, PosterError::FileNotFound { .. }));
    }
}
