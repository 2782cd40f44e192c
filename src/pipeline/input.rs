//! Input resolution: read a user-supplied path or URL fully into memory.
//!
//! The whole PDF is loaded into a byte buffer before any page is touched —
//! pdfium can parse directly from the buffer, a URL download needs no
//! intermediate file, and the document bytes stay immutable for the run.
//! The `%PDF` magic is validated up front so callers get a meaningful error
//! rather than a pdfium parse failure on, say, an HTML error page a server
//! returned instead of the document.

use crate::error::Pdf2PngError;
use std::path::PathBuf;
use tracing::{debug, info};

/// PDF files start with these bytes ("%PDF").
const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an in-memory PDF byte buffer.
///
/// If the input is a URL, download it (bounded by `timeout_secs`). If it is
/// a local file, validate it exists and is readable. Either way the `%PDF`
/// magic bytes are checked before returning.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<Vec<u8>, Pdf2PngError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

/// Read a local file, mapping I/O errors to the input-error taxonomy.
async fn read_local(path_str: &str) -> Result<Vec<u8>, Pdf2PngError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2PngError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2PngError::FileNotFound { path });
        }
    };

    validate_magic(&bytes, path_str)?;
    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Download a URL into memory and validate it is a PDF.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, Pdf2PngError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2PngError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2PngError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2PngError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Pdf2PngError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                Pdf2PngError::DownloadTimeout {
                    url: url.to_string(),
                    secs: timeout_secs,
                }
            } else {
                Pdf2PngError::DownloadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?
        .to_vec();

    validate_magic(&bytes, url)?;
    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes)
}

/// Verify the `%PDF` magic bytes.
fn validate_magic(bytes: &[u8], source_name: &str) -> Result<(), Pdf2PngError> {
    let mut magic = [0u8; 4];
    let head = bytes.get(..4).unwrap_or_default();
    magic[..head.len()].copy_from_slice(head);

    if &magic != PDF_MAGIC {
        return Err(Pdf2PngError::NotAPdf {
            source_name: source_name.to_string(),
            magic,
        });
    }
    Ok(())
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
    fn magic_accepts_pdf_header() {
        assert!(validate_magic(b"%PDF-1.7\n...", "x.pdf").is_ok());
    }

    #[test]
    fn magic_rejects_html() {
        let err = validate_magic(b"<html><body>404</body></html>", "x.pdf").unwrap_err();
        assert!(matches!(err, Pdf2PngError::NotAPdf { .. }));
    }

    #[test]
    fn magic_rejects_short_input() {
        assert!(matches!(
            validate_magic(b"%P", "x.pdf"),
            Err(Pdf2PngError::NotAPdf { .. })
        ));
        assert!(matches!(
            validate_magic(b"", "x.pdf"),
            Err(Pdf2PngError::NotAPdf { .. })
        ));
    }

    #[tokio::test]
    async fn missing_file_reports_file_not_found() {
        let err = resolve_input("/definitely/not/a/real/file.pdf", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2PngError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn local_non_pdf_reports_not_a_pdf() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"just some text").unwrap();
        let err = resolve_input(f.path().to_str().unwrap(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2PngError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn local_pdf_is_read_fully() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.4\nrest of the document").unwrap();
        let bytes = resolve_input(f.path().to_str().unwrap(), 5).await.unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert_eq!(bytes.len(), "%PDF-1.4\nrest of the document".len());
    }
}
