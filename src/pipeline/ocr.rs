//! OCR text extraction via the Tesseract command-line binary.
//!
//! Tesseract is invoked as an external process rather than linked: the
//! binary ships with every platform's package manager, language data is
//! managed by the system install, and a crashed recognition cannot take the
//! pipeline down with it.
//!
//! [`OcrEngine::initialize`] is the expensive step — it resolves the binary,
//! reads its version, and verifies every configured language is installed.
//! The driver creates the engine once, before the first page is fetched, and
//! only when OCR is enabled; [`OcrEngine::recognize`] is then a cheap
//! stateless call per page. The page loop is strictly sequential, so the
//! shared engine never sees concurrent calls.

use crate::config::ConversionConfig;
use crate::error::{PageError, Pdf2PngError};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;
use tracing::{debug, info};

/// A ready-to-use Tesseract engine.
///
/// Constructing the engine IS the initialisation: a value of this type has
/// a verified binary and a verified language set behind it.
#[derive(Debug)]
pub struct OcrEngine {
    binary: PathBuf,
    languages: String,
    version: String,
}

impl OcrEngine {
    /// Resolve and verify the Tesseract install for the configured language
    /// set.
    ///
    /// # Errors
    /// [`Pdf2PngError::OcrInitFailed`] when the binary cannot be executed or
    /// any requested language is not installed.
    pub fn initialize(config: &ConversionConfig) -> Result<Self, Pdf2PngError> {
        let binary = config
            .ocr_binary
            .clone()
            .unwrap_or_else(|| PathBuf::from("tesseract"));

        let version = tesseract_version(&binary)?;
        info!("OCR engine ready: tesseract {}", version);

        let installed = installed_languages(&binary)?;
        for code in config.ocr_languages.split('+') {
            if !installed.iter().any(|l| l == code) {
                return Err(Pdf2PngError::OcrInitFailed {
                    detail: format!(
                        "language '{}' is not installed (available: {})",
                        code,
                        installed.join(", ")
                    ),
                });
            }
        }

        Ok(Self {
            binary,
            languages: config.ocr_languages.clone(),
            version,
        })
    }

    /// The version string of the resolved binary.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Recognise text in a rendered page.
    ///
    /// The PNG bytes are written to a temporary file (deleted when this
    /// function returns) and fed to `tesseract <file> stdout -l <langs>`.
    pub fn recognize(&self, png: &[u8], page_num: usize) -> Result<String, PageError> {
        let start = Instant::now();

        let mut input = tempfile::Builder::new()
            .prefix("pdf2png-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| PageError::OcrFailure {
                page: page_num,
                detail: format!("failed to create temp file: {e}"),
            })?;
        input.write_all(png).map_err(|e| PageError::OcrFailure {
            page: page_num,
            detail: format!("failed to write temp file: {e}"),
        })?;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .output()
            .map_err(|e| PageError::OcrFailure {
                page: page_num,
                detail: format!("failed to run tesseract: {e}"),
            })?;

        if !output.status.success() {
            return Err(PageError::OcrFailure {
                page: page_num,
                detail: format!(
                    "tesseract exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            "Page {}: OCR produced {} chars in {}ms",
            page_num,
            text.len(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}

/// Run `tesseract --version` and extract the version number.
///
/// Tesseract prints its version banner to stderr on some builds and stdout
/// on others, so both streams are scanned.
fn tesseract_version(binary: &PathBuf) -> Result<String, Pdf2PngError> {
    let output = Command::new(binary)
        .arg("--version")
        .output()
        .map_err(|e| Pdf2PngError::OcrInitFailed {
            detail: format!("cannot execute '{}': {}", binary.display(), e),
        })?;

    if !output.status.success() {
        return Err(Pdf2PngError::OcrInitFailed {
            detail: format!("'{} --version' exited with {}", binary.display(), output.status),
        });
    }

    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(parse_version(&combined))
}

/// Pull the version number out of the `tesseract --version` banner.
fn parse_version(banner: &str) -> String {
    for line in banner.lines() {
        if line.contains("tesseract") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 2 {
                return parts[1].trim_start_matches('v').to_string();
            }
        }
    }
    "unknown".to_string()
}

/// Run `tesseract --list-langs` and collect the installed language codes.
fn installed_languages(binary: &PathBuf) -> Result<Vec<String>, Pdf2PngError> {
    let output = Command::new(binary)
        .arg("--list-langs")
        .output()
        .map_err(|e| Pdf2PngError::OcrInitFailed {
            detail: format!("cannot execute '{}': {}", binary.display(), e),
        })?;

    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(parse_language_list(&combined))
}

/// Parse the `--list-langs` output.
///
/// The listing starts with a "List of available languages" header line;
/// everything after it is one language code per line.
fn parse_language_list(listing: &str) -> Vec<String> {
    let mut langs = Vec::new();
    let mut in_list = false;

    for line in listing.lines() {
        let line = line.trim();
        if line.contains("List of available languages") {
            in_list = true;
            continue;
        }
        if in_list && !line.is_empty() && !line.contains(':') {
            langs.push(line.to_string());
        }
    }

    langs
}
