//! End-to-end integration tests for pdf2png.
//!
//! Conversion tests need a pdfium library at runtime, so they are gated
//! behind the `E2E_ENABLED` environment variable and do not run in CI
//! unless explicitly requested. OCR tests additionally need a tesseract
//! install and are skipped when none is found.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! Test documents are generated in-process: a minimal PDF needs only a
//! catalog, a page tree, and empty pages, which pdfium happily rasterises
//! as blank pages of the declared MediaBox size.

use pdf2png::{
    convert_from_bytes, ConversionConfig, ConversionProgressCallback, PageErrorPolicy,
};
use std::process::Command;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Build a minimal but well-formed PDF with `page_count` empty pages of
/// 200 × 100 pt, computing the xref offsets at runtime.
fn minimal_pdf(page_count: usize) -> Vec<u8> {
    let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", 3 + i)).collect();

    let mut objects: Vec<String> = vec![
        "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_string(),
        format!(
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids.join(" "),
            page_count
        ),
    ];
    for i in 0..page_count {
        objects.push(format!(
            "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 100] >>\nendobj\n",
            3 + i
        ));
    }

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for obj in &objects {
        offsets.push(pdf.len());
        pdf.extend_from_slice(obj.as_bytes());
    }

    let xref_pos = pdf.len();
    let size = objects.len() + 1;
    pdf.extend_from_slice(format!("xref\n0 {}\n", size).as_bytes());
    pdf.extend_from_slice(b"0000000000 65535 f \n");
    for off in &offsets {
        pdf.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, xref_pos
        )
        .as_bytes(),
    );
    pdf
}

/// Skip this test unless E2E_ENABLED is set (pdfium must be loadable).
macro_rules! e2e_skip_unless_enabled {
    () => {
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    };
}

/// Whether a tesseract binary with English data is reachable.
fn tesseract_available() -> bool {
    Command::new("tesseract")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn base_config(dir: &std::path::Path) -> ConversionConfig {
    ConversionConfig::builder()
        .scale(2.0)
        .output_dir(dir)
        .build()
        .expect("valid config")
}

// ── Helper sanity (always run) ───────────────────────────────────────────────

#[test]
fn minimal_pdf_has_magic_and_eof() {
    let pdf = minimal_pdf(2);
    assert!(pdf.starts_with(b"%PDF-1.4"));
    assert!(pdf.ends_with(b"%%EOF\n"));
}

// ── Conversion tests (need pdfium) ───────────────────────────────────────────

#[tokio::test]
async fn converts_every_page_to_a_named_png() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();

    let output = convert_from_bytes(minimal_pdf(3), &base_config(dir.path()))
        .await
        .expect("conversion should succeed");

    assert_eq!(output.stats.total_pages, 3);
    assert_eq!(output.stats.processed_pages, 3);
    assert_eq!(output.stats.failed_pages, 0);
    assert_eq!(output.stats.written_files, 3);

    for n in 1..=3 {
        let path = dir.path().join(format!("output_page_{n}.png"));
        assert!(path.exists(), "missing {}", path.display());

        // Well-formed PNG at the page's intrinsic size × scale.
        let img = image::open(&path).expect("decodable PNG");
        assert_eq!(img.width(), 400, "200 pt × scale 2.0");
        assert_eq!(img.height(), 200, "100 pt × scale 2.0");
    }
    assert!(!dir.path().join("output_page_4.png").exists());
}

#[tokio::test]
async fn pages_are_processed_strictly_in_order() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();

    struct OrderCheck {
        last_started: AtomicUsize,
        in_flight: AtomicBool,
        violations: AtomicUsize,
    }

    impl ConversionProgressCallback for OrderCheck {
        fn on_page_start(&self, page_num: usize, _total: usize) {
            // The previous page's pipeline must have fully completed.
            if self.in_flight.swap(true, Ordering::SeqCst) {
                self.violations.fetch_add(1, Ordering::SeqCst);
            }
            let prev = self.last_started.swap(page_num, Ordering::SeqCst);
            if page_num != prev + 1 {
                self.violations.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_page_complete(&self, _page_num: usize, _total: usize, _png_len: usize) {
            self.in_flight.store(false, Ordering::SeqCst);
        }
    }

    let check = Arc::new(OrderCheck {
        last_started: AtomicUsize::new(0),
        in_flight: AtomicBool::new(false),
        violations: AtomicUsize::new(0),
    });

    let config = ConversionConfig::builder()
        .scale(2.0)
        .output_dir(dir.path())
        .progress_callback(Arc::clone(&check) as Arc<dyn ConversionProgressCallback>)
        .build()
        .expect("valid config");

    convert_from_bytes(minimal_pdf(5), &config)
        .await
        .expect("conversion should succeed");

    assert_eq!(check.last_started.load(Ordering::SeqCst), 5);
    assert_eq!(check.violations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn write_disabled_renders_but_writes_nothing() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();

    let completes = Arc::new(AtomicUsize::new(0));

    struct Counter(Arc<AtomicUsize>);
    impl ConversionProgressCallback for Counter {
        fn on_page_complete(&self, _page_num: usize, _total: usize, _png_len: usize) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let config = ConversionConfig::builder()
        .scale(2.0)
        .output_dir(dir.path())
        .write_pages(false)
        .progress_callback(Arc::new(Counter(Arc::clone(&completes))))
        .build()
        .expect("valid config");

    let output = convert_from_bytes(minimal_pdf(2), &config)
        .await
        .expect("conversion should succeed");

    // Events fired for every page, images rendered in memory, no files.
    assert_eq!(completes.load(Ordering::SeqCst), 2);
    assert_eq!(output.stats.written_files, 0);
    assert!(output.pages.iter().all(|p| !p.png.is_empty()));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn single_page_document_produces_exactly_one_file() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();

    let output = convert_from_bytes(minimal_pdf(1), &base_config(dir.path()))
        .await
        .expect("conversion should succeed");

    assert_eq!(output.pages.len(), 1);
    let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[tokio::test]
async fn zero_page_document_terminates_cleanly() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();

    let output = convert_from_bytes(minimal_pdf(0), &base_config(dir.path()))
        .await
        .expect("0-page conversion should not error");

    assert_eq!(output.stats.total_pages, 0);
    assert!(output.pages.is_empty());
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn rerun_overwrites_byte_identically() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();
    let config = base_config(dir.path());
    let pdf = minimal_pdf(1);

    convert_from_bytes(pdf.clone(), &config).await.unwrap();
    let first = std::fs::read(dir.path().join("output_page_1.png")).unwrap();

    convert_from_bytes(pdf, &config).await.unwrap();
    let second = std::fs::read(dir.path().join("output_page_1.png")).unwrap();

    assert_eq!(first, second, "deterministic rendering for a fixed scale");
}

#[tokio::test]
async fn garbage_bytes_fail_with_document_load_failure() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();

    let result = convert_from_bytes(b"%PDF-1.4 but not really".to_vec(), &base_config(dir.path()))
        .await;

    assert!(result.is_err(), "malformed document must be fatal");
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

// ── OCR tests (need pdfium + tesseract) ──────────────────────────────────────

#[tokio::test]
async fn ocr_disabled_never_touches_tesseract() {
    e2e_skip_unless_enabled!();
    let dir = tempfile::tempdir().unwrap();

    // A nonexistent binary would make OCR initialisation fail — disabled
    // runs must not even try to resolve it.
    let config = ConversionConfig::builder()
        .scale(2.0)
        .output_dir(dir.path())
        .ocr_enabled(false)
        .ocr_binary("/definitely/not/tesseract")
        .build()
        .expect("valid config");

    let output = convert_from_bytes(minimal_pdf(1), &config)
        .await
        .expect("conversion should succeed without any OCR install");

    assert!(output.pages[0].text.is_none());
    assert_eq!(output.stats.ocr_pages, 0);
}

#[tokio::test]
async fn ocr_enabled_records_text_per_page() {
    e2e_skip_unless_enabled!();
    if !tesseract_available() {
        println!("SKIP — tesseract not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();

    let config = ConversionConfig::builder()
        .scale(2.0)
        .output_dir(dir.path())
        .ocr_enabled(true)
        .ocr_languages("eng")
        .build()
        .expect("valid config");

    let output = convert_from_bytes(minimal_pdf(1), &config)
        .await
        .expect("conversion with OCR should succeed");

    // Blank page: recognised text is present (possibly empty/whitespace).
    assert!(output.pages[0].text.is_some());
    assert_eq!(output.stats.ocr_pages, 1);
}

#[tokio::test]
async fn ocr_with_missing_language_fails_before_first_page() {
    e2e_skip_unless_enabled!();
    if !tesseract_available() {
        println!("SKIP — tesseract not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();

    let starts = Arc::new(AtomicUsize::new(0));
    struct Starts(Arc<AtomicUsize>);
    impl ConversionProgressCallback for Starts {
        fn on_page_start(&self, _page_num: usize, _total: usize) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let config = ConversionConfig::builder()
        .scale(2.0)
        .output_dir(dir.path())
        .ocr_enabled(true)
        .ocr_languages("zzz_not_a_language")
        .progress_callback(Arc::new(Starts(Arc::clone(&starts))))
        .build()
        .expect("valid config");

    let result = convert_from_bytes(minimal_pdf(2), &config).await;

    assert!(result.is_err(), "missing language data must be fatal");
    assert_eq!(
        starts.load(Ordering::SeqCst),
        0,
        "no page may be fetched before OCR initialisation completes"
    );
}

// ── Callback API tests (no pdfium, always run) ───────────────────────────────

/// Verifies that `ConversionProgressCallback` can be boxed as `Arc<dyn …>`
/// and moved into a `tokio::spawn` task — the type the library actually
/// stores and passes through the pipeline must be Send.
#[tokio::test]
async fn callback_is_send_in_tokio_spawn() {
    struct ErrorLogger {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ConversionProgressCallback for ErrorLogger {
        fn on_page_error(&self, _page: usize, _total: usize, error: String) {
            self.log.lock().unwrap().push(error);
        }
    }

    let logger = Arc::new(ErrorLogger {
        log: Arc::new(Mutex::new(vec![])),
    });
    let log_ref = Arc::clone(&logger.log);

    let cb: Arc<dyn ConversionProgressCallback> =
        Arc::clone(&logger) as Arc<dyn ConversionProgressCallback>;

    tokio::spawn(async move {
        cb.on_page_error(2, 5, "rasterisation failed".to_string());
    })
    .await
    .expect("spawn must succeed");

    let captured = log_ref.lock().unwrap().clone();
    assert_eq!(captured, vec!["rasterisation failed"]);
}

#[test]
fn config_builder_accepts_full_ocr_setup() {
    let config = ConversionConfig::builder()
        .scale(3.0)
        .write_pages(false)
        .ocr_enabled(true)
        .ocr_languages("deu+eng")
        .ocr_binary("/usr/local/bin/tesseract")
        .on_page_error(PageErrorPolicy::Skip)
        .build()
        .expect("builder must succeed");

    assert_eq!(config.scale, 3.0);
    assert!(!config.write_pages);
    assert!(config.ocr_enabled);
    assert_eq!(config.ocr_languages, "deu+eng");
    assert_eq!(config.on_page_error, PageErrorPolicy::Skip);
}
