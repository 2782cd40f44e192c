//! CLI binary for pdf2png.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2png::{
    convert, inspect, ConversionConfig, ConversionProgressCallback, PageErrorPolicy,
    ProgressCallback,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-page log
/// lines using [indicatif]. Pages arrive strictly in order, so there is no
/// out-of-order bookkeeping to do.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically
    /// by `on_conversion_start` (called once the document is loaded).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_conversion_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_pages} pages to PNG…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, png_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{:>7} bytes", png_len)),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: String) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages converted  ({} failed)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert every page to output_page_<N>.png in the current directory
  pdf2png document.pdf

  # Render at a higher scale into a specific directory
  pdf2png --scale 3.0 -o pages/ document.pdf

  # Extract German+English text alongside the images
  pdf2png --ocr --langs deu+eng invoice.pdf

  # OCR only — skip writing PNG files
  pdf2png --ocr --no-write scan.pdf

  # Convert from a URL
  pdf2png https://example.com/report.pdf

  # Keep going when individual pages fail
  pdf2png --skip-failed damaged.pdf

  # Inspect PDF metadata (no rendering)
  pdf2png --inspect-only document.pdf

OUTPUT FILES:
  Pages are written as output_page_1.png … output_page_<N>.png (1-based),
  overwriting existing files of the same name. Rendering is deterministic:
  re-running with the same input and scale reproduces identical bytes.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH    Path to an existing libpdfium (file or directory)
  TESSDATA_PREFIX    Standard tesseract language-data override

SETUP:
  pdfium is loaded from PDFIUM_LIB_PATH, the executable's directory, or the
  system library. OCR additionally needs a tesseract install with the
  requested language data (e.g. apt install tesseract-ocr tesseract-ocr-deu).
"#;

/// Convert PDF pages to PNG images, with optional OCR text extraction.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2png",
    version,
    about = "Convert PDF pages to PNG images, with optional OCR text extraction",
    long_about = "Rasterise each page of a PDF document (local file or URL) into a lossless \
PNG image via pdfium, and optionally run Tesseract OCR on every rendered page.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Directory to write PNG files into.
    #[arg(short, long, env = "PDF2PNG_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Rasterisation scale applied to each page's intrinsic size (0.1–8.0).
    #[arg(
        long,
        env = "PDF2PNG_SCALE",
        default_value_t = 2.4,
        long_help = "Scale factor over the page's natural size. PDF pages are measured at \
          72 DPI, so 1.0 renders at 72 DPI and the 2.4 default at ~173 DPI — sharp \
          enough for OCR without oversized files."
    )]
    scale: f32,

    /// Do not write PNG files (render in memory only).
    #[arg(long, env = "PDF2PNG_NO_WRITE")]
    no_write: bool,

    /// Run OCR text extraction on each page and print the text.
    #[arg(long, env = "PDF2PNG_OCR")]
    ocr: bool,

    /// Tesseract language set, codes joined with '+'.
    #[arg(long, env = "PDF2PNG_LANGS", default_value = "deu+eng")]
    langs: String,

    /// Explicit path to the tesseract binary.
    #[arg(long, env = "PDF2PNG_OCR_BINARY")]
    ocr_binary: Option<PathBuf>,

    /// Log failed pages and continue instead of halting the run.
    #[arg(long, env = "PDF2PNG_SKIP_FAILED")]
    skip_failed: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2PNG_PASSWORD")]
    password: Option<String>,

    /// Output structured JSON (metadata, stats, per-page outcomes).
    #[arg(long, env = "PDF2PNG_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2PNG_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2PNG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2PNG_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2PNG_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).await.context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialise metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&cli.input, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    // OCR text goes to stdout, page by page, so it can be piped onward.
    if cli.ocr {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for (page_num, text) in output.recognized_text() {
            if !cli.quiet {
                writeln!(handle, "{}", dim(&format!("── page {page_num} ──")))
                    .context("Failed to write to stdout")?;
            }
            writeln!(handle, "{}", text.trim_end()).context("Failed to write to stdout")?;
        }
    }

    // Summary (the callback already printed the final green/red tick).
    if !cli.quiet && !show_progress {
        eprintln!(
            "Converted {}/{} pages in {}ms",
            output.stats.processed_pages, output.stats.total_pages, output.stats.total_duration_ms
        );
        if output.stats.failed_pages > 0 {
            eprintln!("  {} pages failed", output.stats.failed_pages);
        }
    } else if !cli.quiet {
        eprintln!(
            "   {} files written  —  {}ms total",
            dim(&output.stats.written_files.to_string()),
            output.stats.total_duration_ms,
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .scale(cli.scale)
        .write_pages(!cli.no_write)
        .output_dir(cli.output_dir.clone())
        .ocr_enabled(cli.ocr)
        .ocr_languages(cli.langs.clone())
        .on_page_error(if cli.skip_failed {
            PageErrorPolicy::Skip
        } else {
            PageErrorPolicy::Halt
        })
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref binary) = cli.ocr_binary {
        builder = builder.ocr_binary(binary.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
