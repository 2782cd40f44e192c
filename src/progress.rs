//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline processes each page.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a log file, or a terminal progress bar —
//! without the library knowing anything about how the host application
//! communicates. The trait is `Send + Sync` because the pipeline runs on a
//! blocking-pool thread, not the caller's thread.

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive in page order — the pipeline is
/// strictly sequential, so no synchronisation beyond `Send + Sync` is
/// required of implementations.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the document is loaded, before any page is fetched.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when a page's pipeline begins (before rendering).
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page's full pipeline (render, optional write, optional
    /// OCR) completed without error.
    ///
    /// `png_len` is the byte length of the encoded PNG — useful for progress
    /// displays that track output size.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, png_len: usize) {
        let _ = (page_num, total_pages, png_len);
    }

    /// Called when a page recorded an error.
    ///
    /// Under [`crate::config::PageErrorPolicy::Skip`] the run continues;
    /// under `Halt` this is the last page event before the run aborts.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: String) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after the last page (or on halt), with the number of
    /// pages that completed without error.
    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        final_success: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _png_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page_num: usize, _total_pages: usize, _error: String) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _total_pages: usize, success_count: usize) {
            self.final_success.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(5);
        cb.on_page_start(1, 5);
        cb.on_page_complete(1, 5, 42);
        cb.on_page_error(2, 5, "some error".to_string());
        cb.on_conversion_complete(5, 4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            final_success: AtomicUsize::new(0),
        };

        tracker.on_conversion_start(3);
        tracker.on_page_start(1, 3);
        tracker.on_page_complete(1, 3, 100);
        tracker.on_page_start(2, 3);
        tracker.on_page_complete(2, 3, 200);
        tracker.on_page_start(3, 3);
        tracker.on_page_error(3, 3, "render glitch".to_string());
        tracker.on_conversion_complete(3, 2);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.final_success.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_is_send() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ConversionProgressCallback>();

        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        std::thread::spawn(move || {
            cb.on_page_complete(1, 10, 512);
        })
        .join()
        .unwrap();
    }
}
