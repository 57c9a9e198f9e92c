//! Progress-callback trait for per-page build events.
//!
//! Inject an [`Arc<dyn BuildProgressCallback>`] via
//! [`crate::config::BuildConfigBuilder::progress_callback`] to receive
//! events as the builder lays out each selection page.
//!
//! # Example
//!
//! ```rust
//! use newsclip::{BuildConfig, BuildProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     missing: AtomicUsize,
//! }
//!
//! impl BuildProgressCallback for CountingCallback {
//!     fn on_image_error(&self, page_num: usize, _total: usize, error: &str) {
//!         self.missing.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}: {error}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { missing: AtomicUsize::new(0) });
//!
//! let config = BuildConfig::builder()
//!     .progress_callback(counter as Arc<dyn BuildProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the document builder as it processes each selection.
///
/// Implementations must be `Send + Sync` so a config holding one can be
/// moved into a runtime. All methods have default no-op implementations so
/// callers only override what they care about.
pub trait BuildProgressCallback: Send + Sync {
    /// Called once before the title page is laid out.
    ///
    /// # Arguments
    /// * `total_selections` — number of selection pages that will follow
    fn on_build_start(&self, total_selections: usize) {
        let _ = total_selections;
    }

    /// Called before the image for a selection page is fetched.
    ///
    /// # Arguments
    /// * `page_num` — 1-indexed selection number (the title page is not counted)
    /// * `total`    — total selections
    fn on_page_start(&self, page_num: usize, total: usize) {
        let _ = (page_num, total);
    }

    /// Called when a selection page has been laid out.
    ///
    /// # Arguments
    /// * `page_num`     — 1-indexed selection number
    /// * `total`        — total selections
    /// * `image_placed` — false when the image was missing or did not fit
    fn on_page_complete(&self, page_num: usize, total: usize, image_placed: bool) {
        let _ = (page_num, total, image_placed);
    }

    /// Called when the image for a page could not be fetched or decoded.
    fn on_image_error(&self, page_num: usize, total: usize, error: &str) {
        let _ = (page_num, total, error);
    }

    /// Called once after the PDF bytes have been produced.
    ///
    /// # Arguments
    /// * `total_pages` — pages in the document, title page included
    /// * `bytes`       — size of the serialised PDF
    fn on_build_complete(&self, total_pages: usize, bytes: usize) {
        let _ = (total_pages, bytes);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BuildProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BuildConfig`].
pub type ProgressCallback = Arc<dyn BuildProgressCallback>;
