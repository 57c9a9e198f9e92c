//! # newsclip
//!
//! Clip charts and commentary out of HTML newsletters into a printable PDF.
//!
//! ## Why this crate?
//!
//! Market newsletters arrive as long HTML emails: dozens of charts, each
//! preceded by a paragraph or two of commentary. Reading them is fine;
//! keeping the five charts that matter, with your own notes, is tedious.
//! This crate pulls out every image and the text that leads up to it, lets
//! the caller pick images and annotate them, and lays each pick out on its
//! own A4 page behind a title page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HTML (file, URL or inbox message)
//!  │
//!  ├─ 1. Input     read the markup
//!  ├─ 2. Filter    optionally cut boilerplate between markers
//!  ├─ 3. Extract   images and text nodes in document order
//!  ├─ 4. Dedupe    drop repeated text
//!  ├─ 5. Select    caller's picks + notes → (image, text, note) triples
//!  ├─ 6. Fetch     download each picked image
//!  ├─ 7. Layout    wrap text, fit image, position on the page
//!  └─ 8. Render    PDF bytes via printpdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use newsclip::{build_document_http, extract, selection_triples};
//! use newsclip::{BuildConfig, ExtractConfig, Selection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let html = std::fs::read_to_string("issue.html")?;
//!     let elements = extract(&html, &ExtractConfig::default())?;
//!
//!     // Pick the first image and annotate it.
//!     let first = elements.iter().find(|e| e.is_image()).map(|e| e.index());
//!     let picks: Vec<Selection> = first.map(|i| Selection::new(i, "watch this")).into_iter().collect();
//!
//!     let triples = selection_triples(&elements, &picks)?;
//!     let doc = build_document_http(&triples, &BuildConfig::default()).await?;
//!     std::fs::write("clip.pdf", &doc.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `newsclip` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! newsclip = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod element;
pub mod error;
pub mod inbox;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BuildConfig, BuildConfigBuilder, ExtractConfig, PreFilter, DEFAULT_TITLE};
pub use convert::{
    build_document, build_document_http, build_document_sync, build_to_file, extract,
    extract_from, extract_from_inbox,
};
pub use element::{Element, Selection, SelectionTriple};
pub use error::{ClipError, FetchError};
pub use inbox::{GmailInbox, Inbox, MessageContent, MessageSummary};
pub use naming::default_filename;
pub use output::{BuildStats, ClipDocument, PageResult};
pub use pipeline::fetch::{FetchedImage, HttpImageFetcher, ImageFetcher};
pub use pipeline::layout::{fit_image, wrap_text, PageGeometry, PageLayout, PlacedItem};
pub use pipeline::select::{image_candidates, selection_triples, ImageCandidate};
pub use progress::{BuildProgressCallback, NoopProgressCallback, ProgressCallback};
