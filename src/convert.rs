//! Top-level entry points: markup → elements, and selections → PDF.
//!
//! Both halves are eager. [`extract`] is synchronous because parsing is pure
//! CPU work on an in-memory string; [`build_document`] is async because every
//! selected image is downloaded. Images are fetched one at a time, in page
//! order, so a slow CDN shows up as a slow page rather than a reordering.

use crate::config::{BuildConfig, ExtractConfig};
use crate::element::{Element, SelectionTriple};
use crate::error::ClipError;
use crate::inbox::Inbox;
use crate::output::{BuildStats, ClipDocument, PageResult};
use crate::pipeline::fetch::{HttpImageFetcher, ImageFetcher};
use crate::pipeline::layout::{layout_selection_page, layout_title_page, SelectionBlocks};
use crate::pipeline::{dedupe, encode, extract as walk, input, render};
use printpdf::RawImage;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Title-page date format, e.g. `"January 01, 2024"`.
pub const TITLE_DATE_FORMAT: &str = "%B %d, %Y";

/// Parse markup into the deduplicated element list a selection UI shows.
///
/// # Errors
/// [`ClipError::NoBody`] if the markup has no `<body>`.
pub fn extract(html: &str, config: &ExtractConfig) -> Result<Vec<Element>, ClipError> {
    let elements = walk::extract_elements(html, config)?;
    Ok(dedupe::remove_duplicate_text(elements))
}

/// Read markup from a file path or URL, then [`extract`] it.
pub async fn extract_from(input_str: &str, config: &ExtractConfig) -> Result<Vec<Element>, ClipError> {
    let html = input::resolve_input(input_str, input::DEFAULT_TIMEOUT_SECS).await?;
    extract(&html, config)
}

/// Fetch one message from `inbox` and [`extract`] its HTML body.
///
/// Returns the elements together with the message's `Date` header, which
/// [`crate::naming::default_filename`] uses.
pub async fn extract_from_inbox(
    inbox: &dyn Inbox,
    message_id: &str,
    config: &ExtractConfig,
) -> Result<(Vec<Element>, Option<String>), ClipError> {
    let content = inbox.fetch_message(message_id).await?;
    let elements = extract(&content.html, config)?;
    Ok((elements, content.date))
}

/// Build the PDF: a title page, then one page per triple in order.
///
/// Missing images never fail the build; the page is emitted without one and
/// the [`crate::FetchError`] is recorded in its [`PageResult`].
///
/// # Errors
/// Only for internal failures while serialising the PDF.
pub async fn build_document(
    triples: &[SelectionTriple],
    config: &BuildConfig,
    fetcher: &dyn ImageFetcher,
) -> Result<ClipDocument, ClipError> {
    let total_start = Instant::now();
    let total = triples.len();
    let geometry = config.geometry;
    info!("Building document with {} selections", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_build_start(total);
    }

    // ── Step 1: Title page ───────────────────────────────────────────────
    let date_line = config.title_date().format(TITLE_DATE_FORMAT).to_string();
    let mut pages = Vec::with_capacity(total + 1);
    pages.push(layout_title_page(&geometry, &config.title, &date_line));

    // ── Step 2: One page per selection ───────────────────────────────────
    let mut images: HashMap<String, RawImage> = HashMap::new();
    let mut page_results = Vec::with_capacity(total);
    let mut fetch_time = Duration::ZERO;

    for (i, triple) in triples.iter().enumerate() {
        let page_num = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total);
        }

        let blocks = SelectionBlocks::wrap(&geometry, &triple.text, &triple.note);
        let available = blocks.available_image_height(&geometry);

        let mut image_error = None;
        let mut dimensions = None;
        if available <= 0.0 {
            warn!(
                "Page {}: text and note leave no room for {} ({:.1} pt)",
                page_num, triple.image_src, available
            );
        } else {
            let fetch_start = Instant::now();
            match fetcher.fetch(&triple.image_src).await {
                Ok(fetched) => {
                    dimensions = Some(fetched.dimensions());
                    images
                        .entry(triple.image_src.clone())
                        .or_insert_with(|| encode::to_raw_image(&fetched.image));
                }
                Err(e) => {
                    warn!("Page {}: {}", page_num, e);
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_image_error(page_num, total, &e.to_string());
                    }
                    image_error = Some(e);
                }
            }
            fetch_time += fetch_start.elapsed();
        }

        let image = dimensions.map(|(w, h)| (triple.image_src.as_str(), w, h));
        let page = layout_selection_page(&geometry, page_num, &blocks, image);
        let image_placed = page.image().is_some();

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_num, total, image_placed);
        }

        page_results.push(PageResult {
            page_num,
            image_src: triple.image_src.clone(),
            image_placed,
            image_error,
            text_lines: blocks.text_lines.len(),
            note_lines: blocks.note_lines.len(),
        });
        pages.push(page);
    }

    // ── Step 3: Serialise ────────────────────────────────────────────────
    let bytes = render::render_pdf(config.title.clone(), geometry, pages.clone(), images).await?;

    let images_placed = page_results.iter().filter(|p| p.image_placed).count();
    let stats = BuildStats {
        total_pages: pages.len(),
        images_placed,
        images_missing: total - images_placed,
        pdf_bytes: bytes.len(),
        fetch_duration_ms: fetch_time.as_millis() as u64,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Document complete: {} pages, {}/{} images, {} bytes, {}ms",
        stats.total_pages, images_placed, total, stats.pdf_bytes, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_build_complete(stats.total_pages, stats.pdf_bytes);
    }

    Ok(ClipDocument {
        pages,
        bytes,
        page_results,
        stats,
    })
}

/// [`build_document`] with the HTTP fetcher, honouring
/// [`BuildConfig::image_cache_dir`].
pub async fn build_document_http(
    triples: &[SelectionTriple],
    config: &BuildConfig,
) -> Result<ClipDocument, ClipError> {
    let fetcher = HttpImageFetcher::from_config(config);
    build_document(triples, config, &fetcher).await
}

/// Synchronous wrapper around [`build_document_http`].
///
/// Creates a temporary tokio runtime internally.
pub fn build_document_sync(
    triples: &[SelectionTriple],
    config: &BuildConfig,
) -> Result<ClipDocument, ClipError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ClipError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(build_document_http(triples, config))
}

/// Build the document and write it to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn build_to_file(
    triples: &[SelectionTriple],
    output_path: impl AsRef<Path>,
    config: &BuildConfig,
    fetcher: &dyn ImageFetcher,
) -> Result<ClipDocument, ClipError> {
    let doc = build_document(triples, config, fetcher).await?;
    write_atomic(output_path.as_ref(), &doc.bytes).await?;
    Ok(doc)
}

/// Write `bytes` to `path` via a sibling temp file and a rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ClipError> {
    let write_err = |e: std::io::Error| ClipError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
