//! Result types produced by document building.

use crate::error::{ClipError, FetchError};
use crate::pipeline::layout::PageLayout;
use serde::{Deserialize, Serialize};

/// A finished document: the laid-out page model and its PDF serialisation.
#[derive(Debug, Clone)]
pub struct ClipDocument {
    /// Title page first, then one page per selection.
    pub pages: Vec<PageLayout>,
    /// The serialised PDF.
    pub bytes: Vec<u8>,
    /// One entry per selection page, in order.
    pub page_results: Vec<PageResult>,
    pub stats: BuildStats,
}

impl ClipDocument {
    /// Pages including the title page.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Treat any missing image as an error.
    ///
    /// The builder itself never fails because of a single image; callers that
    /// want all-or-nothing output use this.
    pub fn into_result(self) -> Result<Self, ClipError> {
        if let Some(err) = self.page_results.iter().find_map(|p| p.image_error.as_ref()) {
            return Err(ClipError::DownloadFailed {
                url: err.url().to_string(),
                reason: err.to_string(),
            });
        }
        Ok(self)
    }
}

/// What happened on one selection page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed selection number; the PDF page is `page_num + 1`.
    pub page_num: usize,
    pub image_src: String,
    pub image_placed: bool,
    /// Set when the image could not be fetched or decoded.
    pub image_error: Option<FetchError>,
    pub text_lines: usize,
    pub note_lines: usize,
}

/// Aggregate numbers for one build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildStats {
    pub total_pages: usize,
    pub images_placed: usize,
    pub images_missing: usize,
    pub pdf_bytes: usize,
    pub fetch_duration_ms: u64,
    pub total_duration_ms: u64,
}
