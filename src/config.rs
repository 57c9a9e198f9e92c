//! Configuration types for extraction and document building.
//!
//! Extraction is controlled through [`ExtractConfig`]; document generation
//! through [`BuildConfig`], built via its [`BuildConfigBuilder`]. Keeping
//! every knob in one struct per stage makes it trivial to share configs,
//! serialise them for logging, and diff two runs.

use crate::error::ClipError;
use crate::pipeline::layout::PageGeometry;
use crate::progress::ProgressCallback;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default title printed on the first page of every document.
pub const DEFAULT_TITLE: &str = "CLIFTON FIRST DATA";

// ── Extraction ───────────────────────────────────────────────────────────

/// Configuration for turning markup into [`crate::Element`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Boilerplate removal applied before walking the body. Default: none.
    pub prefilter: PreFilter,
}

impl ExtractConfig {
    pub fn with_prefilter(prefilter: PreFilter) -> Self {
        Self { prefilter }
    }
}

/// Strategy for cutting newsletter boilerplate out of the markup.
///
/// Newsletters repeat a licence banner or masthead in every issue. Two
/// strategies exist because different issues mark the boilerplate
/// differently; neither is applied unless asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreFilter {
    /// Leave the markup untouched (default).
    #[default]
    None,
    /// Remove the first `start` … `end` span (both markers included),
    /// matching across newlines, before parsing.
    StripBetween { start: String, end: String },
    /// Drop everything in the serialised body before `sentinel`. When the
    /// sentinel is absent the body is kept whole.
    TruncateBefore { sentinel: String },
}

impl PreFilter {
    pub fn strip_between(start: impl Into<String>, end: impl Into<String>) -> Self {
        PreFilter::StripBetween {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn truncate_before(sentinel: impl Into<String>) -> Self {
        PreFilter::TruncateBefore {
            sentinel: sentinel.into(),
        }
    }
}

// ── Document building ────────────────────────────────────────────────────

/// Configuration for building the PDF from selection triples.
///
/// Built via [`BuildConfig::builder()`] or using [`BuildConfig::default()`].
///
/// # Example
/// ```rust
/// use newsclip::BuildConfig;
///
/// let config = BuildConfig::builder()
///     .title("MORNING CHARTS")
///     .build()
///     .unwrap();
/// assert_eq!(config.title, "MORNING CHARTS");
/// ```
#[derive(Clone)]
pub struct BuildConfig {
    /// Title on the first page. Default: [`DEFAULT_TITLE`].
    pub title: String,

    /// Date printed under the title. If None, today's local date is used.
    pub generated_on: Option<NaiveDate>,

    /// Page size and margins. Default: A4 with 50 pt margins.
    pub geometry: PageGeometry,

    /// Directory to keep a copy of every downloaded image in. Default: None.
    ///
    /// Files are named after the last path segment of the image URL. The
    /// directory is created on first use.
    pub image_cache_dir: Option<PathBuf>,

    /// Receives per-page events while the document is built.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            generated_on: None,
            geometry: PageGeometry::default(),
            image_cache_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildConfig")
            .field("title", &self.title)
            .field("generated_on", &self.generated_on)
            .field("geometry", &self.geometry)
            .field("image_cache_dir", &self.image_cache_dir)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BuildProgressCallback>"),
            )
            .finish()
    }
}

impl BuildConfig {
    /// Create a new builder for `BuildConfig`.
    pub fn builder() -> BuildConfigBuilder {
        BuildConfigBuilder {
            config: Self::default(),
        }
    }

    /// The date for the title page: the configured one, or today.
    pub fn title_date(&self) -> NaiveDate {
        self.generated_on
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Builder for [`BuildConfig`].
pub struct BuildConfigBuilder {
    config: BuildConfig,
}

impl BuildConfigBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn generated_on(mut self, date: NaiveDate) -> Self {
        self.config.generated_on = Some(date);
        self
    }

    pub fn geometry(mut self, geometry: PageGeometry) -> Self {
        self.config.geometry = geometry;
        self
    }

    pub fn image_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.image_cache_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BuildConfig, ClipError> {
        let g = &self.config.geometry;
        if g.width <= 2.0 * g.margin || g.height <= 2.0 * g.margin {
            return Err(ClipError::InvalidConfig(format!(
                "margin {} leaves no room on a {}x{} pt page",
                g.margin, g.width, g.height
            )));
        }
        Ok(self.config)
    }
}
