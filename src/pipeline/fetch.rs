//! Image retrieval.
//!
//! The document builder only needs "give me the picture at this URL, or tell
//! me why not". [`ImageFetcher`] is that seam; [`HttpImageFetcher`] is the
//! production implementation and tests plug in an in-memory one.

use crate::config::BuildConfig;
use crate::error::FetchError;
use crate::pipeline::encode::decode_image;
use futures::future::BoxFuture;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name used in the cache when the URL path has no usable file name.
pub const FALLBACK_CACHE_NAME: &str = "image.bin";

/// A successfully downloaded and decoded image.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub url: String,
    pub image: DynamicImage,
    /// Size of the downloaded body.
    pub byte_len: usize,
}

impl FetchedImage {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// Fetch an image by locator.
///
/// Object-safe so builders can take `&dyn ImageFetcher`.
pub trait ImageFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchedImage, FetchError>>;
}

/// Plain HTTP GET, one request per image, no retries.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    cache_dir: Option<PathBuf>,
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            cache_dir: None,
        }
    }

    /// A fetcher that honours [`BuildConfig::image_cache_dir`].
    pub fn from_config(config: &BuildConfig) -> Self {
        match config.image_cache_dir {
            Some(ref dir) => Self::new().with_cache_dir(dir),
            None => Self::new(),
        }
    }

    /// Also keep a copy of every downloaded body in `dir`.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    async fn fetch_inner(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            detail: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(transport)?;
        debug!("Downloaded {} bytes from {}", bytes.len(), url);

        if let Some(dir) = &self.cache_dir {
            write_cache(dir, url, &bytes).await;
        }

        let image = decode_image(&bytes).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

        Ok(FetchedImage {
            url: url.to_string(),
            image,
            byte_len: bytes.len(),
        })
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchedImage, FetchError>> {
        Box::pin(self.fetch_inner(url))
    }
}

async fn write_cache(dir: &Path, url: &str, bytes: &[u8]) {
    let path = dir.join(cache_file_name(url));
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!("Cannot create image cache {}: {}", dir.display(), e);
        return;
    }
    match tokio::fs::write(&path, bytes).await {
        Ok(()) => debug!("Cached image at {}", path.display()),
        Err(e) => warn!("Cannot cache image at {}: {}", path.display(), e),
    }
}

/// File name for a cached download: the last URL path segment, restricted to
/// characters that are safe on every file system.
pub fn cache_file_name(url: &str) -> String {
    let last = reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .unwrap_or_default();

    let clean: String = last
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    if clean.trim_matches('.').is_empty() {
        FALLBACK_CACHE_NAME.to_string()
    } else {
        clean
    }
}
