//! Input resolution: turn a user-supplied path or URL into markup text.
//!
//! Saved newsletters are usually `.html` files exported from a mail client,
//! but a "view in browser" link works just as well. Either way the result is
//! the raw document as a `String`; nothing is parsed here.

use crate::error::ClipError;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Timeout for fetching a remote newsletter.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read markup from a local file or an HTTP(S) URL.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<String, ClipError> {
    if input.trim().is_empty() {
        return Err(ClipError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_html(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

async fn read_local(path_str: &str) -> Result<String, ClipError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ClipError::PermissionDenied { path });
        }
        Err(_) => return Err(ClipError::FileNotFound { path }),
    };

    let html = String::from_utf8(bytes).map_err(|_| ClipError::NotText {
        input: path_str.to_string(),
    })?;

    debug!("Read {} bytes of markup from {}", html.len(), path.display());
    Ok(html)
}

async fn download_html(url: &str, timeout_secs: u64) -> Result<String, ClipError> {
    info!("Downloading newsletter from: {}", url);

    let failed = |reason: String| ClipError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {}s", timeout_secs))
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    let html = String::from_utf8(bytes.to_vec()).map_err(|_| ClipError::NotText {
        input: url.to_string(),
    })?;

    info!("Downloaded {} bytes of markup", html.len());
    Ok(html)
}
