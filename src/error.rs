//! Error types for the newsclip library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ClipError`] — **Fatal** for the document at hand: the markup has no
//!   body, the input cannot be read, the inbox cannot be reached. Returned as
//!   `Err(ClipError)` from the top-level functions in [`crate::convert`].
//!
//! * [`FetchError`] — **Non-fatal**: a single image could not be downloaded
//!   or decoded. The page is still produced without the image and the error
//!   is stored in [`crate::output::PageResult`] so callers can report it.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the newsclip library.
///
/// Image-level failures use [`FetchError`] and are stored in
/// [`crate::output::PageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ClipError {
    // ── Markup errors ─────────────────────────────────────────────────────
    /// The markup has no `<body>` container to walk.
    #[error("No body tag found in the HTML.")]
    NoBody,

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("HTML file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but the download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Input bytes are not valid UTF-8 text.
    #[error("Input '{input}' is not valid UTF-8 text")]
    NotText { input: String },

    // ── Selection errors ──────────────────────────────────────────────────
    /// A selection refers to an element index that is not an image.
    #[error("No image element with index {index} in the extracted content")]
    UnknownSelection { index: usize },

    // ── Inbox errors ──────────────────────────────────────────────────────
    /// The inbox collaborator could not be reached or returned garbage.
    #[error("Inbox request failed: {detail}")]
    InboxFailed { detail: String },

    /// No usable access token for the inbox.
    #[error("No inbox access token available: {hint}")]
    MissingToken { hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image.
///
/// The page the image belongs to is still emitted, just without the image.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum FetchError {
    /// Connection, DNS or body-read failure.
    #[error("Error downloading image {url}: {detail}")]
    Transport { url: String, detail: String },

    /// Server answered with something other than 200.
    #[error("Error downloading image {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// Bytes arrived but are not a decodable image.
    #[error("Error decoding image {url}: {detail}")]
    Decode { url: String, detail: String },
}

impl FetchError {
    /// The URL the failed fetch was for.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::HttpStatus { url, .. }
            | FetchError::Decode { url, .. } => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_body_display() {
        assert_eq!(ClipError::NoBody.to_string(), "No body tag found in the HTML.");
    }

    #[test]
    fn unknown_selection_display() {
        let e = ClipError::UnknownSelection { index: 42 };
        assert!(e.to_string().contains("42"), "got: {e}");
    }

    #[test]
    fn http_status_display() {
        let e = FetchError::HttpStatus {
            url: "https://example.com/a.png".into(),
            status: 404,
        };
        let msg = e.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("https://example.com/a.png"));
    }

    #[test]
    fn fetch_error_url_accessor() {
        let e = FetchError::Decode {
            url: "u".into(),
            detail: "bad magic".into(),
        };
        assert_eq!(e.url(), "u");
    }

    #[test]
    fn fetch_error_roundtrips_through_json() {
        let e = FetchError::Transport {
            url: "https://x/y.jpg".into(),
            detail: "connection refused".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: FetchError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
