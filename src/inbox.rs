//! Mailbox access: list newsletters from a sender and pull one's HTML body.
//!
//! [`Inbox`] is the seam; [`GmailInbox`] talks to the Gmail REST API (v1)
//! with a caller-supplied OAuth bearer token. Obtaining and refreshing that
//! token is the caller's job.

use crate::error::ClipError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Sender whose newsletters are listed when none is given.
pub const DEFAULT_SENDER: &str = "Editor@thedailyshot.com";

/// Upper bound on messages returned by one listing.
pub const MAX_LIST_RESULTS: u32 = 100;

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// One row of a mailbox listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: String,
    pub snippet: String,
    pub subject: Option<String>,
    /// Raw `Date` header, e.g. `"Mon, 01 Jan 2024 10:00:00 +0000"`.
    pub date: Option<String>,
}

/// A fetched message: its HTML body (empty if it has none) and `Date` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    pub html: String,
    pub date: Option<String>,
}

/// A source of newsletter messages.
pub trait Inbox: Send + Sync {
    fn list_messages<'a>(
        &'a self,
        sender: &'a str,
    ) -> BoxFuture<'a, Result<Vec<MessageSummary>, ClipError>>;

    fn fetch_message<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<MessageContent, ClipError>>;
}

// ── Gmail wire format ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GmailMessage {
    id: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    payload: MessagePart,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessagePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    body: Option<PartBody>,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct PartBody {
    #[serde(default)]
    data: Option<String>,
}

impl MessagePart {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.as_str())
    }

    /// Encoded body of the first `text/html` part, depth-first.
    fn find_html(&self) -> Option<&str> {
        if self.mime_type == "text/html" {
            if let Some(data) = self.body.as_ref().and_then(|b| b.data.as_deref()) {
                return Some(data);
            }
        }
        self.parts.iter().find_map(MessagePart::find_html)
    }
}

impl GmailMessage {
    fn summary(&self) -> MessageSummary {
        MessageSummary {
            id: self.id.clone(),
            snippet: self.snippet.clone(),
            subject: self.payload.header("Subject").map(str::to_string),
            date: self.payload.header("Date").map(str::to_string),
        }
    }

    fn content(&self) -> Result<MessageContent, ClipError> {
        let date = self.payload.header("Date").map(str::to_string);
        let html = match self.payload.find_html() {
            Some(data) => decode_base64url(data)?,
            None => {
                debug!("Message {} has no text/html part", self.id);
                String::new()
            }
        };
        Ok(MessageContent { html, date })
    }
}

/// Decode a base64url string as UTF-8 text. Padding is optional.
pub fn decode_base64url(data: &str) -> Result<String, ClipError> {
    let trimmed = data.trim().trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| ClipError::InboxFailed {
            detail: format!("message body is not base64url: {}", e),
        })?;
    String::from_utf8(bytes).map_err(|_| ClipError::InboxFailed {
        detail: "message body is not valid UTF-8".to_string(),
    })
}

// ── Client ───────────────────────────────────────────────────────────────

/// Gmail REST client authenticated with a bearer token.
#[derive(Clone)]
pub struct GmailInbox {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl std::fmt::Debug for GmailInbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmailInbox")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl GmailInbox {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            base_url: GMAIL_API_BASE.to_string(),
        }
    }

    /// Read the access token from a file, ignoring surrounding whitespace.
    pub fn from_token_file(path: impl AsRef<Path>) -> Result<Self, ClipError> {
        let path = path.as_ref();
        let token = std::fs::read_to_string(path).map_err(|e| ClipError::MissingToken {
            hint: format!("cannot read {}: {}", path.display(), e),
        })?;
        let token = token.trim();
        if token.is_empty() {
            return Err(ClipError::MissingToken {
                hint: format!("{} is empty", path.display()),
            });
        }
        Ok(Self::new(token))
    }

    /// Point at a different API root (a proxy or a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClipError> {
        let url = format!("{}/{}", self.base_url, path);
        let failed = |detail: String| ClipError::InboxFailed { detail };

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {} from {}", response.status(), url)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| failed(format!("unexpected response from {}: {}", url, e)))
    }

    async fn list_inner(&self, sender: &str) -> Result<Vec<MessageSummary>, ClipError> {
        let q = format!("from:{}", sender);
        let max = MAX_LIST_RESULTS.to_string();
        let list: ListResponse = self
            .get_json("messages", &[("q", q.as_str()), ("maxResults", max.as_str())])
            .await?;

        info!("Found {} messages from {}", list.messages.len(), sender);

        let mut summaries = Vec::with_capacity(list.messages.len());
        for m in &list.messages {
            let msg: GmailMessage = self
                .get_json(
                    &format!("messages/{}", m.id),
                    &[
                        ("format", "metadata"),
                        ("metadataHeaders", "Date"),
                        ("metadataHeaders", "Subject"),
                    ],
                )
                .await?;
            summaries.push(msg.summary());
        }
        Ok(summaries)
    }

    async fn fetch_inner(&self, id: &str) -> Result<MessageContent, ClipError> {
        let msg: GmailMessage = self
            .get_json(&format!("messages/{}", id), &[("format", "full")])
            .await?;
        let content = msg.content()?;
        debug!("Fetched message {} ({} bytes of HTML)", id, content.html.len());
        Ok(content)
    }
}

impl Inbox for GmailInbox {
    fn list_messages<'a>(
        &'a self,
        sender: &'a str,
    ) -> BoxFuture<'a, Result<Vec<MessageSummary>, ClipError>> {
        Box::pin(self.list_inner(sender))
    }

    fn fetch_message<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<MessageContent, ClipError>> {
        Box::pin(self.fetch_inner(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE;
    use std::io::Write;

    #[test]
    fn decodes_without_padding() {
        // "hi?" → "aGk_" (url-safe, no padding needed); "hi" → "aGk" unpadded
        assert_eq!(decode_base64url("aGk").unwrap(), "hi");
        assert_eq!(decode_base64url("aGk=").unwrap(), "hi");
        assert_eq!(decode_base64url("aGk_").unwrap(), "hi?");
    }

    #[test]
    fn decodes_html_round() {
        let html = "<html><body><p>Caf\u{e9}</p></body></html>";
        let encoded = URL_SAFE.encode(html);
        assert_eq!(decode_base64url(&encoded).unwrap(), html);
    }

    #[test]
    fn bad_base64_is_inbox_error() {
        assert!(matches!(
            decode_base64url("***"),
            Err(ClipError::InboxFailed { .. })
        ));
    }

    fn message(json: serde_json::Value) -> GmailMessage {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn finds_nested_html_part() {
        let body = URL_SAFE_NO_PAD.encode("<p>x</p>");
        let msg = message(serde_json::json!({
            "id": "m1",
            "snippet": "Today",
            "payload": {
                "mimeType": "multipart/mixed",
                "headers": [{"name": "Date", "value": "Mon, 01 Jan 2024 10:00:00 +0000"}],
                "parts": [
                    {"mimeType": "multipart/alternative", "parts": [
                        {"mimeType": "text/plain", "body": {"data": "eA"}},
                        {"mimeType": "text/html", "body": {"data": body}}
                    ]},
                    {"mimeType": "text/html", "body": {"data": "ignored"}}
                ]
            }
        }));
        let content = msg.content().unwrap();
        assert_eq!(content.html, "<p>x</p>");
        assert_eq!(content.date.as_deref(), Some("Mon, 01 Jan 2024 10:00:00 +0000"));
    }

    #[test]
    fn no_html_part_gives_empty_body() {
        let msg = message(serde_json::json!({
            "id": "m2",
            "payload": {"mimeType": "text/plain", "body": {"data": "eA"}}
        }));
        let content = msg.content().unwrap();
        assert_eq!(content.html, "");
        assert!(content.date.is_none());
    }

    #[test]
    fn summary_reads_headers() {
        let msg = message(serde_json::json!({
            "id": "m3",
            "snippet": "Markets",
            "payload": {"headers": [
                {"name": "Subject", "value": "The Daily Shot"},
                {"name": "Date", "value": "Tue, 02 Jan 2024 09:00:00 +0000"}
            ]}
        }));
        let s = msg.summary();
        assert_eq!(s.id, "m3");
        assert_eq!(s.snippet, "Markets");
        assert_eq!(s.subject.as_deref(), Some("The Daily Shot"));
        assert_eq!(s.date.as_deref(), Some("Tue, 02 Jan 2024 09:00:00 +0000"));
    }

    #[test]
    fn token_file_is_trimmed() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "  ya29.token  ").unwrap();
        let inbox = GmailInbox::from_token_file(f.path()).unwrap();
        assert_eq!(inbox.token, "ya29.token");
        assert!(!format!("{:?}", inbox).contains("ya29"));
    }

    #[test]
    fn empty_or_missing_token_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            GmailInbox::from_token_file(f.path()),
            Err(ClipError::MissingToken { .. })
        ));
        assert!(matches!(
            GmailInbox::from_token_file("/no/such/token"),
            Err(ClipError::MissingToken { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_api_is_inbox_error() {
        let inbox = GmailInbox::new("t").with_base_url("http://127.0.0.1:1/");
        let err = inbox.list_messages(DEFAULT_SENDER).await.unwrap_err();
        assert!(matches!(err, ClipError::InboxFailed { .. }));
    }
}
