//! Boilerplate removal applied around extraction.
//!
//! [`PreFilter::StripBetween`] works on the raw markup before parsing;
//! [`PreFilter::TruncateBefore`] works on the serialised body after parsing,
//! so it is applied from [`crate::pipeline::extract`]. Both only ever look at
//! the first occurrence of their markers.

use crate::config::PreFilter;
use regex::Regex;
use std::borrow::Cow;
use tracing::debug;

/// Apply the pre-parse part of `filter` to raw markup.
///
/// Only [`PreFilter::StripBetween`] acts here; the other variants return the
/// input unchanged.
pub fn apply_raw<'a>(html: &'a str, filter: &PreFilter) -> Cow<'a, str> {
    match filter {
        PreFilter::StripBetween { start, end } => strip_between(html, start, end),
        PreFilter::None | PreFilter::TruncateBefore { .. } => Cow::Borrowed(html),
    }
}

/// Remove the first `start` … `end` span, markers included.
///
/// The match is non-greedy and spans newlines, so the span ends at the first
/// `end` after `start`. Markup without both markers is returned as-is.
pub fn strip_between<'a>(html: &'a str, start: &str, end: &str) -> Cow<'a, str> {
    if start.is_empty() || end.is_empty() {
        return Cow::Borrowed(html);
    }
    let pattern = format!("(?s){}.*?{}", regex::escape(start), regex::escape(end));
    // Escaped literals around `.*?` always form a valid pattern.
    let Ok(re) = Regex::new(&pattern) else {
        return Cow::Borrowed(html);
    };
    let out = re.replacen(html, 1, "");
    if let Cow::Owned(ref s) = out {
        debug!(
            "Stripped {} bytes between {:?} and {:?}",
            html.len() - s.len(),
            start,
            end
        );
    }
    out
}

/// Keep `body_html` from the first `sentinel` onward.
///
/// Returns None when the sentinel does not occur, meaning the original body
/// should be used.
pub fn truncate_before<'a>(body_html: &'a str, sentinel: &str) -> Option<&'a str> {
    if sentinel.is_empty() {
        return None;
    }
    body_html.find(sentinel).map(|at| {
        debug!("Truncating {} bytes before {:?}", at, sentinel);
        &body_html[at..]
    })
}
