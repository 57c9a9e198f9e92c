//! Markup extraction: HTML text → ordered [`Element`] sequence.
//!
//! The body is walked depth-first in pre-order, which matches the order a
//! browser renders content in. Every descendant node of the body consumes one
//! traversal index whether or not it produces an element, so indices are
//! stable identifiers for a given markup and filter.
//!
//! ## Why look for `<body` in the source?
//!
//! html5ever always synthesises `<html>`, `<head>` and `<body>`, so the parsed
//! tree can never tell us the body was missing. Fragments without a body tag
//! are almost always the wrong input (a forwarded snippet, a plain-text part),
//! so they are rejected with [`ClipError::NoBody`] up front.
//!
//! The check is a plain pattern match on the source text, not a parse. A
//! `<body>` that appears only inside a comment, a script string or an
//! attribute value still counts, so `<!-- <body> --><p>x</p>` is accepted and
//! parsed with a synthesised body.

use crate::config::{ExtractConfig, PreFilter};
use crate::element::Element;
use crate::error::ClipError;
use crate::pipeline::prefilter;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

static RE_BODY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<body[\s>/]").unwrap());

static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// Containers whose text is code or styling, never content.
const SKIPPED_PARENTS: [&str; 2] = ["script", "style"];

/// Extract images and text fragments from `html` in document order.
///
/// Text elements are not deduplicated here; see
/// [`crate::pipeline::dedupe::remove_duplicate_text`].
///
/// # Errors
/// [`ClipError::NoBody`] when the (filtered) markup has no `<body>` tag.
pub fn extract_elements(html: &str, config: &ExtractConfig) -> Result<Vec<Element>, ClipError> {
    let filtered = prefilter::apply_raw(html, &config.prefilter);

    if !RE_BODY_TAG.is_match(&filtered) {
        return Err(ClipError::NoBody);
    }

    let document = Html::parse_document(&filtered);
    let body = document.select(&BODY).next().ok_or(ClipError::NoBody)?;

    if let PreFilter::TruncateBefore { sentinel } = &config.prefilter {
        let body_html = body.html();
        if let Some(rest) = prefilter::truncate_before(&body_html, sentinel) {
            let trimmed = Html::parse_document(rest);
            let trimmed_body = trimmed.select(&BODY).next().ok_or(ClipError::NoBody)?;
            return Ok(walk_body(trimmed_body));
        }
        debug!("Sentinel {:?} not found; keeping the whole body", sentinel);
    }

    Ok(walk_body(body))
}

/// Emit elements for every descendant of `body` (the body itself excluded).
fn walk_body(body: ElementRef<'_>) -> Vec<Element> {
    let mut elements = Vec::new();

    for (index, node) in body.descendants().skip(1).enumerate() {
        match node.value() {
            Node::Comment(_) => continue,
            Node::Element(el) if el.name() == "img" => match el.attr("src") {
                Some(src) => elements.push(Element::Image {
                    src: src.to_string(),
                    index,
                }),
                None => debug!("Skipping <img> without src at node {}", index),
            },
            Node::Text(text) => {
                let stripped = text.trim();
                let parent = node
                    .parent()
                    .and_then(|p| p.value().as_element().map(|e| e.name()));
                if !stripped.is_empty() && !parent.is_some_and(is_skipped_container) {
                    elements.push(Element::Text {
                        text: stripped.to_string(),
                        index,
                    });
                }
            }
            _ => {}
        }
    }

    let images = elements.iter().filter(|e| e.is_image()).count();
    info!(
        "Extracted {} elements ({} images, {} text)",
        elements.len(),
        images,
        elements.len() - images
    );
    elements
}

fn is_skipped_container(name: &str) -> bool {
    SKIPPED_PARENTS.contains(&name)
}
