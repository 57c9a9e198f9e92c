//! Deduplication: newsletters repeat headlines in previews, tables of
//! contents and footers. Only the first occurrence of a text payload is kept.

use crate::element::Element;
use std::collections::HashSet;
use tracing::debug;

/// Drop every Text element whose payload exactly equals an earlier one.
///
/// Images are always kept, duplicated or not. Relative order is preserved.
/// Matching is byte-exact: no case folding or whitespace normalisation.
pub fn remove_duplicate_text(elements: Vec<Element>) -> Vec<Element> {
    let before = elements.len();

    // Decide with borrowed payloads first, then move the survivors out.
    let keep: Vec<bool> = {
        let mut seen: HashSet<&str> = HashSet::new();
        elements
            .iter()
            .map(|el| match el {
                Element::Text { text, .. } => seen.insert(text.as_str()),
                Element::Image { .. } => true,
            })
            .collect()
    };

    let unique: Vec<Element> = elements
        .into_iter()
        .zip(keep)
        .filter_map(|(el, keep)| keep.then_some(el))
        .collect();

    debug!("Removed {} duplicate text fragments", before - unique.len());
    unique
}
