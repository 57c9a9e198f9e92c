//! Selection: turn the extracted element list plus the caller's choices into
//! [`SelectionTriple`]s.
//!
//! The caller owns all UI state (which boxes are ticked, what was typed into
//! each note field) and hands it over as a plain list of [`Selection`]s.

use crate::element::{Element, Selection, SelectionTriple};
use crate::error::ClipError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Separator between text fragments gathered for one image.
pub const TEXT_JOINER: &str = "\n\n";

/// An image as a selection UI would present it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCandidate {
    pub index: usize,
    pub src: String,
    /// Text since the previous image, joined by [`TEXT_JOINER`].
    pub text: String,
}

/// List every image with the text block that precedes it.
pub fn image_candidates(elements: &[Element]) -> Vec<ImageCandidate> {
    let mut candidates = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for el in elements {
        match el {
            Element::Text { text, .. } => pending.push(text),
            Element::Image { src, index } => {
                candidates.push(ImageCandidate {
                    index: *index,
                    src: src.clone(),
                    text: pending.join(TEXT_JOINER),
                });
                pending.clear();
            }
        }
    }

    candidates
}

/// Build one triple per selected image, in document order.
///
/// Text accumulates from the previous image (selected or not) up to the
/// selected one. If the same index is selected twice, the last note wins.
///
/// # Errors
/// [`ClipError::UnknownSelection`] if a selection's index is not the index of
/// an image element in `elements`.
pub fn selection_triples(
    elements: &[Element],
    selections: &[Selection],
) -> Result<Vec<SelectionTriple>, ClipError> {
    let candidates = image_candidates(elements);

    let notes: HashMap<usize, &str> = selections
        .iter()
        .map(|s| (s.index, s.note.as_str()))
        .collect();

    for s in selections {
        if !candidates.iter().any(|c| c.index == s.index) {
            return Err(ClipError::UnknownSelection { index: s.index });
        }
    }

    let triples: Vec<SelectionTriple> = candidates
        .into_iter()
        .filter_map(|c| {
            notes
                .get(&c.index)
                .map(|note| SelectionTriple::new(c.src, c.text, *note))
        })
        .collect();

    debug!("Built {} selection triples", triples.len());
    Ok(triples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Element> {
        vec![
            Element::Text {
                text: "Intro".into(),
                index: 1,
            },
            Element::Text {
                text: "Equities rallied.".into(),
                index: 3,
            },
            Element::Image {
                src: "https://cdn/1.png".into(),
                index: 4,
            },
            Element::Text {
                text: "Bonds slipped.".into(),
                index: 6,
            },
            Element::Image {
                src: "https://cdn/2.png".into(),
                index: 7,
            },
            Element::Image {
                src: "https://cdn/3.png".into(),
                index: 8,
            },
        ]
    }

    #[test]
    fn candidates_carry_preceding_text() {
        let c = image_candidates(&sample());
        assert_eq!(c.len(), 3);
        assert_eq!(c[0].text, "Intro\n\nEquities rallied.");
        assert_eq!(c[1].text, "Bonds slipped.");
        assert_eq!(c[2].text, "");
    }

    #[test]
    fn accumulator_resets_at_unselected_images() {
        let triples = selection_triples(&sample(), &[Selection::new(7, "rates")]).unwrap();
        assert_eq!(
            triples,
            vec![SelectionTriple::new("https://cdn/2.png", "Bonds slipped.", "rates")]
        );
    }

    #[test]
    fn triples_follow_document_order() {
        let triples = selection_triples(
            &sample(),
            &[Selection::new(8, "last"), Selection::new(4, "first")],
        )
        .unwrap();
        let srcs: Vec<_> = triples.iter().map(|t| t.image_src.as_str()).collect();
        assert_eq!(srcs, vec!["https://cdn/1.png", "https://cdn/3.png"]);
        assert_eq!(triples[0].note, "first");
    }

    #[test]
    fn selecting_text_index_is_rejected() {
        let err = selection_triples(&sample(), &[Selection::new(3, "")]).unwrap_err();
        assert!(matches!(err, ClipError::UnknownSelection { index: 3 }));
    }

    #[test]
    fn empty_selection_yields_no_triples() {
        assert!(selection_triples(&sample(), &[]).unwrap().is_empty());
    }
}
