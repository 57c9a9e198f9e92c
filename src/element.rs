//! Extracted content units and the user's choices over them.

use serde::{Deserialize, Serialize};

/// One unit of newsletter content, tagged with its document-order position.
///
/// `index` is the node's position in a pre-order walk of the body, so it is
/// strictly increasing along an extracted sequence but not contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Element {
    /// An `<img>` tag and its `src` locator.
    Image { src: String, index: usize },
    /// A stripped, non-empty text node.
    Text { text: String, index: usize },
}

impl Element {
    pub fn index(&self) -> usize {
        match self {
            Element::Image { index, .. } | Element::Text { index, .. } => *index,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Element::Image { .. })
    }

    /// The text payload, or None for images.
    pub fn text(&self) -> Option<&str> {
        match self {
            Element::Text { text, .. } => Some(text),
            Element::Image { .. } => None,
        }
    }

    /// The image locator, or None for text.
    pub fn image_src(&self) -> Option<&str> {
        match self {
            Element::Image { src, .. } => Some(src),
            Element::Text { .. } => None,
        }
    }
}

/// A caller's decision to include one image, with its annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Traversal index of the chosen [`Element::Image`].
    pub index: usize,
    /// Free text printed under the image. May be empty.
    #[serde(default)]
    pub note: String,
}

impl Selection {
    pub fn new(index: usize, note: impl Into<String>) -> Self {
        Self {
            index,
            note: note.into(),
        }
    }
}

/// Everything one document page needs: the image, the text that led up to
/// it, and the user's note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionTriple {
    pub image_src: String,
    /// Text fragments since the previous image, joined by blank lines.
    pub text: String,
    pub note: String,
}

impl SelectionTriple {
    pub fn new(
        image_src: impl Into<String>,
        text: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            image_src: image_src.into(),
            text: text.into(),
            note: note.into(),
        }
    }
}
