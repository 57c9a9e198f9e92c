//! Page layout: wrap text, fit images and position everything on fixed-size
//! pages.
//!
//! Layout is pure arithmetic over a [`PageGeometry`]; it never touches the
//! PDF library. [`crate::pipeline::render`] turns the resulting
//! [`PageLayout`]s into PDF operations. Coordinates are PDF points with the
//! origin at the bottom-left corner of the page.
//!
//! ## Vertical cursor
//!
//! A selection page is drawn top-down from `height - margin`: text lines,
//! then the image, then the note. Nothing flows onto a following page; a
//! page whose content is taller than the page simply runs off the bottom.

use crate::pipeline::metrics::Font;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Share of the page height the text, image and note may use together.
pub const CONTENT_HEIGHT_RATIO: f32 = 0.8;

/// Space left under a placed image before the note starts.
pub const IMAGE_GAP: f32 = 20.0;

/// Offset of the title above (and the date below) the page centre.
pub const TITLE_OFFSET: f32 = 20.0;

/// Physical page: size and the margin on every side, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Default for PageGeometry {
    /// A4 with 50 pt margins.
    fn default() -> Self {
        Self {
            width: 595.2756,
            height: 841.8898,
            margin: 50.0,
        }
    }
}

impl PageGeometry {
    /// Widest a line or an image may be.
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Height left for the image once text and note are accounted for.
    pub fn available_image_height(&self, text_height: f32, note_height: f32) -> f32 {
        self.height * CONTENT_HEIGHT_RATIO - text_height - note_height - self.margin
    }
}

/// Font, size and line advance for one kind of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: Font,
    pub size: f32,
    pub leading: f32,
}

pub const BODY_STYLE: TextStyle = TextStyle {
    font: Font::Helvetica,
    size: 12.0,
    leading: 15.0,
};

pub const NOTE_STYLE: TextStyle = TextStyle {
    font: Font::Helvetica,
    size: 10.0,
    leading: 12.0,
};

pub const TITLE_STYLE: TextStyle = TextStyle {
    font: Font::HelveticaBold,
    size: 36.0,
    leading: 36.0,
};

pub const DATE_STYLE: TextStyle = TextStyle {
    font: Font::Helvetica,
    size: 18.0,
    leading: 18.0,
};

/// Something drawn at a fixed position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlacedItem {
    /// One line of text; `y` is the baseline.
    Text {
        text: String,
        font: Font,
        size: f32,
        x: f32,
        y: f32,
    },
    /// An image; `y` is the bottom edge.
    Image {
        src: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageKind {
    Title,
    /// 1-indexed selection number.
    Selection(usize),
}

/// One page worth of positioned items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub kind: PageKind,
    pub items: Vec<PlacedItem>,
}

impl PageLayout {
    /// The placed image, if any.
    pub fn image(&self) -> Option<&PlacedItem> {
        self.items
            .iter()
            .find(|i| matches!(i, PlacedItem::Image { .. }))
    }

    /// Text of every line on the page, top to bottom.
    pub fn text_lines(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|i| match i {
                PlacedItem::Text { text, .. } => Some(text.as_str()),
                PlacedItem::Image { .. } => None,
            })
            .collect()
    }
}

/// Final size of an image on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedSize {
    pub width: f32,
    pub height: f32,
}

// ── Text wrapping ────────────────────────────────────────────────────────

/// Split `text` into lines no wider than `max_width` points.
///
/// Explicit newlines always break. Within a line, words (runs of
/// non-whitespace) are packed greedily with single spaces. A word wider than
/// `max_width` gets a line of its own rather than being cut. Lines without
/// words produce nothing, so blank separators do not take up space.
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let space = font.string_width(" ", size);
    let mut lines = Vec::new();

    for raw_line in text.split('\n') {
        let mut current: Vec<&str> = Vec::new();
        let mut width = -space;

        for word in raw_line.split_whitespace() {
            let word_width = font.string_width(word, size);
            if current.is_empty() || width + space + word_width <= max_width {
                current.push(word);
                width += space + word_width;
            } else {
                lines.push(current.join(" "));
                current = vec![word];
                width = word_width;
            }
        }

        if !current.is_empty() {
            lines.push(current.join(" "));
        }
    }

    lines
}

// ── Image fitting ────────────────────────────────────────────────────────

/// Scale a `width` × `height` pixel image into `max_width` × `max_height`
/// points, preserving the aspect ratio. Images are never enlarged.
///
/// Landscape images are fitted to the width first, then shrunk further if
/// still too tall; portrait and square images the other way round.
///
/// Returns None if the image has no pixels or there is no room at all.
pub fn fit_image(width: u32, height: u32, max_width: f32, max_height: f32) -> Option<FittedSize> {
    if width == 0 || height == 0 || max_width <= 0.0 || max_height <= 0.0 {
        return None;
    }

    let (w, h) = (width as f32, height as f32);
    let aspect = w / h;

    let (fw, fh) = if aspect > 1.0 {
        let mut fw = max_width.min(w);
        let mut fh = fw / aspect;
        if fh > max_height {
            fh = max_height;
            fw = max_height * aspect;
        }
        (fw, fh)
    } else {
        let mut fh = max_height.min(h);
        let mut fw = fh * aspect;
        if fw > max_width {
            fw = max_width;
            fh = max_width / aspect;
        }
        (fw, fh)
    };

    Some(FittedSize {
        width: fw,
        height: fh,
    })
}

// ── Pages ────────────────────────────────────────────────────────────────

/// The first page: title and date, both centred.
pub fn layout_title_page(geometry: &PageGeometry, title: &str, date_line: &str) -> PageLayout {
    let centre_y = geometry.height / 2.0;
    let items = vec![
        centred_line(geometry, title, TITLE_STYLE, centre_y + TITLE_OFFSET),
        centred_line(geometry, date_line, DATE_STYLE, centre_y - TITLE_OFFSET),
    ];
    PageLayout {
        kind: PageKind::Title,
        items,
    }
}

fn centred_line(geometry: &PageGeometry, text: &str, style: TextStyle, y: f32) -> PlacedItem {
    let width = style.font.string_width(text, style.size);
    PlacedItem::Text {
        text: text.to_string(),
        font: style.font,
        size: style.size,
        x: (geometry.width - width) / 2.0,
        y,
    }
}

/// Wrapped text and note for one selection, measured before the image is
/// known so the available image height can be computed.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionBlocks {
    pub text_lines: Vec<String>,
    pub note_lines: Vec<String>,
}

impl SelectionBlocks {
    pub fn wrap(geometry: &PageGeometry, text: &str, note: &str) -> Self {
        let width = geometry.content_width();
        Self {
            text_lines: wrap_text(text, BODY_STYLE.font, BODY_STYLE.size, width),
            note_lines: wrap_text(note, NOTE_STYLE.font, NOTE_STYLE.size, width),
        }
    }

    pub fn text_height(&self) -> f32 {
        self.text_lines.len() as f32 * BODY_STYLE.leading
    }

    pub fn note_height(&self) -> f32 {
        self.note_lines.len() as f32 * NOTE_STYLE.leading
    }

    pub fn available_image_height(&self, geometry: &PageGeometry) -> f32 {
        geometry.available_image_height(self.text_height(), self.note_height())
    }
}

/// Lay out one selection page.
///
/// `image` is the source URL and pixel size of the fetched image, or None if
/// it could not be fetched; the text and note are placed either way.
pub fn layout_selection_page(
    geometry: &PageGeometry,
    page_num: usize,
    blocks: &SelectionBlocks,
    image: Option<(&str, u32, u32)>,
) -> PageLayout {
    let mut items = Vec::with_capacity(blocks.text_lines.len() + blocks.note_lines.len() + 1);
    let mut y = geometry.height - geometry.margin;

    for line in &blocks.text_lines {
        items.push(PlacedItem::Text {
            text: line.clone(),
            font: BODY_STYLE.font,
            size: BODY_STYLE.size,
            x: geometry.margin,
            y,
        });
        y -= BODY_STYLE.leading;
    }

    if let Some((src, px_w, px_h)) = image {
        let max_width = geometry.content_width();
        let available = blocks.available_image_height(geometry);
        match fit_image(px_w, px_h, max_width, available) {
            Some(size) => {
                let x = (max_width - size.width) / 2.0 + geometry.margin;
                items.push(PlacedItem::Image {
                    src: src.to_string(),
                    x,
                    y: y - size.height,
                    width: size.width,
                    height: size.height,
                });
                debug!(
                    "Page {}: image {}x{} px → {:.1}x{:.1} pt",
                    page_num, px_w, px_h, size.width, size.height
                );
                y -= size.height + IMAGE_GAP;
            }
            None => warn!(
                "Page {}: no room for image {} ({:.1} pt available)",
                page_num, src, available
            ),
        }
    }

    for line in &blocks.note_lines {
        items.push(PlacedItem::Text {
            text: line.clone(),
            font: NOTE_STYLE.font,
            size: NOTE_STYLE.size,
            x: geometry.margin,
            y,
        });
        y -= NOTE_STYLE.leading;
    }

    PageLayout {
        kind: PageKind::Selection(page_num),
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    // ── wrap_text ────────────────────────────────────────────────────────

    #[test]
    fn wrap_short_text_is_one_line() {
        assert_eq!(
            wrap_text("Stocks rose today", Font::Helvetica, 12.0, 495.0),
            vec!["Stocks rose today"]
        );
    }

    #[test]
    fn wrap_respects_width() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(20);
        let lines = wrap_text(&text, Font::Helvetica, 12.0, 200.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(Font::Helvetica.string_width(line, 12.0) <= 200.0, "too wide: {line}");
        }
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn wrap_keeps_overlong_word_whole() {
        let word = "x".repeat(200);
        let lines = wrap_text(&format!("a {word} b"), Font::Helvetica, 12.0, 100.0);
        assert_eq!(lines, vec!["a".to_string(), word, "b".to_string()]);
    }

    #[test]
    fn wrap_breaks_on_newlines_and_drops_blank_lines() {
        let lines = wrap_text("first\n\nsecond", Font::Helvetica, 12.0, 495.0);
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn wrap_empty_is_empty() {
        assert!(wrap_text("", Font::Helvetica, 10.0, 495.0).is_empty());
        assert!(wrap_text("   \n  ", Font::Helvetica, 10.0, 495.0).is_empty());
    }

    // ── fit_image ────────────────────────────────────────────────────────

    #[test]
    fn landscape_fits_width_then_height() {
        let s = fit_image(800, 400, 700.0, 300.0).unwrap();
        assert!(s.width <= 700.0 + EPS && s.height <= 300.0 + EPS);
        assert!(close(s.height, 300.0));
        assert!(close(s.width, 600.0));
        assert!(close(s.width / s.height, 2.0));
    }

    #[test]
    fn landscape_limited_by_width_only() {
        let s = fit_image(1400, 400, 700.0, 300.0).unwrap();
        assert!(close(s.width, 700.0));
        assert!(close(s.height, 200.0));
    }

    #[test]
    fn portrait_fits_height_first() {
        let s = fit_image(400, 800, 700.0, 300.0).unwrap();
        assert!(close(s.height, 300.0));
        assert!(close(s.width, 150.0));
    }

    #[test]
    fn portrait_refits_to_width_when_needed() {
        // Nearly square but portrait: height-first gives width > max.
        let s = fit_image(990, 1000, 100.0, 500.0).unwrap();
        assert!(close(s.width, 100.0));
        assert!(close(s.height, 100.0 / 0.99));
    }

    #[test]
    fn small_images_are_not_enlarged() {
        let s = fit_image(120, 60, 700.0, 300.0).unwrap();
        assert!(close(s.width, 120.0) && close(s.height, 60.0));
        let s = fit_image(50, 80, 700.0, 300.0).unwrap();
        assert!(close(s.width, 50.0) && close(s.height, 80.0));
    }

    #[test]
    fn no_room_means_no_image() {
        assert!(fit_image(100, 100, 495.0, -10.0).is_none());
        assert!(fit_image(0, 100, 495.0, 300.0).is_none());
    }

    // ── pages ────────────────────────────────────────────────────────────

    #[test]
    fn title_page_is_centred() {
        let g = PageGeometry::default();
        let page = layout_title_page(&g, "CLIFTON FIRST DATA", "January 01, 2024");
        assert_eq!(page.kind, PageKind::Title);
        assert_eq!(page.text_lines(), vec!["CLIFTON FIRST DATA", "January 01, 2024"]);
        match &page.items[0] {
            PlacedItem::Text { text, font, size, x, y } => {
                let w = font.string_width(text, *size);
                assert!(close(*x + w / 2.0, g.width / 2.0));
                assert!(close(*y, g.height / 2.0 + 20.0));
                assert_eq!(*font, Font::HelveticaBold);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &page.items[1] {
            PlacedItem::Text { y, size, .. } => {
                assert!(close(*y, g.height / 2.0 - 20.0));
                assert!(close(*size, 18.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn selection_page_cursor_bookkeeping() {
        let g = PageGeometry::default();
        let blocks = SelectionBlocks::wrap(&g, "Headline", "my note");
        let page = layout_selection_page(&g, 1, &blocks, Some(("u", 800, 400)));

        let top = g.height - g.margin;
        let available = g.height * 0.8 - 15.0 - 12.0 - 50.0;

        match &page.items[..] {
            [PlacedItem::Text { y: ty, .. }, PlacedItem::Image { x, y, width, height, .. }, PlacedItem::Text { y: ny, size, .. }] =>
            {
                assert!(close(*ty, top));
                // Width-bound: 800 px is wider than the content area.
                assert!(available > 400.0);
                assert!(close(*width, 800.0f32.min(g.content_width())));
                assert!(close(*width / *height, 2.0));
                assert!(close(*x, (g.content_width() - *width) / 2.0 + g.margin));
                assert!(close(*y, top - 15.0 - *height));
                assert!(close(*ny, top - 15.0 - *height - IMAGE_GAP));
                assert!(close(*size, 10.0));
            }
            other => panic!("unexpected layout {other:?}"),
        }
    }

    #[test]
    fn missing_image_keeps_text_and_note() {
        let g = PageGeometry::default();
        let blocks = SelectionBlocks::wrap(&g, "Some text", "a note");
        let page = layout_selection_page(&g, 2, &blocks, None);
        assert!(page.image().is_none());
        assert_eq!(page.text_lines(), vec!["Some text", "a note"]);
        match &page.items[1] {
            PlacedItem::Text { y, .. } => assert!(close(*y, g.height - g.margin - 15.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn image_is_centred_horizontally() {
        let g = PageGeometry::default();
        let blocks = SelectionBlocks::wrap(&g, "", "");
        let page = layout_selection_page(&g, 1, &blocks, Some(("u", 400, 800)));
        match page.image() {
            Some(PlacedItem::Image { x, width, .. }) => {
                let left = *x - g.margin;
                let right = g.width - g.margin - (*x + *width);
                assert!(close(left, right));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
