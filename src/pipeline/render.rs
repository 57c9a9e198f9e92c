//! PDF serialisation: positioned pages → PDF bytes via `printpdf`.
//!
//! ## Why spawn_blocking?
//!
//! Embedding images means compressing every pixel buffer, which for a dozen
//! full-width charts is tens of megabytes of deflate work. Running it on the
//! blocking pool keeps the Tokio workers free for the next fetch.
//!
//! Text is drawn with the Helvetica faces bundled with `printpdf`, embedded
//! as font programs and addressed by glyph id, so curly quotes, dashes and
//! accented letters survive. [`crate::pipeline::metrics`] measures with the
//! same faces.

use crate::error::ClipError;
use crate::pipeline::layout::{PageGeometry, PageLayout, PlacedItem};
use crate::pipeline::metrics::Font;
use printpdf::{
    FontId, Mm, Op, PdfDocument, PdfFontHandle, PdfPage, PdfSaveOptions, Point, Pt, RawImage,
    TextItem, XObjectId, XObjectTransform,
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Images are placed at 72 DPI so one pixel is one point before scaling.
const PLACEMENT_DPI: f32 = 72.0;

/// Serialise `pages` on the blocking pool.
///
/// `images` maps each image locator to its pixels; an image item whose
/// locator is missing from the map is skipped.
pub async fn render_pdf(
    title: String,
    geometry: PageGeometry,
    pages: Vec<PageLayout>,
    images: HashMap<String, RawImage>,
) -> Result<Vec<u8>, ClipError> {
    tokio::task::spawn_blocking(move || render_pdf_blocking(&title, &geometry, &pages, &images))
        .await
        .map_err(|e| ClipError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of [`render_pdf`].
pub fn render_pdf_blocking(
    title: &str,
    geometry: &PageGeometry,
    pages: &[PageLayout],
    images: &HashMap<String, RawImage>,
) -> Result<Vec<u8>, ClipError> {
    let mut doc = PdfDocument::new(title);

    // Embed each face that some page draws with, once.
    let mut fonts: HashMap<Font, FontId> = HashMap::new();
    for page in pages {
        for item in &page.items {
            if let PlacedItem::Text { font, .. } = item {
                if fonts.contains_key(font) {
                    continue;
                }
                let parsed = font.parsed_font().ok_or_else(|| {
                    ClipError::Internal(format!("Bundled {:?} face failed to parse", font))
                })?;
                fonts.insert(*font, doc.add_font(&parsed));
            }
        }
    }

    // One XObject per distinct locator, shared by every page that uses it.
    let mut xobjects: HashMap<&str, (XObjectId, usize, usize)> = HashMap::new();
    for page in pages {
        for item in &page.items {
            if let PlacedItem::Image { src, .. } = item {
                if xobjects.contains_key(src.as_str()) {
                    continue;
                }
                if let Some(raw) = images.get(src) {
                    let id = doc.add_image(raw);
                    xobjects.insert(src.as_str(), (id, raw.width, raw.height));
                }
            }
        }
    }

    let pdf_pages: Vec<PdfPage> = pages
        .iter()
        .map(|page| {
            let ops = page_ops(page, &fonts, &xobjects);
            PdfPage::new(to_mm(geometry.width), to_mm(geometry.height), ops)
        })
        .collect();

    let mut warnings = Vec::new();
    let bytes = doc
        .with_pages(pdf_pages)
        .save(&PdfSaveOptions::default(), &mut warnings);

    debug!(
        "Serialised {} pages, {} fonts, {} images → {} bytes ({} warnings)",
        pages.len(),
        fonts.len(),
        xobjects.len(),
        bytes.len(),
        warnings.len()
    );
    Ok(bytes)
}

fn page_ops(
    page: &PageLayout,
    fonts: &HashMap<Font, FontId>,
    xobjects: &HashMap<&str, (XObjectId, usize, usize)>,
) -> Vec<Op> {
    let mut ops = Vec::new();

    for item in &page.items {
        match item {
            PlacedItem::Text {
                text,
                font,
                size,
                x,
                y,
            } => {
                let Some(font_id) = fonts.get(font) else {
                    warn!("{:?} is not embedded; leaving out {:?}", font, text);
                    continue;
                };
                ops.push(Op::StartTextSection);
                ops.push(Op::SetFont {
                    font: PdfFontHandle::External(font_id.clone()),
                    size: Pt(*size),
                });
                ops.push(Op::SetTextCursor {
                    pos: Point { x: Pt(*x), y: Pt(*y) },
                });
                ops.push(Op::ShowText {
                    items: vec![TextItem::Text(text.clone())],
                });
                ops.push(Op::EndTextSection);
            }
            PlacedItem::Image {
                src,
                x,
                y,
                width,
                height,
            } => {
                let Some((id, px_w, px_h)) = xobjects.get(src.as_str()) else {
                    warn!("No pixels for placed image {}; leaving it out", src);
                    continue;
                };
                ops.push(Op::UseXobject {
                    id: id.clone(),
                    transform: XObjectTransform {
                        translate_x: Some(Pt(*x)),
                        translate_y: Some(Pt(*y)),
                        rotate: None,
                        scale_x: Some(*width / *px_w as f32),
                        scale_y: Some(*height / *px_h as f32),
                        dpi: Some(PLACEMENT_DPI),
                    },
                });
            }
        }
    }

    ops
}

fn to_mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::layout::{layout_title_page, PageKind};
    use printpdf::{RawImageData, RawImageFormat};

    fn red_pixels(w: usize, h: usize) -> RawImage {
        RawImage {
            pixels: RawImageData::U8([255u8, 0, 0].repeat(w * h)),
            width: w,
            height: h,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        }
    }

    #[test]
    fn a4_in_millimetres() {
        let g = PageGeometry::default();
        assert!((to_mm(g.width).0 - 210.0).abs() < 0.01);
        assert!((to_mm(g.height).0 - 297.0).abs() < 0.01);
    }

    #[test]
    fn title_page_serialises_to_pdf() {
        let g = PageGeometry::default();
        let pages = vec![layout_title_page(&g, "CLIFTON FIRST DATA", "January 01, 2024")];
        let bytes = render_pdf_blocking("t", &g, &pages, &HashMap::new()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    fn embedded_fonts(doc: &mut PdfDocument) -> HashMap<Font, FontId> {
        [Font::Helvetica, Font::HelveticaBold]
            .into_iter()
            .map(|f| (f, doc.add_font(&f.parsed_font().unwrap())))
            .collect()
    }

    #[test]
    fn text_is_drawn_with_embedded_faces() {
        let g = PageGeometry::default();
        let mut doc = PdfDocument::new("t");
        let fonts = embedded_fonts(&mut doc);
        let page = layout_title_page(&g, "T", "D");
        let ops = page_ops(&page, &fonts, &HashMap::new());
        match &ops[1] {
            Op::SetFont {
                font: PdfFontHandle::External(id),
                size,
            } => {
                assert_eq!(id, &fonts[&Font::HelveticaBold]);
                assert_eq!(*size, Pt(36.0));
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn text_without_an_embedded_face_is_skipped() {
        let g = PageGeometry::default();
        let page = layout_title_page(&g, "T", "D");
        assert!(page_ops(&page, &HashMap::new(), &HashMap::new()).is_empty());
    }

    #[test]
    fn non_ascii_text_is_not_written_as_utf8() {
        let g = PageGeometry::default();
        let line = "It\u{2019}s caf\u{e9} \u{2014} done";
        let page = PageLayout {
            kind: PageKind::Selection(1),
            items: vec![PlacedItem::Text {
                text: line.into(),
                font: Font::Helvetica,
                size: 12.0,
                x: 50.0,
                y: 700.0,
            }],
        };
        let bytes = render_pdf_blocking("t", &g, &[page], &HashMap::new()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let contains = |needle: &[u8]| bytes.windows(needle.len()).any(|w| w == needle);
        // No font is declared WinAnsi and the UTF-8 sequences never reach a
        // content stream, neither raw nor hex-encoded.
        assert!(!contains(b"WinAnsiEncoding"));
        assert!(!contains(line.as_bytes()));
        assert!(!contains(b"E28099"));
        assert!(!contains(b"C3A9"));
    }

    #[test]
    fn image_ops_scale_pixels_to_points() {
        let img = red_pixels(4, 2);
        let mut doc = PdfDocument::new("t");
        let id = doc.add_image(&img);
        let mut xobjects = HashMap::new();
        xobjects.insert("u", (id, 4usize, 2usize));

        let page = PageLayout {
            kind: PageKind::Selection(1),
            items: vec![PlacedItem::Image {
                src: "u".into(),
                x: 10.0,
                y: 20.0,
                width: 200.0,
                height: 100.0,
            }],
        };
        let ops = page_ops(&page, &HashMap::new(), &xobjects);
        match &ops[..] {
            [Op::UseXobject { transform, .. }] => {
                assert_eq!(transform.scale_x, Some(50.0));
                assert_eq!(transform.scale_y, Some(50.0));
                assert_eq!(transform.translate_x, Some(Pt(10.0)));
                assert_eq!(transform.dpi, Some(72.0));
            }
            other => panic!("unexpected ops {other:?}"),
        }
    }

    #[test]
    fn unknown_image_is_skipped() {
        let page = PageLayout {
            kind: PageKind::Selection(1),
            items: vec![PlacedItem::Image {
                src: "missing".into(),
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
            }],
        };
        assert!(page_ops(&page, &HashMap::new(), &HashMap::new()).is_empty());
    }

    #[test]
    fn text_ops_are_wrapped_in_a_text_section() {
        let g = PageGeometry::default();
        let mut doc = PdfDocument::new("t");
        let fonts = embedded_fonts(&mut doc);
        let page = layout_title_page(&g, "T", "D");
        let ops = page_ops(&page, &fonts, &HashMap::new());
        assert_eq!(ops.len(), 10);
        assert!(matches!(ops[0], Op::StartTextSection));
        assert!(matches!(ops[4], Op::EndTextSection));
    }

    #[tokio::test]
    async fn async_render_includes_images() {
        let g = PageGeometry::default();
        let page = PageLayout {
            kind: PageKind::Selection(1),
            items: vec![PlacedItem::Image {
                src: "u".into(),
                x: 50.0,
                y: 400.0,
                width: 40.0,
                height: 20.0,
            }],
        };
        let mut images = HashMap::new();
        images.insert("u".to_string(), red_pixels(4, 2));
        let bytes = render_pdf("t".into(), g, vec![page], images).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
