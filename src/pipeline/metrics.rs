//! Glyph advance widths for the two faces every page is drawn with.
//!
//! Widths are read from the Helvetica faces bundled with `printpdf`, which
//! are also the font programs the renderer embeds, so a wrapped line is
//! measured with the same glyphs that end up on the page.

use once_cell::sync::Lazy;
use printpdf::{BuiltinFont, ParsedFont};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// The fonts the layout draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

/// Advance used for a character the face has no glyph for, in 1/1000 em.
const MISSING_GLYPH_WIDTH: u16 = 556;

/// The bundled faces are subset to Windows-1252, whose highest codepoint is
/// U+2122 (TRADE MARK SIGN).
const LAST_CODEPOINT: u32 = 0x2122;

static HELVETICA: Lazy<GlyphWidths> = Lazy::new(|| GlyphWidths::load(Font::Helvetica));
static HELVETICA_BOLD: Lazy<GlyphWidths> = Lazy::new(|| GlyphWidths::load(Font::HelveticaBold));

/// Per-character advances in 1/1000 em, extracted once from a parsed face.
struct GlyphWidths {
    widths: HashMap<char, u16>,
}

impl GlyphWidths {
    fn load(font: Font) -> Self {
        let Some(parsed) = font.parsed_font() else {
            warn!("Bundled {:?} face failed to parse; using flat glyph widths", font);
            return Self {
                widths: HashMap::new(),
            };
        };

        let units_per_em = match parsed.pdf_font_metrics.units_per_em {
            0 => 1000.0,
            n => n as f32,
        };
        let scale = 1000.0 / units_per_em;

        let widths = (0x20..=LAST_CODEPOINT)
            .filter_map(char::from_u32)
            .filter_map(|c| {
                let gid = parsed.lookup_glyph_index(c as u32)?;
                let advance = parsed.glyph_records_decoded.get(&gid)?.horz_advance;
                Some((c, (advance as f32 * scale).round() as u16))
            })
            .collect();

        Self { widths }
    }
}

impl Font {
    /// The standard-14 face this font corresponds to.
    pub fn builtin(self) -> BuiltinFont {
        match self {
            Font::Helvetica => BuiltinFont::Helvetica,
            Font::HelveticaBold => BuiltinFont::HelveticaBold,
        }
    }

    /// Parse the face bundled with `printpdf`.
    pub fn parsed_font(self) -> Option<ParsedFont> {
        self.builtin().get_parsed_font()
    }

    fn widths(self) -> &'static GlyphWidths {
        match self {
            Font::Helvetica => &HELVETICA,
            Font::HelveticaBold => &HELVETICA_BOLD,
        }
    }

    /// Advance width of `c` in 1/1000 em.
    pub fn char_width(self, c: char) -> u16 {
        self.widths()
            .widths
            .get(&c)
            .copied()
            .unwrap_or(MISSING_GLYPH_WIDTH)
    }

    /// Width of `text` in points at `size`.
    pub fn string_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f32 * size / 1000.0
    }
}
