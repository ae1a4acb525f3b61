//! A4 text documents rendered with `printpdf`.
//!
//! Text is set in the bundled DejaVu Serif face, embedded as a TrueType font
//! with a Unicode map, so Cyrillic and other non-Latin names survive.

use printpdf::{IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex, PdfPageIndex};

use crate::{EngineError, ResultEngine};

pub(crate) const FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSerif.ttf");

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MM_PER_POINT: f32 = 25.4 / 72.0;
const LAYER: &str = "Text";

/// A single line of text at an absolute position in points (origin
/// bottom-left).
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PlacedText {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) size: u8,
    pub(crate) text: String,
}

fn mm(points: i32) -> Mm {
    Mm(points as f32 * MM_PER_POINT)
}

fn export_error(err: impl std::fmt::Display) -> EngineError {
    EngineError::Export(err.to_string())
}

fn write_page(
    doc: &PdfDocumentReference,
    (page, layer): (PdfPageIndex, PdfLayerIndex),
    font: &IndirectFontRef,
    items: &[PlacedText],
) {
    let layer = doc.get_page(page).get_layer(layer);
    for item in items {
        layer.use_text(
            item.text.as_str(),
            f32::from(item.size),
            mm(item.x),
            mm(item.y),
            font,
        );
    }
}

/// Render `pages` into a complete PDF file titled `title`. An empty slice
/// still yields a single blank page.
pub(crate) fn render(title: &str, pages: &[Vec<PlacedText>]) -> ResultEngine<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER);
    let font = doc.add_external_font(FONT).map_err(export_error)?;

    let mut target = (page, layer);
    for (index, items) in pages.iter().enumerate() {
        if index > 0 {
            target = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER);
        }
        write_page(&doc, target, &font, items);
    }

    doc.save_to_bytes().map_err(export_error)
}
