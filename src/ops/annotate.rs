//! Document-wide annotation passes: search highlighting, watermarking
//! and header/footer stamping.

use std::path::Path;

use crate::engine::{Document, Engine, SaveMode};
use crate::error::Result;
use crate::geom::{PagePoint, PageRect};

/// Highlight every case-insensitive, dehyphenation-aware occurrence of
/// `needle`. Returns the number of highlights added.
pub fn highlight_text<E: Engine>(
    engine: &E,
    input: &Path,
    output: &Path,
    needle: &str,
) -> Result<usize> {
    let mut doc = engine.open(input)?;
    let mut hits = 0;
    for page in 0..doc.page_count() {
        for rect in doc.search_page(page, needle)? {
            doc.add_highlight(page, rect)?;
            hits += 1;
        }
    }
    doc.save(output, SaveMode::Compressed)?;
    Ok(hits)
}

const WATERMARK_FONT_SIZE: f32 = 48.0;
const WATERMARK_ANGLE: i32 = 45;
/// Offset of the watermark anchor from the page's top-left corner.
const WATERMARK_ANCHOR: PagePoint = PagePoint { x: 20.0, y: 60.0 };

/// Diagonal translucent text on every page.
pub fn watermark_text<E: Engine>(
    engine: &E,
    input: &Path,
    output: &Path,
    text: &str,
    opacity: f32,
) -> Result<()> {
    let mut doc = engine.open(input)?;
    for page in 0..doc.page_count() {
        doc.insert_text(
            page,
            WATERMARK_ANCHOR,
            text,
            WATERMARK_FONT_SIZE,
            WATERMARK_ANGLE,
            opacity,
        )?;
    }
    doc.save(output, SaveMode::Compressed)
}

const STAMP_MARGIN_X: f32 = 36.0;

/// Centered header and/or footer text boxes in the page margins.
pub fn stamp_header_footer<E: Engine>(
    engine: &E,
    input: &Path,
    output: &Path,
    header: Option<&str>,
    footer: Option<&str>,
    size: f32,
) -> Result<()> {
    let mut doc = engine.open(input)?;
    for page in 0..doc.page_count() {
        let (width, height) = doc.page_size(page)?;
        if let Some(text) = header {
            let band = PageRect::new(STAMP_MARGIN_X, 12.0, width - STAMP_MARGIN_X, 48.0);
            doc.insert_textbox(page, band, text, size)?;
        }
        if let Some(text) = footer {
            let band = PageRect::new(
                STAMP_MARGIN_X,
                height - 48.0,
                width - STAMP_MARGIN_X,
                height - 12.0,
            );
            doc.insert_textbox(page, band, text, size)?;
        }
    }
    doc.save(output, SaveMode::Compressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeAnnotation, FakeDocument, FakeEngine};

    #[test]
    fn highlight_counts_every_occurrence() {
        let mut engine = FakeEngine::default();
        engine.insert(
            "in.pdf",
            FakeDocument::with_texts(&["needle here", "two needle needle", "none"]),
        );

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("hl.pdf");
        let hits = highlight_text(&engine, Path::new("in.pdf"), &out, "Needle").unwrap();
        assert_eq!(hits, 3);

        let saved = engine.last_saved(&out).unwrap();
        assert_eq!(saved.pages[0].annotations.len(), 1);
        assert_eq!(saved.pages[1].annotations.len(), 2);
        assert!(saved.pages[2].annotations.is_empty());
    }

    #[test]
    fn watermark_lands_on_every_page() {
        let mut engine = FakeEngine::default();
        engine.insert("in.pdf", FakeDocument::with_pages(3));

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("wm.pdf");
        watermark_text(&engine, Path::new("in.pdf"), &out, "DRAFT", 0.15).unwrap();

        let saved = engine.last_saved(&out).unwrap();
        for page in &saved.pages {
            assert!(matches!(
                &page.annotations[0],
                FakeAnnotation::Text { text, opacity, .. }
                    if text == "DRAFT" && (*opacity - 0.15).abs() < f32::EPSILON
            ));
        }
    }

    #[test]
    fn stamp_places_header_and_footer_bands() {
        let mut engine = FakeEngine::default();
        engine.insert("in.pdf", FakeDocument::with_pages(1));

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("st.pdf");
        stamp_header_footer(
            &engine,
            Path::new("in.pdf"),
            &out,
            Some("Top"),
            Some("Bottom"),
            10.0,
        )
        .unwrap();

        let saved = engine.last_saved(&out).unwrap();
        let annots = &saved.pages[0].annotations;
        assert_eq!(annots.len(), 2);
        let FakeAnnotation::TextBox { rect, text, .. } = &annots[1] else {
            panic!("expected a text box");
        };
        assert_eq!(text, "Bottom");
        // Footer band sits against the bottom margin of a 792pt page.
        assert_eq!(rect.y1, 792.0 - 12.0);
    }

    #[test]
    fn header_only_stamp_skips_the_footer() {
        let mut engine = FakeEngine::default();
        engine.insert("in.pdf", FakeDocument::with_pages(1));
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("st.pdf");
        stamp_header_footer(&engine, Path::new("in.pdf"), &out, Some("Top"), None, 10.0).unwrap();
        assert_eq!(engine.last_saved(&out).unwrap().pages[0].annotations.len(), 1);
    }
}
