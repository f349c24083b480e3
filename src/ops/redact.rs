//! Vector redaction: remove matched content from the page, not just
//! paint over it.

use std::path::Path;

use crate::engine::{Document, Engine, SaveMode};
use crate::error::Result;

/// Redact every occurrence of `needle`. Redactions are applied per page
/// once all of that page's annotations are placed, so overlapping hits
/// are removed together. Returns the number of redacted occurrences.
pub fn redact_text<E: Engine>(
    engine: &E,
    input: &Path,
    output: &Path,
    needle: &str,
) -> Result<usize> {
    let mut doc = engine.open(input)?;
    let mut hits = 0;
    for page in 0..doc.page_count() {
        let rects = doc.search_page(page, needle)?;
        for rect in &rects {
            doc.add_redaction(page, *rect)?;
        }
        if !rects.is_empty() {
            doc.apply_redactions(page)?;
            hits += rects.len();
        }
    }
    doc.save(output, SaveMode::Compressed)?;
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeDocument, FakeEngine};

    #[test]
    fn redacts_all_occurrences_and_applies_per_page() {
        let mut engine = FakeEngine::default();
        engine.insert(
            "in.pdf",
            FakeDocument::with_texts(&["secret data", "no hits", "secret secret"]),
        );

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("red.pdf");
        let hits = redact_text(&engine, Path::new("in.pdf"), &out, "secret").unwrap();
        assert_eq!(hits, 3);

        let saved = engine.last_saved(&out).unwrap();
        assert_eq!(saved.pages[0].redactions_applied, 1);
        assert_eq!(saved.pages[1].redactions_applied, 0);
        assert_eq!(saved.pages[2].redactions_applied, 1);
    }

    #[test]
    fn no_matches_still_saves_the_document() {
        let mut engine = FakeEngine::default();
        engine.insert("in.pdf", FakeDocument::with_texts(&["clean"]));
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("red.pdf");
        assert_eq!(redact_text(&engine, Path::new("in.pdf"), &out, "secret").unwrap(), 0);
        assert!(engine.last_saved(&out).is_some());
    }
}
