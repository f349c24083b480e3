//! A viewing/editing session over one open document.
//!
//! The session owns the document handle, the current-page cursor and the
//! search cursor; UI callbacks operate through it instead of sharing a
//! global handle. Every structural edit leaves the cursor inside
//! `[0, page_count)`.

use crate::engine::Document;
use crate::error::{Error, Result};
use crate::viewer::search::{Match, SearchCursor};

pub struct Session<D: Document> {
    doc: D,
    page: usize,
    search: SearchCursor,
}

impl<D: Document> Session<D> {
    pub fn new(doc: D) -> Self {
        Self {
            doc,
            page: 0,
            search: SearchCursor::new(),
        }
    }

    #[must_use]
    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn into_document(self) -> D {
        self.doc
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.doc.page_count()
    }

    fn clamp_cursor(&mut self) {
        let count = self.doc.page_count();
        if count > 0 {
            self.page = self.page.min(count - 1);
        }
    }

    /// Jump to a page, clamped to the document. No-op on an empty document.
    pub fn go_to(&mut self, index: usize) {
        if self.doc.page_count() == 0 {
            return;
        }
        self.page = index;
        self.clamp_cursor();
    }

    /// Move forward one page; no wraparound at the end.
    pub fn next(&mut self) {
        self.go_to(self.page + 1);
    }

    /// Move back one page; no wraparound at the start.
    pub fn prev(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    /// Delete a page. Refused when it is the only page left.
    pub fn delete_page(&mut self, index: usize) -> Result<()> {
        if self.doc.page_count() <= 1 {
            return Err(Error::LastPageDeletionRefused);
        }
        self.doc.delete_page(index)?;
        self.search.clear();
        self.page = index.saturating_sub(1);
        self.clamp_cursor();
        Ok(())
    }

    /// Relocate a page; the cursor follows to the destination.
    pub fn move_page(&mut self, from: usize, to: usize) -> Result<()> {
        if from == to {
            return Ok(());
        }
        self.doc.move_page(from, to)?;
        self.search.clear();
        self.page = to;
        self.clamp_cursor();
        Ok(())
    }

    /// Add `delta` degrees to each listed page's rotation. Deltas
    /// accumulate across calls; the result is kept in `[0, 360)`.
    pub fn rotate_pages(&mut self, pages: &[usize], delta: i32) -> Result<()> {
        for &page in pages {
            let current = self.doc.page_rotation(page)?;
            self.doc.set_page_rotation(page, (current + delta).rem_euclid(360))?;
        }
        Ok(())
    }

    /// Splice all pages of `src` into the document at `at`; the cursor
    /// moves to the first inserted page.
    pub fn insert_document(&mut self, src: &D, at: usize) -> Result<()> {
        if src.page_count() == 0 {
            return Ok(());
        }
        let at = at.min(self.doc.page_count());
        self.doc.insert_pages(src, 0, src.page_count() - 1, at)?;
        self.search.clear();
        self.page = at;
        self.clamp_cursor();
        Ok(())
    }

    /// Insert before the current page.
    pub fn insert_before(&mut self, src: &D) -> Result<()> {
        self.insert_document(src, self.page)
    }

    /// Insert after the current page.
    pub fn insert_after(&mut self, src: &D) -> Result<()> {
        self.insert_document(src, self.page + 1)
    }

    /// Search navigation; the cursor jumps to the page of the hit.
    pub fn find(&mut self, query: &str, step: i32, reset: bool) -> Result<Option<Match>> {
        let hit = self.search.find(&self.doc, query, step, reset)?;
        if let Some(m) = &hit {
            self.page = m.page;
            self.clamp_cursor();
        }
        Ok(hit)
    }

    /// `(position, total)` of the search cursor, for status display.
    #[must_use]
    pub fn search_status(&self) -> Option<(usize, usize)> {
        self.search
            .position()
            .map(|p| (p, self.search.matches().len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeDocument;

    fn session(n: usize) -> Session<FakeDocument> {
        Session::new(FakeDocument::with_pages(n))
    }

    #[test]
    fn go_to_clamps_to_last_page() {
        let mut s = session(10);
        s.go_to(999);
        assert_eq!(s.current_page(), 9);
    }

    #[test]
    fn next_and_prev_stop_at_boundaries() {
        let mut s = session(2);
        s.prev();
        assert_eq!(s.current_page(), 0);
        s.next();
        s.next();
        assert_eq!(s.current_page(), 1);
    }

    #[test]
    fn delete_refused_on_single_page_document() {
        let mut s = session(1);
        let err = s.delete_page(0).unwrap_err();
        assert!(matches!(err, Error::LastPageDeletionRefused));
        assert_eq!(s.page_count(), 1);
    }

    #[test]
    fn delete_moves_cursor_to_previous_page() {
        let mut s = session(5);
        s.go_to(3);
        s.delete_page(3).unwrap();
        assert_eq!(s.page_count(), 4);
        assert_eq!(s.current_page(), 2);

        s.delete_page(0).unwrap();
        assert_eq!(s.current_page(), 0);
    }

    #[test]
    fn delete_last_index_keeps_cursor_valid() {
        let mut s = session(3);
        s.go_to(2);
        s.delete_page(2).unwrap();
        assert_eq!(s.current_page(), 1);
        assert!(s.current_page() < s.page_count());
    }

    #[test]
    fn move_page_is_remove_then_insert_at_destination() {
        let mut s = Session::new(FakeDocument::with_texts(&["A", "B", "C", "D"]));
        s.move_page(0, 2).unwrap();
        let texts: Vec<_> = (0..4)
            .map(|i| s.document().page_text(i).unwrap())
            .collect();
        assert_eq!(texts, ["B", "C", "A", "D"]);
        assert_eq!(s.current_page(), 2);
    }

    #[test]
    fn move_page_backwards_preserves_other_order() {
        let mut s = Session::new(FakeDocument::with_texts(&["A", "B", "C", "D"]));
        s.move_page(3, 1).unwrap();
        let texts: Vec<_> = (0..4)
            .map(|i| s.document().page_text(i).unwrap())
            .collect();
        assert_eq!(texts, ["A", "D", "B", "C"]);
        assert_eq!(s.current_page(), 1);
    }

    #[test]
    fn move_to_same_index_is_a_no_op() {
        let mut s = session(4);
        s.go_to(1);
        s.move_page(2, 2).unwrap();
        assert_eq!(s.current_page(), 1);
    }

    #[test]
    fn rotation_accumulates_modulo_360() {
        let mut s = session(2);
        s.rotate_pages(&[0], 90).unwrap();
        s.rotate_pages(&[0], 90).unwrap();
        assert_eq!(s.document().page_rotation(0).unwrap(), 180);

        s.rotate_pages(&[0], 90).unwrap();
        s.rotate_pages(&[0], 90).unwrap();
        assert_eq!(s.document().page_rotation(0).unwrap(), 0);

        s.rotate_pages(&[1], -90).unwrap();
        assert_eq!(s.document().page_rotation(1).unwrap(), 270);
    }

    #[test]
    fn insert_after_lands_cursor_on_first_inserted_page() {
        let mut s = Session::new(FakeDocument::with_texts(&["A", "B"]));
        let src = FakeDocument::with_texts(&["X", "Y"]);
        s.go_to(0);
        s.insert_after(&src).unwrap();
        assert_eq!(s.page_count(), 4);
        assert_eq!(s.current_page(), 1);
        assert_eq!(s.document().page_text(1).unwrap(), "X");
        assert_eq!(s.document().page_text(3).unwrap(), "B");
    }

    #[test]
    fn insert_before_keeps_cursor_on_insertion_point() {
        let mut s = Session::new(FakeDocument::with_texts(&["A", "B"]));
        let src = FakeDocument::with_texts(&["X"]);
        s.go_to(1);
        s.insert_before(&src).unwrap();
        assert_eq!(s.current_page(), 1);
        assert_eq!(s.document().page_text(1).unwrap(), "X");
    }

    #[test]
    fn insert_empty_document_changes_nothing() {
        let mut s = Session::new(FakeDocument::with_texts(&["A"]));
        let src = FakeDocument::default();
        s.insert_after(&src).unwrap();
        assert_eq!(s.page_count(), 1);
        assert_eq!(s.current_page(), 0);
    }

    #[test]
    fn find_moves_cursor_to_hit_page() {
        let mut s = Session::new(FakeDocument::with_texts(&["alpha", "needle", "needle"]));
        let hit = s.find("needle", 1, false).unwrap().unwrap();
        assert_eq!(hit.page, 1);
        assert_eq!(s.current_page(), 1);
        assert_eq!(s.search_status(), Some((0, 2)));

        s.find("needle", 1, false).unwrap();
        assert_eq!(s.current_page(), 2);
    }

    #[test]
    fn structural_edit_invalidates_search_state() {
        let mut s = Session::new(FakeDocument::with_texts(&["needle", "x", "needle"]));
        s.find("needle", 1, false).unwrap();
        s.delete_page(0).unwrap();
        // The next find rebuilds against the edited document.
        let hit = s.find("needle", 1, false).unwrap().unwrap();
        assert_eq!(hit.page, 1);
        assert_eq!(s.search_status(), Some((0, 1)));
    }
}
