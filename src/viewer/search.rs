//! Cross-page text search with a cyclic match cursor.
//!
//! The cursor owns the match list for the current query and a position
//! into it. The list is rebuilt on an explicit reset, when the query
//! string changes, or when no list exists yet; navigation then cycles
//! through the matches in both directions.

use log::debug;

use crate::engine::Document;
use crate::error::Result;
use crate::geom::PageRect;

/// One occurrence of the query: page index plus page-space rectangle.
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    pub page: usize,
    pub rect: PageRect,
}

#[derive(Debug)]
pub struct SearchCursor {
    query: String,
    matches: Vec<Match>,
    /// -1 until the first advance after a rebuild.
    position: isize,
}

impl Default for SearchCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchCursor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            query: String::new(),
            matches: Vec::new(),
            position: -1,
        }
    }

    /// Advance to the next match in the step direction, rebuilding the
    /// match list first when needed. Returns `None` when the query is
    /// empty or has no occurrences.
    pub fn find<D: Document>(
        &mut self,
        doc: &D,
        query: &str,
        step: i32,
        reset: bool,
    ) -> Result<Option<Match>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        if reset || query != self.query || self.matches.is_empty() {
            self.rebuild(doc, query)?;
            if self.matches.is_empty() {
                debug!("no matches for '{query}'");
                return Ok(None);
            }
        }

        let len = self.matches.len() as isize;
        // Euclidean modulo so a backwards step from the head wraps to the
        // tail instead of going negative.
        self.position = (self.position + step as isize).rem_euclid(len);
        Ok(Some(self.matches[self.position as usize].clone()))
    }

    fn rebuild<D: Document>(&mut self, doc: &D, query: &str) -> Result<()> {
        self.query = query.to_string();
        self.position = -1;
        self.matches.clear();
        for page in 0..doc.page_count() {
            for rect in doc.search_page(page, query)? {
                self.matches.push(Match { page, rect });
            }
        }
        debug!("{} matches for '{query}'", self.matches.len());
        Ok(())
    }

    /// Drop the match list; the next `find` rebuilds.
    pub fn clear(&mut self) {
        self.matches.clear();
        self.position = -1;
    }

    /// Current 0-based position, `None` before the first advance.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        (self.position >= 0).then_some(self.position as usize)
    }

    #[must_use]
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeDocument;

    fn doc() -> FakeDocument {
        FakeDocument::with_texts(&["alpha beta", "beta beta", "gamma"])
    }

    #[test]
    fn builds_in_page_order_and_cycles_forward() {
        let doc = doc();
        let mut cursor = SearchCursor::new();

        let first = cursor.find(&doc, "beta", 1, false).unwrap().unwrap();
        assert_eq!(first.page, 0);
        assert_eq!(cursor.position(), Some(0));
        assert_eq!(cursor.matches().len(), 3);

        assert_eq!(cursor.find(&doc, "beta", 1, false).unwrap().unwrap().page, 1);
        assert_eq!(cursor.find(&doc, "beta", 1, false).unwrap().unwrap().page, 1);
        // Fourth step wraps back to the first match.
        assert_eq!(cursor.find(&doc, "beta", 1, false).unwrap().unwrap().page, 0);
    }

    #[test]
    fn backwards_from_head_wraps_to_tail() {
        let doc = doc();
        let mut cursor = SearchCursor::new();
        cursor.find(&doc, "beta", 1, false).unwrap(); // position 0

        let hit = cursor.find(&doc, "beta", -1, false).unwrap().unwrap();
        assert_eq!(cursor.position(), Some(2));
        assert_eq!(hit.page, 1);
    }

    #[test]
    fn full_cycle_returns_to_start() {
        let doc = doc();
        let mut cursor = SearchCursor::new();
        cursor.find(&doc, "beta", 1, false).unwrap();
        cursor.find(&doc, "beta", 1, false).unwrap();
        let start = cursor.position().unwrap();

        let k = cursor.matches().len();
        for _ in 0..k {
            cursor.find(&doc, "beta", 1, false).unwrap();
        }
        assert_eq!(cursor.position(), Some(start));
    }

    #[test]
    fn no_matches_leaves_position_unset() {
        let doc = doc();
        let mut cursor = SearchCursor::new();
        assert!(cursor.find(&doc, "delta", 1, false).unwrap().is_none());
        assert_eq!(cursor.position(), None);
    }

    #[test]
    fn changed_query_forces_rebuild() {
        let doc = doc();
        let mut cursor = SearchCursor::new();
        cursor.find(&doc, "beta", 1, false).unwrap();
        cursor.find(&doc, "beta", 1, false).unwrap();
        assert_eq!(cursor.position(), Some(1));

        let hit = cursor.find(&doc, "gamma", 1, false).unwrap().unwrap();
        assert_eq!(hit.page, 2);
        assert_eq!(cursor.position(), Some(0));
        assert_eq!(cursor.matches().len(), 1);
    }

    #[test]
    fn explicit_reset_restarts_from_the_first_match() {
        let doc = doc();
        let mut cursor = SearchCursor::new();
        cursor.find(&doc, "beta", 1, false).unwrap();
        cursor.find(&doc, "beta", 1, false).unwrap();

        let hit = cursor.find(&doc, "beta", 1, true).unwrap().unwrap();
        assert_eq!(cursor.position(), Some(0));
        assert_eq!(hit.page, 0);
    }

    #[test]
    fn case_insensitive_and_dehyphenated() {
        let doc = FakeDocument::with_texts(&["The Water-\nmark stays"]);
        let mut cursor = SearchCursor::new();
        assert!(cursor.find(&doc, "watermark", 1, false).unwrap().is_some());
    }

    #[test]
    fn empty_query_is_a_no_op() {
        let doc = doc();
        let mut cursor = SearchCursor::new();
        assert!(cursor.find(&doc, "  ", 1, false).unwrap().is_none());
        assert_eq!(cursor.position(), None);
    }
}
