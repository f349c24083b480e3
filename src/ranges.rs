//! Page-range specification parsing.
//!
//! A spec is a comma-separated list of 1-based tokens: a single page
//! number or an inclusive `start-end` range. An empty start means page 1,
//! an empty end means the last page, so `"1-3,7,10-"` on a 10-page
//! document selects pages 1-3, 7 and 10 to the end. Output is 0-indexed,
//! sorted and duplicate-free.

use std::collections::BTreeSet;

use log::debug;

use crate::error::{Error, Result};

/// Parse a page range spec against a document of `page_count` pages.
///
/// Numeric tokens outside `[1, page_count]` are dropped silently; a token
/// that is not a number at all fails the whole parse.
pub fn parse_page_ranges(spec: &str, page_count: usize) -> Result<Vec<usize>> {
    let mut pages = BTreeSet::new();

    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start_str, end_str)) = part.split_once('-') {
            let start = parse_bound(start_str, 1)?;
            let end = parse_bound(end_str, page_count)?;
            // Clamp before iterating: the out-of-range portion is dropped
            // without ever being walked, so a huge end stays cheap. A
            // backwards range selects nothing; that is not an error.
            let lo = start.max(1);
            let hi = end.min(page_count);
            if start < lo || end > hi {
                debug!("dropping out-of-range pages in {start}-{end} (document has {page_count})");
            }
            for p in lo..=hi {
                pages.insert(p - 1);
            }
        } else {
            let p: usize = part
                .parse()
                .map_err(|_| Error::InvalidRangeSpec(part.to_string()))?;
            if (1..=page_count).contains(&p) {
                pages.insert(p - 1);
            } else {
                debug!("dropping out-of-range page {p} (document has {page_count})");
            }
        }
    }

    Ok(pages.into_iter().collect())
}

fn parse_bound(token: &str, default: usize) -> Result<usize> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(default);
    }
    token
        .parse()
        .map_err(|_| Error::InvalidRangeSpec(token.to_string()))
}

/// Render a sorted 0-indexed page set back into a compact 1-based spec.
///
/// Consecutive runs collapse into `a-b`, so `[0, 1, 2, 6]` becomes
/// `"1-3,7"`. Re-parsing the rendered spec yields the original set.
#[must_use]
pub fn format_page_ranges(pages: &[usize]) -> String {
    let mut parts = Vec::new();
    let mut i = 0;
    while i < pages.len() {
        let start = pages[i];
        let mut end = start;
        while i + 1 < pages.len() && pages[i + 1] == end + 1 {
            i += 1;
            end = pages[i];
        }
        if start == end {
            parts.push(format!("{}", start + 1));
        } else {
            parts.push(format!("{}-{}", start + 1, end + 1));
        }
        i += 1;
    }
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_page() {
        assert_eq!(parse_page_ranges("1", 5).unwrap(), vec![0]);
        assert_eq!(parse_page_ranges("3", 5).unwrap(), vec![2]);
    }

    #[test]
    fn page_range() {
        assert_eq!(parse_page_ranges("2-4", 5).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn open_ended_ranges() {
        assert_eq!(parse_page_ranges("8-", 10).unwrap(), vec![7, 8, 9]);
        assert_eq!(parse_page_ranges("-3", 10).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn mixed_spec() {
        assert_eq!(
            parse_page_ranges("1-3,7,10-", 10).unwrap(),
            vec![0, 1, 2, 6, 9]
        );
    }

    #[test]
    fn backwards_range_selects_nothing() {
        assert_eq!(parse_page_ranges("2-1", 10).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn out_of_range_tokens_are_dropped() {
        assert_eq!(parse_page_ranges("0,6,3", 5).unwrap(), vec![2]);
        assert_eq!(parse_page_ranges("4-9", 5).unwrap(), vec![3, 4]);
    }

    #[test]
    fn huge_end_bound_is_clamped_not_walked() {
        // Must return instantly; the dropped tail is never iterated.
        assert_eq!(
            parse_page_ranges("1-4000000000", 5).unwrap(),
            vec![0, 1, 2, 3, 4]
        );
        assert_eq!(
            parse_page_ranges(&format!("2-{}", usize::MAX), 5).unwrap(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn non_numeric_token_is_fatal() {
        let err = parse_page_ranges("abc", 5).unwrap_err();
        assert!(matches!(err, Error::InvalidRangeSpec(t) if t == "abc"));

        let err = parse_page_ranges("1,x-3", 5).unwrap_err();
        assert!(matches!(err, Error::InvalidRangeSpec(t) if t == "x"));
    }

    #[test]
    fn duplicates_removed_and_sorted() {
        assert_eq!(parse_page_ranges("3,1,3,2-3", 5).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn whitespace_and_empty_tokens_tolerated() {
        assert_eq!(
            parse_page_ranges(" 1 ,, 3 - 5 ", 5).unwrap(),
            vec![0, 2, 3, 4]
        );
    }

    #[test]
    fn format_collapses_runs() {
        assert_eq!(format_page_ranges(&[0, 1, 2, 6, 9]), "1-3,7,10");
        assert_eq!(format_page_ranges(&[4]), "5");
        assert_eq!(format_page_ranges(&[]), "");
    }

    #[test]
    fn parse_is_idempotent_through_format() {
        for spec in ["1-3,7,10-", "2,4,6-8", "-2,9-", "5"] {
            let parsed = parse_page_ranges(spec, 10).unwrap();
            let reparsed = parse_page_ranges(&format_page_ranges(&parsed), 10).unwrap();
            assert_eq!(parsed, reparsed, "spec {spec:?}");
        }
    }
}
