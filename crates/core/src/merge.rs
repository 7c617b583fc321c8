//! Merging of match ranges from several sources, plus the density guard

use crate::error::{HighlightError, HighlightResult};
use crate::highlight::MatchRange;
use crate::normalize::char_slice;

/// Merges overlapping or touching ranges into a sorted, disjoint set.
///
/// Ranges are clamped to `text` first and empty ones dropped. A merged range
/// takes the strongest member kind and its text is re-read from `text`.
pub fn merge(text: &str, ranges: &[MatchRange]) -> Vec<MatchRange> {
    let text_len = text.chars().count();

    let mut sorted: Vec<MatchRange> = ranges
        .iter()
        .map(|range| {
            let mut range = range.clone();
            range.end = range.end.min(text_len);
            range
        })
        .filter(|range| !range.is_empty())
        .collect();
    sorted.sort_by_key(|range| (range.start, range.end));

    let mut merged: Vec<MatchRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(current) if range.start <= current.end => {
                current.end = current.end.max(range.end);
                current.kind = current.kind.stronger(range.kind);
            }
            _ => merged.push(range),
        }
    }

    for range in &mut merged {
        range.matched_text = char_slice(text, range.start, range.end);
    }
    merged
}

/// Share of `text_len` chars covered by `ranges`.
pub fn highlighted_fraction(text_len: usize, ranges: &[MatchRange]) -> f64 {
    if text_len == 0 {
        return 0.0;
    }
    let covered: usize = ranges.iter().map(MatchRange::len).sum();
    covered as f64 / text_len as f64
}

/// Fails with `OverDensity` when `ranges` cover more than `ceiling` of the text.
///
/// `ranges` must already be merged; overlapping input counts twice.
pub fn check_density(text_len: usize, ranges: &[MatchRange], ceiling: f64) -> HighlightResult<f64> {
    let fraction = highlighted_fraction(text_len, ranges);
    if fraction > ceiling {
        return Err(HighlightError::OverDensity { fraction, ceiling });
    }
    Ok(fraction)
}

/// [`merge`] followed by the density guard. Rejected sets come back empty.
pub fn merge_guarded(text: &str, ranges: &[MatchRange], ceiling: f64) -> Vec<MatchRange> {
    let merged = merge(text, ranges);
    match check_density(text.chars().count(), &merged, ceiling) {
        Ok(_) => merged,
        Err(err) => {
            tracing::debug!(ranges = merged.len(), "dropping highlights: {err}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::MatchKind;

    fn range(start: usize, end: usize, kind: MatchKind) -> MatchRange {
        MatchRange::new(start, end, "", kind)
    }

    #[test]
    fn test_overlapping_ranges_merge() {
        let text = "abcdefghij";
        let merged = merge(text, &[range(3, 8, MatchKind::Fuzzy), range(0, 5, MatchKind::Exact)]);

        assert_eq!(merged.len(), 1);
        assert_eq!((merged[0].start, merged[0].end), (0, 8));
        assert_eq!(merged[0].matched_text, "abcdefgh");
        assert_eq!(merged[0].kind, MatchKind::Exact);
    }

    #[test]
    fn test_touching_ranges_merge_and_gaps_do_not() {
        let text = "0123456789";
        let merged = merge(
            text,
            &[
                range(0, 2, MatchKind::Semantic),
                range(2, 4, MatchKind::Semantic),
                range(6, 8, MatchKind::Anchor),
            ],
        );

        assert_eq!(merged.len(), 2);
        assert_eq!((merged[0].start, merged[0].end), (0, 4));
        assert_eq!((merged[1].start, merged[1].end), (6, 8));
        assert_eq!(merged[1].matched_text, "67");
    }

    #[test]
    fn test_contained_range_is_absorbed() {
        let merged = merge("abcdefghij", &[range(1, 9, MatchKind::Semantic), range(3, 4, MatchKind::Exact)]);
        assert_eq!(merged.len(), 1);
        assert_eq!((merged[0].start, merged[0].end), (1, 9));
        assert_eq!(merged[0].kind, MatchKind::Exact);
    }

    #[test]
    fn test_ranges_are_clamped_to_text() {
        let merged = merge("caf\u{00e9}", &[range(2, 40, MatchKind::Exact), range(9, 12, MatchKind::Exact)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].end, 4);
        assert_eq!(merged[0].matched_text, "f\u{00e9}");
        assert!(merge("", &[range(0, 3, MatchKind::Exact)]).is_empty());
    }

    #[test]
    fn test_keyword_density_rejects_majority_highlight() {
        let text = "x".repeat(100);
        let ranges = [range(0, 30, MatchKind::Exact), range(40, 61, MatchKind::Exact)];

        assert!(merge_guarded(&text, &ranges, 0.5).is_empty());
        assert_eq!(merge_guarded(&text, &ranges, 0.9).len(), 2);
    }

    #[test]
    fn test_density_boundaries() {
        let text_len = 10_000;

        let half = [range(0, 5_000, MatchKind::Exact)];
        assert!(check_density(text_len, &half, 0.5).is_ok());
        let over_half = [range(0, 5_001, MatchKind::Exact)];
        assert!(matches!(
            check_density(text_len, &over_half, 0.5),
            Err(HighlightError::OverDensity { .. })
        ));

        let ninety = [range(0, 9_000, MatchKind::Semantic)];
        assert!(check_density(text_len, &ninety, 0.9).is_ok());
        let over_ninety = [range(0, 9_001, MatchKind::Semantic)];
        assert!(check_density(text_len, &over_ninety, 0.9).is_err());
    }

    #[test]
    fn test_fraction_of_empty_text() {
        assert_eq!(highlighted_fraction(0, &[range(0, 3, MatchKind::Exact)]), 0.0);
        assert_eq!(highlighted_fraction(4, &[range(0, 1, MatchKind::Exact)]), 0.25);
    }
}
