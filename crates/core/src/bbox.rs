//! Match range → content-space geometry
//!
//! Char positions inside a run are estimated with a uniform advance
//! (`run.width / chars`). Runs without usable geometry are skipped.

use crate::highlight::MatchRange;
use crate::runs::{CharacterRun, RunIndex};
use seekmark_viewer::ContentRect;

/// Envelope of every run spanned by `range`.
///
/// Returns `None` when no spanned run has valid geometry; callers skip the
/// range.
pub fn compute_bbox(runs: &[CharacterRun], index: &RunIndex, range: &MatchRange) -> Option<ContentRect> {
    run_rects(runs, index, range)
        .into_iter()
        .map(|(_, rect)| rect)
        .reduce(|acc, rect| acc.union(&rect))
}

/// One partial rectangle per spanned run that holds text.
///
/// These become the visual spans of a text-layer highlight: a range that wraps
/// across lines yields rectangles on each line instead of one tall envelope.
pub fn span_rects(runs: &[CharacterRun], index: &RunIndex, range: &MatchRange) -> Vec<ContentRect> {
    run_rects(runs, index, range)
        .into_iter()
        .filter(|(run, _)| run.char_count() > 0)
        .map(|(_, rect)| rect)
        .collect()
}

fn run_rects<'a>(
    runs: &'a [CharacterRun],
    index: &RunIndex,
    range: &MatchRange,
) -> Vec<(&'a CharacterRun, ContentRect)> {
    let Some((first, last)) = index.span(range.start, range.end) else {
        return Vec::new();
    };

    (first.run_index..=last.run_index)
        .filter_map(|run_index| {
            let run = runs.get(run_index)?;
            if !run.has_geometry() {
                return None;
            }

            let advance = run.char_width();
            let left = if run_index == first.run_index {
                run.x + first.char_in_run as f32 * advance
            } else {
                run.x
            };
            let right = if run_index == last.run_index {
                run.x + (last.char_in_run + 1) as f32 * advance
            } else if run.char_count() == 0 {
                run.x
            } else {
                run.x + run.width
            };

            Some((run, ContentRect::new(left, run.y, right, run.y + run.height)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::MatchKind;

    fn range(start: usize, end: usize) -> MatchRange {
        MatchRange::new(start, end, "", MatchKind::Exact)
    }

    #[test]
    fn test_partial_single_run() {
        let runs = vec![CharacterRun::new("The Quick", 10.0, 700.0, 90.0, 12.0)];
        let index = RunIndex::build(&runs);

        let bbox = compute_bbox(&runs, &index, &range(4, 9)).unwrap();
        assert_eq!(bbox, ContentRect::new(50.0, 700.0, 100.0, 712.0));
    }

    #[test]
    fn test_multi_run_envelope() {
        let runs = vec![
            CharacterRun::new("abcd", 0.0, 100.0, 40.0, 10.0),
            CharacterRun::new("efgh", 40.0, 100.0, 40.0, 12.0),
            CharacterRun::new("ijkl", 0.0, 80.0, 40.0, 10.0),
        ];
        let index = RunIndex::build(&runs);

        // "cd" + "efgh" + "ij"
        let bbox = compute_bbox(&runs, &index, &range(2, 10)).unwrap();
        assert_eq!(bbox, ContentRect::new(0.0, 80.0, 80.0, 112.0));

        let spans = span_rects(&runs, &index, &range(2, 10));
        assert_eq!(
            spans,
            vec![
                ContentRect::new(20.0, 100.0, 40.0, 110.0),
                ContentRect::new(40.0, 100.0, 80.0, 112.0),
                ContentRect::new(0.0, 80.0, 20.0, 90.0),
            ]
        );
    }

    #[test]
    fn test_empty_interior_run_uses_origin() {
        let runs = vec![
            CharacterRun::new("ab", 0.0, 0.0, 20.0, 10.0),
            CharacterRun::new("", 25.0, 0.0, 0.0, 10.0),
            CharacterRun::new("cd", 30.0, 0.0, 20.0, 10.0),
        ];
        let index = RunIndex::build(&runs);

        let bbox = compute_bbox(&runs, &index, &range(1, 3)).unwrap();
        assert_eq!(bbox, ContentRect::new(10.0, 0.0, 40.0, 10.0));
        // the empty run contributes no visual span
        assert_eq!(span_rects(&runs, &index, &range(1, 3)).len(), 2);
    }

    #[test]
    fn test_missing_geometry_is_skipped() {
        let runs = vec![
            CharacterRun::new("ab", f32::NAN, 0.0, 20.0, 10.0),
            CharacterRun::new("cd", 30.0, 0.0, 20.0, 10.0),
        ];
        let index = RunIndex::build(&runs);

        assert!(compute_bbox(&runs, &index, &range(0, 2)).is_none());
        let bbox = compute_bbox(&runs, &index, &range(0, 4)).unwrap();
        assert_eq!(bbox, ContentRect::new(30.0, 0.0, 50.0, 10.0));
    }

    #[test]
    fn test_out_of_range_returns_none() {
        let runs = vec![CharacterRun::new("ab", 0.0, 0.0, 20.0, 10.0)];
        let index = RunIndex::build(&runs);

        assert!(compute_bbox(&runs, &index, &range(5, 9)).is_none());
        assert!(compute_bbox(&runs, &index, &range(1, 1)).is_none());
        // end past the text is clamped
        assert_eq!(
            compute_bbox(&runs, &index, &range(1, 9)),
            Some(ContentRect::new(10.0, 0.0, 20.0, 10.0))
        );
    }
}
