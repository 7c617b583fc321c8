//! Property-based tests for matching and merging invariants.

use proptest::prelude::*;
use seekmark_core::{locate, merge, normalize_loose, normalize_tight, MatchKind, MatchRange};

fn ranges_strategy() -> impl Strategy<Value = Vec<MatchRange>> {
    prop::collection::vec((0usize..120, 0usize..25, 0u8..4), 0..20).prop_map(|raw| {
        raw.into_iter()
            .map(|(start, len, kind)| {
                let kind = match kind {
                    0 => MatchKind::Exact,
                    1 => MatchKind::Fuzzy,
                    2 => MatchKind::Semantic,
                    _ => MatchKind::Anchor,
                };
                MatchRange::new(start, start + len, "", kind)
            })
            .collect()
    })
}

#[test]
fn proptest_merge_is_idempotent() {
    proptest!(|(len in 0usize..100, ranges in ranges_strategy())| {
        let text = "x".repeat(len);
        let once = merge(&text, &ranges);
        prop_assert_eq!(merge(&text, &once), once);
    });
}

#[test]
fn proptest_merge_output_is_sorted_and_disjoint() {
    proptest!(|(len in 0usize..100, ranges in ranges_strategy())| {
        let text = "y".repeat(len);
        let merged = merge(&text, &ranges);

        for pair in merged.windows(2) {
            prop_assert!(pair[0].end < pair[1].start);
        }
        for range in &merged {
            prop_assert!(range.start < range.end && range.end <= len);
        }
    });
}

#[test]
fn proptest_merge_covers_every_input() {
    proptest!(|(len in 1usize..100, ranges in ranges_strategy())| {
        let text = "z".repeat(len);
        let merged = merge(&text, &ranges);

        for input in &ranges {
            let end = input.end.min(len);
            if input.start >= end {
                continue;
            }
            prop_assert!(merged.iter().any(|m| m.start <= input.start && end <= m.end));
        }
    });
}

#[test]
fn proptest_normalization_is_deterministic() {
    proptest!(|(text in "\\PC{0,80}")| {
        prop_assert_eq!(normalize_loose(&text), normalize_loose(&text));
        prop_assert_eq!(normalize_tight(&text), normalize_tight(&text));
    });
}

#[test]
fn proptest_tight_is_idempotent() {
    proptest!(|(text in "[a-zA-Z0-9 .,;:!?'\"\u{00e9}\u{00c9}\u{00fc}\u{00e7}\u{00f1}\u{2014}\u{2019}\u{201C}\u{200B}-]{0,60}")| {
        let once = normalize_tight(&text);
        prop_assert_eq!(normalize_tight(&once), once);
    });
}

#[test]
fn proptest_verbatim_phrase_round_trips() {
    proptest!(|(
        prefix in "[a-zA-Z ,.]{0,30}",
        phrase in "[a-z]{1,5}( [a-z]{1,5}){0,3}",
        suffix in "[a-zA-Z ,.]{0,30}",
    )| {
        let page = format!("{prefix}{phrase}{suffix}");
        let found = locate(&page, &phrase);

        prop_assert!(found.is_some());
        let found = found.unwrap();
        prop_assert_eq!(found.kind, MatchKind::Exact);
        prop_assert_eq!(normalize_loose(&found.matched_text), normalize_loose(&phrase));
    });
}
