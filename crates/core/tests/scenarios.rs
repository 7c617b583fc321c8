use seekmark_core::{
    group_by_line, locate, merge, merge_guarded, CharacterRun, HighlightConfig, HighlightType, MatchKind,
    MatchRange, PageText, VisualSpan, LINE_TOLERANCE,
};

fn range(start: usize, end: usize) -> MatchRange {
    MatchRange::new(start, end, "", MatchKind::Exact)
}

#[test]
fn exact_match_in_plain_text() {
    let found = locate("The Quick Brown Fox", "quick brown").unwrap();
    assert_eq!((found.start, found.end), (4, 15));
    assert_eq!(found.kind, MatchKind::Exact);
}

#[test]
fn exact_match_survives_fused_words() {
    let found = locate("TheQuickBrownFox jumps", "Quick Brown").unwrap();
    assert_eq!(found.kind, MatchKind::Exact);
    assert_eq!(found.matched_text, "QuickBrown");
}

#[test]
fn fuzzy_match_returns_original_substring() {
    let found = locate("caf\u{00e9} report \u{2014} final", "cafe report - final").unwrap();
    assert_eq!(found.kind, MatchKind::Fuzzy);
    assert_eq!(found.matched_text, "caf\u{00e9} report \u{2014} final");
}

#[test]
fn overlapping_ranges_merge() {
    let merged = merge("0123456789", &[range(0, 5), range(3, 8)]);
    assert_eq!(merged.len(), 1);
    assert_eq!((merged[0].start, merged[0].end), (0, 8));
}

#[test]
fn dense_keyword_matches_are_rejected() {
    let text = "a".repeat(100);
    let config = HighlightConfig::default();
    let ranges = [range(0, 20), range(30, 61)];

    let kept = merge_guarded(&text, &ranges, config.density_ceiling(HighlightType::Keyword));
    assert!(kept.is_empty());
}

#[test]
fn two_line_match_yields_two_groups() {
    // content-space runs ending at y=100 and starting at y=130 once flipped
    let spans = [
        VisualSpan::new(88.0, 220.0, 400.0, 100.0),
        VisualSpan::new(130.0, 36.0, 120.0, 142.0),
    ];
    assert_eq!(group_by_line(&spans, LINE_TOLERANCE).len(), 2);
}

#[test]
fn page_pipeline_from_runs_to_pixels() {
    let page = PageText::new(
        1,
        vec![
            CharacterRun::new("Results are ", 72.0, 500.0, 120.0, 10.0),
            CharacterRun::new("summarized in ", 192.0, 500.0, 140.0, 10.0),
            CharacterRun::new("Table 3.", 72.0, 486.0, 80.0, 10.0),
        ],
    );

    let found = page.locate("summarized in table 3").unwrap();
    assert_eq!(found.matched_text, "summarized in Table 3");

    let bbox = page.highlight_for(&found).unwrap().bbox;
    assert_eq!((bbox.l, bbox.b, bbox.r, bbox.t), (72.0, 486.0, 332.0, 510.0));

    let groups = page.line_groups(&[found], 2.0, 1584.0, LINE_TOLERANCE);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].top, (792.0 - 510.0) * 2.0);
    assert_eq!(groups[1].top, (792.0 - 496.0) * 2.0);
}
