//! Phrase location in page text
//!
//! Matching runs in two passes. The loose pass tolerates punctuation,
//! whitespace and case differences; the tight pass compares letters and
//! digits only. Either way the result is expressed in char offsets of the
//! original, non-normalized page text.

use crate::highlight::{MatchKind, MatchRange};
use crate::normalize::{char_slice, loose_mapped, tight_mapped, NormalizedText};

/// Page text prepared for repeated phrase lookups.
///
/// Normalizing the page is the expensive part, so it happens once per page
/// render rather than once per phrase.
#[derive(Debug, Clone)]
pub struct PhraseLocator {
    text: String,
    char_len: usize,
    loose: NormalizedText,
    tight: NormalizedText,
}

impl PhraseLocator {
    pub fn new(page_text: &str) -> Self {
        Self {
            text: page_text.to_string(),
            char_len: page_text.chars().count(),
            loose: loose_mapped(page_text),
            tight: tight_mapped(page_text),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// First occurrence of `phrase`, exact before fuzzy.
    pub fn locate(&self, phrase: &str) -> Option<MatchRange> {
        let loose_phrase = loose_mapped(phrase);
        if let Some(range) = self.first_in(&self.loose, loose_phrase.as_str(), MatchKind::Exact) {
            return Some(range);
        }

        let tight_phrase = tight_mapped(phrase);
        self.first_in(&self.tight, tight_phrase.as_str(), MatchKind::Fuzzy)
    }

    /// Every non-overlapping occurrence of `phrase`.
    ///
    /// Exact occurrences win outright; fuzzy ones are only searched for when
    /// the loose pass finds nothing.
    pub fn locate_all(&self, phrase: &str) -> Vec<MatchRange> {
        let loose_phrase = loose_mapped(phrase);
        let exact = self.all_in(&self.loose, loose_phrase.as_str(), MatchKind::Exact);
        if !exact.is_empty() {
            return exact;
        }

        let tight_phrase = tight_mapped(phrase);
        self.all_in(&self.tight, tight_phrase.as_str(), MatchKind::Fuzzy)
    }

    fn first_in(&self, haystack: &NormalizedText, needle: &str, kind: MatchKind) -> Option<MatchRange> {
        let start = haystack.find(needle)?;
        self.to_source(haystack, start, needle.chars().count(), kind)
    }

    fn all_in(&self, haystack: &NormalizedText, needle: &str, kind: MatchKind) -> Vec<MatchRange> {
        let needle_len = needle.chars().count();
        let mut ranges = Vec::new();
        let mut from = 0;

        while let Some(start) = haystack.find_from(needle, from) {
            if let Some(range) = self.to_source(haystack, start, needle_len, kind) {
                ranges.push(range);
            }
            from = start + needle_len.max(1);
        }

        ranges
    }

    /// Maps a normalized hit back to the page text.
    ///
    /// For the tight pass this is the classic counting scan: walk the page
    /// text, advance once per char the tight form kept, stop at the hit start,
    /// then continue for the phrase length. The offset map built during
    /// normalization is that scan, precomputed.
    fn to_source(
        &self,
        haystack: &NormalizedText,
        start: usize,
        len: usize,
        kind: MatchKind,
    ) -> Option<MatchRange> {
        let (source_start, source_end) =
            haystack.source_range(start, start + len, self.char_len)?;

        Some(MatchRange::new(
            source_start,
            source_end,
            char_slice(&self.text, source_start, source_end),
            kind,
        ))
    }
}

/// One-shot lookup; prefer [`PhraseLocator`] when locating many phrases.
pub fn locate(page_text: &str, phrase: &str) -> Option<MatchRange> {
    PhraseLocator::new(page_text).locate(phrase)
}

pub fn locate_all(page_text: &str, phrase: &str) -> Vec<MatchRange> {
    PhraseLocator::new(page_text).locate_all(phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_in_plain_text() {
        let range = locate("The Quick Brown Fox", "quick brown").unwrap();
        assert_eq!((range.start, range.end), (4, 15));
        assert_eq!(range.matched_text, "Quick Brown");
        assert_eq!(range.kind, MatchKind::Exact);
    }

    #[test]
    fn test_exact_match_across_fused_words() {
        let range = locate("TheQuickBrownFox jumps", "Quick Brown").unwrap();
        assert_eq!(range.kind, MatchKind::Exact);
        assert_eq!((range.start, range.end), (3, 13));
        assert_eq!(range.matched_text, "QuickBrown");
    }

    #[test]
    fn test_fuzzy_match_reconstructs_original_offsets() {
        let page = "caf\u{00e9} report \u{2014} final";
        let range = locate(page, "cafe report - final").unwrap();
        assert_eq!(range.kind, MatchKind::Fuzzy);
        assert_eq!(range.matched_text, "caf\u{00e9} report \u{2014} final");
        assert_eq!((range.start, range.end), (0, 19));
    }

    #[test]
    fn test_fuzzy_match_mid_text() {
        let page = "Intro: see sec-tion 4.2 (revised)";
        let range = locate(page, "section 42").unwrap();
        assert_eq!(range.kind, MatchKind::Fuzzy);
        assert_eq!(range.matched_text, "sec-tion 4.2");
    }

    #[test]
    fn test_no_match_returns_none() {
        assert!(locate("The Quick Brown Fox", "lazy dog").is_none());
        assert!(locate("The Quick Brown Fox", "").is_none());
        assert!(locate("The Quick Brown Fox", " ... ").is_none());
        assert!(locate("", "fox").is_none());
    }

    #[test]
    fn test_loose_handles_punctuation_and_quotes() {
        let page = "He said \u{201C}stop,now\u{201D} twice.";
        let range = locate(page, "\"stop, now\"").unwrap();
        assert_eq!(range.kind, MatchKind::Exact);
        assert_eq!(range.matched_text, "\u{201C}stop,now\u{201D}");
    }

    #[test]
    fn test_match_ending_at_text_end_is_clamped() {
        let page = "ends with Fox";
        let range = locate(page, "fox").unwrap();
        assert_eq!(range.end, page.chars().count());
    }

    #[test]
    fn test_locate_all_finds_every_occurrence() {
        let locator = PhraseLocator::new("fox and Fox and FOX");
        let ranges = locator.locate_all("fox");
        let starts: Vec<usize> = ranges.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![0, 8, 16]);
        assert!(ranges.iter().all(|r| r.kind == MatchKind::Exact));
    }

    #[test]
    fn test_locate_all_falls_back_to_fuzzy() {
        let locator = PhraseLocator::new("e-mail, then E.Mail");
        let ranges = locator.locate_all("email");
        assert_eq!(ranges.len(), 2);
        assert!(ranges.iter().all(|r| r.kind == MatchKind::Fuzzy));
        assert_eq!(ranges[0].matched_text, "e-mail");
        assert_eq!(ranges[1].matched_text, "E.Mail");
    }

    #[test]
    fn test_locate_all_does_not_overlap() {
        let ranges = locate_all("aaaa", "aa");
        assert_eq!(ranges.len(), 2);
        assert_eq!((ranges[0].start, ranges[1].start), (0, 2));
    }
}
