//! Per-page highlight pipeline
//!
//! [`PageText`] owns one page's runs together with the index and locator
//! derived from them. It is rebuilt whenever the page is re-rendered and is the
//! entry point for keyword, semantic and anchor highlighting on that page.
//! Nothing here returns an error to the caller: ranges that cannot be located
//! or measured are skipped.

use crate::bbox::{compute_bbox, span_rects};
use crate::config::HighlightConfig;
use crate::error::{HighlightError, HighlightResult};
use crate::grouping::{group_by_line, LineGroup, VisualSpan};
use crate::highlight::{Highlight, HighlightType, MatchKind, MatchRange, SemanticMatch};
use crate::locate::PhraseLocator;
use crate::merge::merge_guarded;
use crate::runs::{CharacterRun, RunIndex};
use seekmark_viewer::{to_viewport_pixels, ContentRect};

#[derive(Debug, Clone)]
pub struct PageText {
    page: u32,
    runs: Vec<CharacterRun>,
    index: RunIndex,
    locator: PhraseLocator,
}

impl PageText {
    pub fn new(page: u32, runs: Vec<CharacterRun>) -> Self {
        let index = RunIndex::build(&runs);
        let locator = PhraseLocator::new(index.full_text());
        Self {
            page,
            runs,
            index,
            locator,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn runs(&self) -> &[CharacterRun] {
        &self.runs
    }

    pub fn index(&self) -> &RunIndex {
        &self.index
    }

    pub fn full_text(&self) -> &str {
        self.index.full_text()
    }

    pub fn locate(&self, phrase: &str) -> Option<MatchRange> {
        self.locator.locate(phrase)
    }

    /// Sub-page made of the runs that intersect `region`.
    ///
    /// Used to confine semantic phrases to the anchor they were matched in.
    pub fn within(&self, region: &ContentRect) -> PageText {
        let runs = self
            .runs
            .iter()
            .filter(|run| run.has_geometry() && run.bounds().intersects(region))
            .cloned()
            .collect();
        PageText::new(self.page, runs)
    }

    /// Keyword matches for `query`: the whole query plus each term of at least
    /// `min_term_chars` chars, merged and density-checked.
    pub fn keyword_ranges(&self, query: &str, config: &HighlightConfig) -> Vec<MatchRange> {
        let mut phrases: Vec<&str> = Vec::new();
        let query = query.trim();
        if !query.is_empty() {
            phrases.push(query);
        }
        for term in query.split_whitespace() {
            if term.chars().count() >= config.min_term_chars && !phrases.contains(&term) {
                phrases.push(term);
            }
        }

        let ranges: Vec<MatchRange> = phrases
            .iter()
            .flat_map(|phrase| self.locator.locate_all(phrase))
            .collect();

        merge_guarded(
            self.full_text(),
            &ranges,
            config.density_ceiling(HighlightType::Keyword),
        )
    }

    pub fn keyword_highlights(&self, query: &str, config: &HighlightConfig) -> Vec<Highlight> {
        self.keyword_ranges(query, config)
            .iter()
            .filter_map(|range| self.highlight_for(range))
            .collect()
    }

    /// Locates `phrase` and measures it.
    pub fn try_highlight(&self, phrase: &str) -> HighlightResult<Highlight> {
        let range = self.locate(phrase).ok_or(HighlightError::NotFound)?;
        self.highlight_for(&range)
            .ok_or(HighlightError::MissingGeometry {
                start: range.start,
                end: range.end,
            })
    }

    pub fn highlight_for(&self, range: &MatchRange) -> Option<Highlight> {
        let bbox = compute_bbox(&self.runs, &self.index, range)?;
        Some(Highlight {
            page: self.page,
            bbox,
            text: range.matched_text.clone(),
            is_text_match: range.kind.is_text_match(),
        })
    }

    /// Ranges for phrases returned by the semantic service.
    ///
    /// In `Semantic` and `Both` mode every hit is tagged `Semantic`; in
    /// `Keyword` mode the exact/fuzzy tag from location is kept. Phrases that
    /// cannot be found are skipped.
    pub fn phrase_ranges(
        &self,
        matches: &[SemanticMatch],
        mode: HighlightType,
        config: &HighlightConfig,
    ) -> Vec<MatchRange> {
        let ranges: Vec<MatchRange> = matches
            .iter()
            .filter_map(|m| match self.locate(&m.matched_text) {
                Some(range) => Some(range),
                None => {
                    tracing::debug!(page = self.page, phrase = %m.matched_text, "semantic phrase not found");
                    None
                }
            })
            .map(|range| match mode {
                HighlightType::Keyword => range,
                HighlightType::Semantic | HighlightType::Both => range.with_kind(MatchKind::Semantic),
            })
            .collect();

        merge_guarded(self.full_text(), &ranges, config.density_ceiling(mode))
    }

    /// Visual line groups for `ranges` at the given render scale.
    ///
    /// Each range is grouped on its own, so two phrases sharing a line stay
    /// separate overlays while a wrapped phrase yields one group per line.
    pub fn line_groups(
        &self,
        ranges: &[MatchRange],
        scale: f32,
        viewport_height: f32,
        tolerance: f32,
    ) -> Vec<LineGroup> {
        ranges
            .iter()
            .flat_map(|range| {
                let spans: Vec<VisualSpan> = span_rects(&self.runs, &self.index, range)
                    .iter()
                    .map(|rect| VisualSpan::from(to_viewport_pixels(rect, scale, viewport_height)))
                    .collect();
                if spans.is_empty() {
                    tracing::debug!(page = self.page, start = range.start, end = range.end, "range has no geometry");
                }
                group_by_line(&spans, tolerance)
            })
            .collect()
    }
}
