//! Extracted text runs and the per-page offset→run index
//!
//! Runs arrive from the rendering surface in extraction order. The index maps
//! every char of the concatenated page text back to the run holding it, so
//! any match range can be resolved to run geometry in O(1).

use seekmark_viewer::ContentRect;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// One extracted text fragment with its position in page content units.
///
/// `(x, y)` is the bottom-left origin of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CharacterRun {
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the run carries usable position data.
    pub fn has_geometry(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Uniform per-char advance estimate, 0 for empty runs.
    pub fn char_width(&self) -> f32 {
        match self.char_count() {
            0 => 0.0,
            count => self.width / count as f32,
        }
    }

    pub fn bounds(&self) -> ContentRect {
        ContentRect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// Location of one page char inside the run list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPosition {
    pub run_index: usize,
    pub char_in_run: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunIndex {
    full_text: String,
    entries: Vec<RunPosition>,
}

impl RunIndex {
    /// Concatenates run texts in extraction order, recording one entry per char.
    pub fn build(runs: &[CharacterRun]) -> Self {
        let capacity = runs.iter().map(|run| run.text.len()).sum();
        let mut full_text = String::with_capacity(capacity);
        let mut entries = Vec::with_capacity(capacity);

        for (run_index, run) in runs.iter().enumerate() {
            for (char_in_run, c) in run.text.chars().enumerate() {
                full_text.push(c);
                entries.push(RunPosition {
                    run_index,
                    char_in_run,
                });
            }
        }

        Self { full_text, entries }
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Number of chars in the page text
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, offset: usize) -> Option<RunPosition> {
        self.entries.get(offset).copied()
    }

    /// Positions of the first and last char of `[start, end)`, with `end`
    /// clamped to the page text.
    pub fn span(&self, start: usize, end: usize) -> Option<(RunPosition, RunPosition)> {
        let end = end.min(self.len());
        if start >= end {
            return None;
        }
        Some((self.position(start)?, self.position(end - 1)?))
    }

    /// Run indices touched by `[start, end)`.
    pub fn runs_in(&self, start: usize, end: usize) -> Option<RangeInclusive<usize>> {
        self.span(start, end)
            .map(|(first, last)| first.run_index..=last.run_index)
    }
}
