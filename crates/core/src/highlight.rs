//! Match and highlight data model
//!
//! Offsets are char offsets into a page's full text. Rectangles are in page
//! content units; pixel conversion happens at the overlay boundary.

use seekmark_viewer::ContentRect;
use serde::{Deserialize, Serialize};

/// Where a match came from.
///
/// The kind drives the overlay colour and decides which tag survives when
/// ranges from different sources are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Found after loose normalization
    Exact,
    /// Found only after tight normalization
    Fuzzy,
    /// Phrase returned by the semantic service
    Semantic,
    /// Stored chunk bounding box
    Anchor,
}

impl MatchKind {
    /// Lower rank means higher confidence.
    pub fn rank(self) -> u8 {
        match self {
            Self::Exact => 0,
            Self::Fuzzy => 1,
            Self::Semantic => 2,
            Self::Anchor => 3,
        }
    }

    pub fn stronger(self, other: MatchKind) -> MatchKind {
        if other.rank() < self.rank() {
            other
        } else {
            self
        }
    }

    pub fn is_text_match(self) -> bool {
        matches!(self, Self::Exact | Self::Fuzzy)
    }

    pub fn overlay_color(self) -> Color {
        match self {
            Self::Exact => Color::EXACT,
            Self::Fuzzy => Color::FUZZY,
            Self::Semantic => Color::SEMANTIC,
            Self::Anchor => Color::ANCHOR,
        }
    }
}

/// A `[start, end)` char range into a page's full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRange {
    pub start: usize,
    pub end: usize,
    pub matched_text: String,
    pub kind: MatchKind,
}

impl MatchRange {
    pub fn new(start: usize, end: usize, matched_text: impl Into<String>, kind: MatchKind) -> Self {
        Self {
            start,
            end,
            matched_text: matched_text.into(),
            kind,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn with_kind(mut self, kind: MatchKind) -> Self {
        self.kind = kind;
        self
    }
}

/// The externally consumed highlight unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub page: u32,
    pub bbox: ContentRect,
    pub text: String,
    pub is_text_match: bool,
}

/// Which matching the semantic service should perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightType {
    Keyword,
    Semantic,
    #[default]
    Both,
}

impl HighlightType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Semantic => "semantic",
            Self::Both => "both",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keyword" => Some(Self::Keyword),
            "semantic" => Some(Self::Semantic),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

/// A phrase the semantic service matched inside an anchor's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticMatch {
    pub matched_text: String,
    pub similarity: Option<f32>,
}

impl SemanticMatch {
    pub fn new(matched_text: impl Into<String>) -> Self {
        Self {
            matched_text: matched_text.into(),
            similarity: None,
        }
    }
}

/// A stored chunk bounding box that semantic highlighting is evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorRegion {
    pub page: u32,
    pub bbox: ContentRect,
    pub text: String,
}

impl AnchorRegion {
    pub fn new(page: u32, bbox: ContentRect, text: impl Into<String>) -> Self {
        Self {
            page,
            bbox,
            text: text.into(),
        }
    }

    pub fn highlight(&self) -> Highlight {
        Highlight {
            page: self.page,
            bbox: self.bbox,
            text: self.text.clone(),
            is_text_match: false,
        }
    }
}

/// RGBA overlay colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to normalized RGBA values (0.0 to 1.0)
    pub fn to_normalized(&self) -> (f32, f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }
}

impl Color {
    pub const EXACT: Color = Color { r: 255, g: 214, b: 0, a: 110 };
    pub const FUZZY: Color = Color { r: 255, g: 170, b: 0, a: 90 };
    pub const SEMANTIC: Color = Color { r: 80, g: 160, b: 255, a: 80 };
    pub const ANCHOR: Color = Color { r: 120, g: 120, b: 120, a: 40 };
}
