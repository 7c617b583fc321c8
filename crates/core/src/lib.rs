//! Seekmark Core Library
//!
//! Text-to-geometry alignment for search highlighting: normalizes page text,
//! locates phrases in it, and turns the resulting char ranges into content
//! rectangles and per-line overlay groups.

pub mod bbox;
pub mod config;
pub mod error;
pub mod grouping;
pub mod highlight;
pub mod locate;
pub mod merge;
pub mod normalize;
pub mod page;
pub mod runs;

pub use bbox::{compute_bbox, span_rects};
pub use config::HighlightConfig;
pub use error::{ConfigError, HighlightError, HighlightResult};
pub use grouping::{group_by_line, LineGroup, VisualSpan, LINE_TOLERANCE};
pub use highlight::{
    AnchorRegion, Color, Highlight, HighlightType, MatchKind, MatchRange, SemanticMatch,
};
pub use locate::{locate, locate_all, PhraseLocator};
pub use merge::{check_density, highlighted_fraction, merge, merge_guarded};
pub use normalize::{
    char_slice, loose_mapped, normalize_loose, normalize_tight, tight_mapped, NormalizedText,
};
pub use page::PageText;
pub use runs::{CharacterRun, RunIndex, RunPosition};

pub use seekmark_viewer::{to_viewport_pixels, ContentRect, PixelRect};
