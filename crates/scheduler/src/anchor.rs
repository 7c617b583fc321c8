//! Anchor identity and processing state

use seekmark_core::{AnchorRegion, ContentRect};
use std::fmt;

/// Stable key of one anchor region: `page-left-top-right-bottom`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnchorKey(String);

impl AnchorKey {
    pub fn new(page: u32, bbox: &ContentRect) -> Self {
        Self(format!("{}-{}-{}-{}-{}", page, bbox.l, bbox.t, bbox.r, bbox.b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&AnchorRegion> for AnchorKey {
    fn from(anchor: &AnchorRegion) -> Self {
        Self::new(anchor.page, &anchor.bbox)
    }
}

impl fmt::Display for AnchorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Semantic matching state of an anchor.
///
/// A failed request returns the anchor to `Unprocessed` so the next render can
/// retry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorState {
    #[default]
    Unprocessed,
    Pending,
    Applied,
}

/// What happened to a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Overlays replaced; holds the number of line groups inserted
    Applied(usize),
    /// Service error; anchor is retryable
    Failed,
    /// Page unmounted or reset while the request was in flight
    Stale,
}
