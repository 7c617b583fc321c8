use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Rectangle in page content units.
///
/// Content space has its origin at the bottom-left of the page with y growing
/// upward, so `t >= b` for any well-formed rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentRect {
    pub l: f32,
    pub b: f32,
    pub r: f32,
    pub t: f32,
}

impl ContentRect {
    pub fn new(l: f32, b: f32, r: f32, t: f32) -> Self {
        Self { l, b, r, t }
    }

    pub fn width(&self) -> f32 {
        self.r - self.l
    }

    pub fn height(&self) -> f32 {
        self.t - self.b
    }

    pub fn is_finite(&self) -> bool {
        self.l.is_finite() && self.b.is_finite() && self.r.is_finite() && self.t.is_finite()
    }

    pub fn union(&self, other: &ContentRect) -> ContentRect {
        ContentRect {
            l: self.l.min(other.l),
            b: self.b.min(other.b),
            r: self.r.max(other.r),
            t: self.t.max(other.t),
        }
    }

    pub fn intersects(&self, other: &ContentRect) -> bool {
        !(self.r < other.l || other.r < self.l || self.t < other.b || other.t < self.b)
    }
}

/// Rectangle in overlay pixels, origin at the top-left of the page raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Converts a content-space rectangle to overlay pixels.
///
/// `viewport_height` is the page raster height in pixels at `scale`. Content
/// space is bottom-up while the overlay is top-down, hence the flip against
/// `viewport_height / scale`.
pub fn to_viewport_pixels(bbox: &ContentRect, scale: f32, viewport_height: f32) -> PixelRect {
    let page_height = if scale > 0.0 { viewport_height / scale } else { 0.0 };

    PixelRect {
        left: bbox.l * scale,
        top: (page_height - bbox.t) * scale,
        width: (bbox.r - bbox.l) * scale,
        height: (bbox.t - bbox.b) * scale,
    }
}

/// Scroll position and page layout of the viewer, in pixels at the current scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    pub viewport_height_px: f32,
    pub scroll_offset_px: f32,
    pub page_heights_px: Vec<f32>,
    pub page_spacing_px: f32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            viewport_height_px: 800.0,
            scroll_offset_px: 0.0,
            page_heights_px: vec![1000.0],
            page_spacing_px: 16.0,
        }
    }
}

impl ViewportState {
    pub fn page_count(&self) -> u32 {
        self.page_heights_px.len() as u32
    }

    pub fn page_height_px(&self, page_index: u32) -> Option<f32> {
        self.page_heights_px.get(page_index as usize).copied()
    }
}

pub fn visible_pages(state: &ViewportState) -> RangeInclusive<u32> {
    if state.page_heights_px.is_empty() {
        return 0..=0;
    }

    let start = page_at_offset(state.scroll_offset_px.max(0.0), state);
    let end = page_at_offset((state.scroll_offset_px + state.viewport_height_px).max(0.0), state);

    start..=end
}

pub fn prefetch_page_indices(current_page_index: u32, page_count: u32, radius: u32) -> Vec<u32> {
    if page_count == 0 {
        return Vec::new();
    }

    let max = page_count.saturating_sub(1);
    let mut pages = Vec::new();

    for offset in 1..=radius {
        if let Some(lower) = current_page_index.checked_sub(offset) {
            pages.push(lower.min(max));
        }

        let upper = current_page_index.saturating_add(offset);
        if upper <= max {
            pages.push(upper);
        }
    }

    pages
}

/// Pages that should keep a live render context: the visible range plus
/// `buffer` neighbours on either side, sorted and deduplicated.
pub fn render_window(state: &ViewportState, buffer: u32) -> Vec<u32> {
    if state.page_heights_px.is_empty() {
        return Vec::new();
    }

    let visible = visible_pages(state);
    let mut pages: Vec<u32> = visible.clone().collect();
    pages.extend(prefetch_page_indices(*visible.start(), state.page_count(), buffer));
    pages.extend(prefetch_page_indices(*visible.end(), state.page_count(), buffer));
    pages.sort_unstable();
    pages.dedup();
    pages
}

fn page_at_offset(offset: f32, state: &ViewportState) -> u32 {
    let mut cursor = 0.0;

    for (index, page_height) in state.page_heights_px.iter().enumerate() {
        let page_end = cursor + page_height;
        if offset <= page_end {
            return index as u32;
        }

        cursor = page_end + state.page_spacing_px;
    }

    state.page_heights_px.len().saturating_sub(1) as u32
}
