//! Line grouping of visual spans
//!
//! A phrase that wraps must render as one overlay per line. Spans whose top
//! edges lie within a small tolerance share a line; each line's overlay is the
//! envelope of its spans.

use seekmark_viewer::PixelRect;
use std::cmp::Ordering;

/// Default vertical tolerance, in layout units
pub const LINE_TOLERANCE: f32 = 5.0;

/// A rendered text-layer span, top-down layout units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualSpan {
    pub top: f32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
}

impl VisualSpan {
    pub fn new(top: f32, left: f32, right: f32, bottom: f32) -> Self {
        Self {
            top,
            left,
            right,
            bottom,
        }
    }
}

impl From<PixelRect> for VisualSpan {
    fn from(rect: PixelRect) -> Self {
        Self {
            top: rect.top,
            left: rect.left,
            right: rect.right(),
            bottom: rect.bottom(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineGroup {
    pub top: f32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub spans: Vec<VisualSpan>,
}

impl LineGroup {
    fn new(span: VisualSpan) -> Self {
        Self {
            top: span.top,
            left: span.left,
            right: span.right,
            bottom: span.bottom,
            spans: vec![span],
        }
    }

    fn absorb(&mut self, span: VisualSpan) {
        self.top = self.top.min(span.top);
        self.left = self.left.min(span.left);
        self.right = self.right.max(span.right);
        self.bottom = self.bottom.max(span.bottom);
        self.spans.push(span);
    }

    pub fn to_pixel_rect(&self) -> PixelRect {
        PixelRect {
            left: self.left,
            top: self.top,
            width: self.right - self.left,
            height: self.bottom - self.top,
        }
    }
}

/// Clusters spans into lines in reading order.
///
/// Spans are sorted top-then-left first, so a group's `top` is the top of its
/// first member and new spans are compared against it.
pub fn group_by_line(spans: &[VisualSpan], tolerance: f32) -> Vec<LineGroup> {
    let mut sorted = spans.to_vec();
    sorted.sort_by(|a, b| match a.top.total_cmp(&b.top) {
        Ordering::Equal => a.left.total_cmp(&b.left),
        other => other,
    });

    let mut groups: Vec<LineGroup> = Vec::new();
    for span in sorted {
        match groups
            .iter_mut()
            .find(|group| (group.top - span.top).abs() < tolerance)
        {
            Some(group) => group.absorb(span),
            None => groups.push(LineGroup::new(span)),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_phrase_yields_two_lines() {
        let spans = vec![
            VisualSpan::new(88.0, 300.0, 420.0, 100.0),
            VisualSpan::new(130.0, 40.0, 180.0, 142.0),
            VisualSpan::new(89.0, 200.0, 300.0, 100.0),
        ];

        let groups = group_by_line(&spans, LINE_TOLERANCE);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].spans.len(), 2);
        assert_eq!((groups[0].left, groups[0].right), (200.0, 420.0));
        assert_eq!((groups[0].top, groups[0].bottom), (88.0, 100.0));

        assert_eq!(groups[1].spans.len(), 1);
        assert_eq!(groups[1].top, 130.0);
    }

    #[test]
    fn test_tolerance_is_exclusive() {
        let spans = vec![
            VisualSpan::new(10.0, 0.0, 10.0, 20.0),
            VisualSpan::new(15.0, 10.0, 20.0, 25.0),
        ];
        assert_eq!(group_by_line(&spans, 5.0).len(), 2);
        assert_eq!(group_by_line(&spans, 5.1).len(), 1);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = VisualSpan::new(10.0, 50.0, 60.0, 20.0);
        let b = VisualSpan::new(11.0, 0.0, 40.0, 21.0);
        let c = VisualSpan::new(40.0, 0.0, 30.0, 50.0);

        let forward = group_by_line(&[a, b, c], LINE_TOLERANCE);
        let backward = group_by_line(&[c, b, a], LINE_TOLERANCE);
        assert_eq!(forward, backward);
        assert_eq!(forward[0].spans[0], a);
    }

    #[test]
    fn test_group_pixel_rect() {
        let groups = group_by_line(&[VisualSpan::new(5.0, 10.0, 30.0, 17.0)], LINE_TOLERANCE);
        let rect = groups[0].to_pixel_rect();
        assert_eq!(rect, PixelRect { left: 10.0, top: 5.0, width: 20.0, height: 12.0 });
        assert!(group_by_line(&[], LINE_TOLERANCE).is_empty());
    }
}
