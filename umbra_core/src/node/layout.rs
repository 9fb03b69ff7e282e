// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout metrics written by an external layout engine.

use kurbo::{Insets, Rect};

/// How a node participates in layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DisplayType {
    /// The node is laid out but produces no visible box.
    None,
    /// Regular flex box.
    #[default]
    Flex,
    /// Inline content (e.g. text runs).
    Inline,
}

/// Resolved writing direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutDirection {
    /// Not yet resolved.
    #[default]
    Undefined,
    /// Left to right.
    LeftToRight,
    /// Right to left.
    RightToLeft,
}

/// Geometry computed for one node.
///
/// `frame` is relative to the parent's origin. Layout metrics are compared by
/// value: any change produces an `Update` mutation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutMetrics {
    /// Frame in the parent's coordinate space.
    pub frame: Rect,
    /// Padding plus border on each edge.
    pub content_insets: Insets,
    /// Border width on each edge.
    pub border_width: Insets,
    /// Display type.
    pub display: DisplayType,
    /// Resolved writing direction.
    pub layout_direction: LayoutDirection,
    /// Device pixels per layout point.
    pub point_scale_factor: f64,
}

impl LayoutMetrics {
    /// Metrics of a node that has not been laid out.
    pub const EMPTY: Self = Self {
        frame: Rect::ZERO,
        content_insets: Insets::ZERO,
        border_width: Insets::ZERO,
        display: DisplayType::Flex,
        layout_direction: LayoutDirection::Undefined,
        point_scale_factor: 1.0,
    };

    /// Returns empty metrics with the given frame.
    #[must_use]
    pub const fn with_frame(frame: Rect) -> Self {
        Self {
            frame,
            ..Self::EMPTY
        }
    }

    /// Returns the content box in the node's own coordinate space.
    #[must_use]
    pub fn content_frame(&self) -> Rect {
        let size = self.frame.size();
        Rect::new(
            self.content_insets.x0,
            self.content_insets.y0,
            size.width - self.content_insets.x1,
            size.height - self.content_insets.y1,
        )
    }
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_frame_subtracts_insets() {
        let metrics = LayoutMetrics {
            content_insets: Insets::new(1.0, 2.0, 3.0, 4.0),
            ..LayoutMetrics::with_frame(Rect::new(10.0, 10.0, 110.0, 60.0))
        };
        assert_eq!(metrics.content_frame(), Rect::new(1.0, 2.0, 97.0, 46.0));
    }
}
