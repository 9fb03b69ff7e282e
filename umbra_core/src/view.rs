// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattened per-node views carried by mutations.

use std::fmt;
use std::sync::Arc;

use crate::id::{SurfaceId, Tag};
use crate::node::{ComponentName, LayoutMetrics, Props, ShadowNode, State};

/// The part of a [`ShadowNode`] a mutation executor needs, without its
/// children.
///
/// Equality compares props and state by identity and layout by value, which
/// is exactly what decides whether an `Update` is required.
#[derive(Clone)]
pub struct ShadowView {
    /// The element's tag.
    pub tag: Tag,
    /// The surface the element belongs to.
    pub surface_id: SurfaceId,
    /// The component name.
    pub component_name: ComponentName,
    /// Props at this revision.
    pub props: Props,
    /// State at this revision, if any.
    pub state: Option<Arc<State>>,
    /// Layout metrics at this revision.
    pub layout: LayoutMetrics,
}

impl ShadowView {
    /// Builds the view of `node`.
    #[must_use]
    pub fn new(node: &ShadowNode) -> Self {
        Self {
            tag: node.tag(),
            surface_id: node.surface_id(),
            component_name: node.component_name(),
            props: node.props().clone(),
            state: node.state().cloned(),
            layout: *node.layout(),
        }
    }
}

impl From<&ShadowNode> for ShadowView {
    fn from(node: &ShadowNode) -> Self {
        Self::new(node)
    }
}

impl PartialEq for ShadowView {
    fn eq(&self, other: &Self) -> bool {
        let same_state = match (&self.state, &other.state) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.tag == other.tag
            && self.surface_id == other.surface_id
            && self.component_name == other.component_name
            && self.props == other.props
            && same_state
            && self.layout == other.layout
    }
}

impl fmt::Debug for ShadowView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowView")
            .field("tag", &self.tag)
            .field("component_name", &self.component_name)
            .field("props", &self.props)
            .field("state", &self.state.as_ref().map(|s| s.generation()))
            .field("frame", &self.layout.frame)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ShadowNodeFamily, ShadowNodeFragment};
    use kurbo::Rect;

    #[test]
    fn equality_tracks_identity_of_props_and_state() {
        let family = ShadowNodeFamily::new(Tag(3), SurfaceId(1), "View");
        let node = ShadowNode::new(
            Arc::clone(&family),
            ShadowNodeFragment::default().with_props(Props::new(1_u8)),
        );
        let same = node.clone_with(ShadowNodeFragment::default());
        assert_eq!(ShadowView::new(&node), ShadowView::new(&same));

        let new_props = node.clone_with(ShadowNodeFragment::default().with_props(Props::new(1_u8)));
        assert_ne!(ShadowView::new(&node), ShadowView::new(&new_props));

        let new_state =
            node.clone_with(ShadowNodeFragment::default().with_state(family.new_state(())));
        assert_ne!(ShadowView::new(&node), ShadowView::new(&new_state));

        let moved = node.clone_with(
            ShadowNodeFragment::default()
                .with_layout(LayoutMetrics::with_frame(Rect::new(1.0, 1.0, 2.0, 2.0))),
        );
        assert_ne!(ShadowView::new(&node), ShadowView::new(&moved));
    }
}
