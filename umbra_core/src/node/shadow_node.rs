// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable shadow nodes and copy-on-write cloning.

use std::fmt;
use std::sync::Arc;

use super::family::{ComponentName, ShadowNodeFamily};
use super::layout::LayoutMetrics;
use super::props::Props;
use super::state::State;
use super::traverse::Descendants;
use crate::id::{SurfaceId, Tag};

/// The parts of a node to set when constructing or cloning it.
///
/// Fields left as `None` default to empty values on construction and to the
/// source node's values (shared, not copied) when cloning.
#[derive(Clone, Debug, Default)]
pub struct ShadowNodeFragment {
    /// New props.
    pub props: Option<Props>,
    /// New state.
    pub state: Option<Arc<State>>,
    /// New layout metrics.
    pub layout: Option<LayoutMetrics>,
    /// New children.
    pub children: Option<Vec<Arc<ShadowNode>>>,
}

impl ShadowNodeFragment {
    /// Sets the props.
    #[must_use]
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = Some(props);
        self
    }

    /// Sets the state.
    #[must_use]
    pub fn with_state(mut self, state: Arc<State>) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the layout metrics.
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutMetrics) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Sets the children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Arc<ShadowNode>>) -> Self {
        self.children = Some(children);
        self
    }
}

/// An immutable snapshot of one UI element at one revision.
///
/// Nodes are always handled through `Arc` and never mutated once built; the
/// child list itself is shared between a node and its clones until one of
/// them is given new children.
///
/// Two children of the same parent never belong to the same family.
pub struct ShadowNode {
    family: Arc<ShadowNodeFamily>,
    props: Props,
    state: Option<Arc<State>>,
    layout: LayoutMetrics,
    children: Arc<[Arc<ShadowNode>]>,
}

impl ShadowNode {
    /// Creates a node of `family` from a fragment.
    ///
    /// A state in the fragment is published as the family's most recent
    /// state if it is newer than the current one.
    #[must_use]
    pub fn new(family: Arc<ShadowNodeFamily>, fragment: ShadowNodeFragment) -> Arc<Self> {
        let children: Arc<[Arc<Self>]> = fragment.children.unwrap_or_default().into();
        debug_assert!(
            has_unique_families(&children),
            "two children of one parent share a family"
        );
        if let Some(state) = &fragment.state {
            family.set_most_recent_state(Arc::clone(state));
        }
        Arc::new(Self {
            family,
            props: fragment.props.unwrap_or_default(),
            state: fragment.state,
            layout: fragment.layout.unwrap_or_default(),
            children,
        })
    }

    /// Returns a clone of this node with the fragment's fields replaced.
    ///
    /// A new state bumps the family's most recent state if it is newer.
    #[must_use]
    pub fn clone_with(&self, fragment: ShadowNodeFragment) -> Arc<Self> {
        let children: Arc<[Arc<Self>]> = match fragment.children {
            Some(children) => {
                debug_assert!(
                    has_unique_families(&children),
                    "two children of one parent share a family"
                );
                children.into()
            }
            None => Arc::clone(&self.children),
        };
        let state = match fragment.state {
            Some(state) => {
                self.family.set_most_recent_state(Arc::clone(&state));
                Some(state)
            }
            None => self.state.clone(),
        };
        Arc::new(Self {
            family: Arc::clone(&self.family),
            props: fragment.props.unwrap_or_else(|| self.props.clone()),
            state,
            layout: fragment.layout.unwrap_or(self.layout),
            children,
        })
    }

    // -- Accessors --

    /// Returns the node's family.
    #[inline]
    #[must_use]
    pub fn family(&self) -> &Arc<ShadowNodeFamily> {
        &self.family
    }

    /// Returns the element's tag.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> Tag {
        self.family.tag()
    }

    /// Returns the surface the element belongs to.
    #[inline]
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.family.surface_id()
    }

    /// Returns the component name.
    #[inline]
    #[must_use]
    pub fn component_name(&self) -> ComponentName {
        self.family.component_name()
    }

    /// Returns the props.
    #[inline]
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Returns the state carried by this snapshot.
    ///
    /// This may be older than the family's most recent state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> Option<&Arc<State>> {
        self.state.as_ref()
    }

    /// Returns the layout metrics.
    #[inline]
    #[must_use]
    pub fn layout(&self) -> &LayoutMetrics {
        &self.layout
    }

    /// Returns the children in order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Arc<Self>] {
        &self.children
    }

    /// Returns whether both nodes are snapshots of the same element.
    #[inline]
    #[must_use]
    pub fn same_family(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.family, &other.family)
    }

    // -- Traversal --

    /// Returns a pre-order iterator over all descendants (excluding `self`).
    #[must_use]
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants::new(&self.children)
    }

    /// Finds the descendant (or `self`) belonging to `family`.
    #[must_use]
    pub fn find<'a>(self: &'a Arc<Self>, family: &ShadowNodeFamily) -> Option<&'a Arc<Self>> {
        if std::ptr::eq(self.family.as_ref(), family) {
            return Some(self);
        }
        self.descendants()
            .find(|node| std::ptr::eq(node.family.as_ref(), family))
    }

    /// Replaces the node of `family` with the result of `f`, cloning every
    /// ancestor on the path and sharing all other subtrees.
    ///
    /// Returns the new root, or `None` if `family` is not part of this tree.
    #[must_use]
    pub fn clone_tree(
        self: &Arc<Self>,
        family: &ShadowNodeFamily,
        f: impl FnOnce(&Arc<Self>) -> Arc<Self>,
    ) -> Option<Arc<Self>> {
        let mut path = Vec::new();
        if !self.path_to(family, &mut path) {
            return None;
        }

        let mut ancestors = Vec::with_capacity(path.len());
        let mut node = self;
        for &index in &path {
            ancestors.push(node);
            node = &node.children[index];
        }

        let mut replaced = f(node);
        debug_assert!(
            replaced.same_family(node),
            "clone_tree callback must return a node of the same family"
        );
        for (ancestor, &index) in ancestors.iter().rev().zip(path.iter().rev()) {
            let mut children = ancestor.children.to_vec();
            children[index] = replaced;
            replaced = ancestor.clone_with(ShadowNodeFragment::default().with_children(children));
        }
        Some(replaced)
    }

    /// Collects the child indices leading from `self` to `family`.
    fn path_to(&self, family: &ShadowNodeFamily, path: &mut Vec<usize>) -> bool {
        if std::ptr::eq(self.family.as_ref(), family) {
            return true;
        }
        for (index, child) in self.children.iter().enumerate() {
            path.push(index);
            if child.path_to(family, path) {
                return true;
            }
            path.pop();
        }
        false
    }
}

impl fmt::Debug for ShadowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowNode")
            .field("tag", &self.tag())
            .field("component_name", &self.component_name())
            .field("props", &self.props)
            .field("state", &self.state)
            .field("layout", &self.layout)
            .field("children", &self.children)
            .finish()
    }
}

fn has_unique_families(children: &[Arc<ShadowNode>]) -> bool {
    let mut seen = hashbrown::HashSet::with_capacity(children.len());
    children
        .iter()
        .all(|child| seen.insert(Arc::as_ptr(&child.family)))
}
