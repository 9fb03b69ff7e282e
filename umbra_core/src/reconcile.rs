// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-revision state reconciliation.
//!
//! A transform may build its new tree from an outdated snapshot, so some of
//! its nodes can carry states older than their family's most recent one.
//! [`progress_state`] brings every such node up to date before the tree is
//! committed.

use std::sync::Arc;

use crate::node::{ShadowNode, ShadowNodeFragment, State};

/// Returns `root` with every outdated state replaced by its family's most
/// recent state.
///
/// Nodes are cloned along the paths to outdated states only; subtrees shared
/// with `old_root` at the same position are assumed current and skipped.
/// Returns `root` itself when nothing is outdated.
#[must_use]
pub fn progress_state(root: &Arc<ShadowNode>, old_root: &ShadowNode) -> Arc<ShadowNode> {
    progress(root, Some(old_root)).unwrap_or_else(|| Arc::clone(root))
}

fn progress(node: &Arc<ShadowNode>, old: Option<&ShadowNode>) -> Option<Arc<ShadowNode>> {
    if old.is_some_and(|old| std::ptr::eq(old, node.as_ref())) {
        return None;
    }

    let newer_state = node.state().and_then(|state| newer(state));

    let mut children: Option<Vec<Arc<ShadowNode>>> = None;
    for (index, child) in node.children().iter().enumerate() {
        let old_child = old
            .and_then(|old| old.children().get(index))
            .filter(|old_child| old_child.same_family(child))
            .map(|old_child| &**old_child);
        if let Some(updated) = progress(child, old_child) {
            children.get_or_insert_with(|| node.children().to_vec())[index] = updated;
        }
    }

    if newer_state.is_none() && children.is_none() {
        return None;
    }
    let mut fragment = ShadowNodeFragment::default();
    fragment.state = newer_state;
    fragment.children = children;
    Some(node.clone_with(fragment))
}

fn newer(state: &State) -> Option<Arc<State>> {
    state
        .most_recent()
        .filter(|recent| recent.generation() > state.generation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{SurfaceId, Tag};
    use crate::node::ShadowNodeFamily;

    #[test]
    fn outdated_states_are_progressed() {
        let root_family = ShadowNodeFamily::new(Tag(1), SurfaceId(1), "Root");
        let text = ShadowNodeFamily::new(Tag(2), SurfaceId(1), "Text");
        let other = ShadowNodeFamily::new(Tag(3), SurfaceId(1), "View");

        let s1 = text.new_state("first");
        let stale = ShadowNode::new(
            Arc::clone(&text),
            ShadowNodeFragment::default().with_state(Arc::clone(&s1)),
        );
        let untouched = ShadowNode::new(other, ShadowNodeFragment::default());
        let root = ShadowNode::new(
            root_family,
            ShadowNodeFragment::default().with_children(vec![stale, Arc::clone(&untouched)]),
        );

        let s2 = text.new_state("second");
        assert!(text.set_most_recent_state(Arc::clone(&s2)));

        let empty_old = root.clone_with(ShadowNodeFragment::default().with_children(vec![]));
        let progressed = progress_state(&root, &empty_old);
        let state = progressed.children()[0].state().unwrap();
        assert!(Arc::ptr_eq(state, &s2));
        assert!(Arc::ptr_eq(&progressed.children()[1], &untouched));
    }

    #[test]
    fn current_trees_are_returned_unchanged() {
        let family = ShadowNodeFamily::new(Tag(1), SurfaceId(1), "Root");
        let state = family.new_state(1_u8);
        let root = ShadowNode::new(
            Arc::clone(&family),
            ShadowNodeFragment::default().with_state(state),
        );
        let old = root.clone_with(ShadowNodeFragment::default());
        assert!(Arc::ptr_eq(&progress_state(&root, &old), &root));
        assert!(Arc::ptr_eq(&progress_state(&root, &root), &root));
    }
}
