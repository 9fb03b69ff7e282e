// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural diff between two shadow trees.
//!
//! [`diff`] compares an old and a new root and returns the ordered list of
//! [`ShadowViewMutation`]s that turns a view hierarchy mounted from the old
//! tree into one matching the new tree.
//!
//! # Matching
//!
//! Children are matched by family (tag), never by position. For each pair of
//! matched parents the differ walks the common prefix of both child lists,
//! then runs a two-pointer pass over the remainder:
//!
//! - a child present only in the old list is removed (and, unless it moved to
//!   another parent, torn down);
//! - a child present only in the new list is inserted (and, unless it came
//!   from another parent, created);
//! - a child present in both lists but out of order is removed and later
//!   reinserted at its new index, keeping its native view.
//!
//! Matched nodes emit an `Update` when their [`ShadowView`]s differ, and are
//! recursed into. Subtrees shared by pointer between both trees are skipped
//! entirely.
//!
//! With [`DiffOptions::detect_reparenting`], matching additionally consults
//! whole-tree family tables, so a node moved to a different parent becomes a
//! `Remove` from the old parent plus an `Insert` into the new one instead of a
//! `Delete`/`Create` pair.
//!
//! # Ordering
//!
//! The result is always, in this order:
//!
//! 1. removes (`Remove` and `RemoveDeleteTree`), children before their
//!    ancestors and in descending index order per parent;
//! 2. deletes;
//! 3. updates;
//! 4. creates, parents before children;
//! 5. inserts, in ascending index order per parent.
//!
//! Applying the list front to back is valid against the old hierarchy, and
//! diffing is deterministic for a given pair of trees.

mod buffer;
mod options;

pub use options::{DiffOptions, MountingCapabilities};

use hashbrown::{HashMap, HashSet};

use self::buffer::MutationBuffer;
use crate::id::Tag;
use crate::mutation::ShadowViewMutationList;
use crate::node::ShadowNode;
use crate::view::ShadowView;

/// Computes the mutations that turn `old_root` into `new_root`.
///
/// Both roots must belong to the same family.
#[must_use]
pub fn diff(
    old_root: &ShadowNode,
    new_root: &ShadowNode,
    options: DiffOptions,
) -> ShadowViewMutationList {
    if std::ptr::eq(old_root, new_root) {
        return Vec::new();
    }
    debug_assert!(
        old_root.same_family(new_root),
        "cannot diff trees with different root families"
    );

    let mut differ = Differ::new(old_root, new_root, options);
    differ.match_nodes(None, old_root, new_root);

    let caps = options.capabilities;
    differ
        .buffer
        .finish(caps.recursive_teardown && caps.omit_redundant_operations)
}

/// How a child left its parent's list.
#[derive(Clone, Copy, Debug)]
enum Removal {
    /// Not among the parent's new children.
    Gone,
    /// Reinserted into the same parent at a later index.
    Moved,
}

struct Differ<'a> {
    options: DiffOptions,
    /// Every old node by tag; empty without reparenting detection.
    old_families: HashMap<Tag, &'a ShadowNode>,
    /// Every tag of the new tree; empty without reparenting detection.
    new_families: HashSet<Tag>,
    buffer: MutationBuffer,
}

impl<'a> Differ<'a> {
    fn new(old_root: &'a ShadowNode, new_root: &'a ShadowNode, options: DiffOptions) -> Self {
        let (old_families, new_families) = if options.detect_reparenting {
            (
                subtree(old_root).map(|node| (node.tag(), node)).collect(),
                subtree(new_root).map(ShadowNode::tag).collect(),
            )
        } else {
            (HashMap::new(), HashSet::new())
        };
        Self {
            options,
            old_families,
            new_families,
            buffer: MutationBuffer::default(),
        }
    }

    /// Diffs two snapshots of the same element.
    fn match_nodes(&mut self, parent: Option<&ShadowView>, old: &'a ShadowNode, new: &'a ShadowNode) {
        if std::ptr::eq(old, new) {
            return;
        }
        let old_view = ShadowView::new(old);
        let new_view = ShadowView::new(new);
        if old_view != new_view {
            self.buffer
                .update(parent.cloned(), old_view.clone(), new_view.clone());
        }
        if !std::ptr::eq(old.children(), new.children()) {
            self.diff_children(old, &old_view, new, &new_view);
        }
    }

    fn diff_children(
        &mut self,
        old_parent: &'a ShadowNode,
        old_view: &ShadowView,
        new_parent: &'a ShadowNode,
        new_view: &ShadowView,
    ) {
        let old = old_parent.children();
        let new = new_parent.children();

        let mut start = 0;
        while start < old.len() && start < new.len() && old[start].tag() == new[start].tag() {
            self.match_nodes(Some(new_view), &old[start], &new[start]);
            start += 1;
        }
        if start == old.len() && start == new.len() {
            return;
        }

        let old_tags: HashSet<Tag> = old[start..].iter().map(|n| n.tag()).collect();
        let new_tags: HashSet<Tag> = new[start..].iter().map(|n| n.tag()).collect();
        let mut moved: HashMap<Tag, &'a ShadowNode> = HashMap::new();
        let mut removed: Vec<(usize, &'a ShadowNode, Removal)> = Vec::new();

        let (mut io, mut jn) = (start, start);
        while jn < new.len() {
            let n = &*new[jn];
            if let Some(o) = moved.remove(&n.tag()) {
                self.match_nodes(Some(new_view), o, n);
                self.buffer.insert(new_view.clone(), ShadowView::new(n), jn);
                jn += 1;
                continue;
            }
            if let Some(o) = old.get(io).map(|o| &**o) {
                if o.tag() == n.tag() {
                    self.match_nodes(Some(new_view), o, n);
                    io += 1;
                    jn += 1;
                    continue;
                }
                if !new_tags.contains(&o.tag()) {
                    removed.push((io, o, Removal::Gone));
                    io += 1;
                    continue;
                }
                if old_tags.contains(&n.tag()) {
                    removed.push((io, o, Removal::Moved));
                    moved.insert(o.tag(), o);
                    io += 1;
                    continue;
                }
            }
            self.insert_new(new_view, n, jn);
            jn += 1;
        }
        debug_assert!(moved.is_empty(), "moved child was never reinserted");
        removed.extend(old[io..].iter().enumerate().map(|(k, o)| (io + k, &**o, Removal::Gone)));

        for (index, o, removal) in removed.into_iter().rev() {
            match removal {
                Removal::Moved => {
                    self.buffer
                        .remove(old_view.clone(), ShadowView::new(o), index, false);
                }
                Removal::Gone => self.remove_child(old_view, o, index),
            }
        }
    }

    /// Removes a child that is not among its parent's new children.
    fn remove_child(&mut self, parent: &ShadowView, node: &'a ShadowNode, index: usize) {
        let view = ShadowView::new(node);
        if self.is_reparented_out(node) {
            self.buffer.remove(parent.clone(), view, index, false);
        } else if self.options.capabilities.recursive_teardown {
            self.teardown_children(node, &view, true);
            self.buffer.remove_delete_tree(parent.clone(), view, index);
        } else {
            self.teardown_children(node, &view, false);
            self.buffer.remove(parent.clone(), view.clone(), index, false);
            self.buffer.delete(view, false);
        }
    }

    /// Removes and deletes every descendant of `node`, deepest first.
    ///
    /// Descendants that live on elsewhere in the new tree are only removed,
    /// never flagged redundant.
    fn teardown_children(&mut self, node: &'a ShadowNode, view: &ShadowView, redundant: bool) {
        for (index, child) in node.children().iter().enumerate().rev() {
            let child_view = ShadowView::new(child);
            if self.is_reparented_out(child) {
                self.buffer.remove(view.clone(), child_view, index, false);
                continue;
            }
            self.teardown_children(child, &child_view, redundant);
            self.buffer
                .remove(view.clone(), child_view.clone(), index, redundant);
            self.buffer.delete(child_view, redundant);
        }
    }

    /// Inserts a child that is not among its parent's old children.
    fn insert_new(&mut self, parent: &ShadowView, node: &'a ShadowNode, index: usize) {
        match self.reparented_in(node) {
            Some(old) => self.match_nodes(Some(parent), old, node),
            None => self.create_subtree(node),
        }
        self.buffer.insert(parent.clone(), ShadowView::new(node), index);
    }

    /// Creates `node` and builds its children below it.
    fn create_subtree(&mut self, node: &'a ShadowNode) {
        let view = ShadowView::new(node);
        self.buffer.create(view.clone());
        for (index, child) in node.children().iter().enumerate() {
            self.insert_new(&view, child, index);
        }
    }

    fn is_reparented_out(&self, old: &ShadowNode) -> bool {
        self.options.detect_reparenting && self.new_families.contains(&old.tag())
    }

    fn reparented_in(&self, new: &ShadowNode) -> Option<&'a ShadowNode> {
        if !self.options.detect_reparenting {
            return None;
        }
        self.old_families.get(&new.tag()).copied()
    }
}

/// Iterates `root` and all of its descendants.
fn subtree(root: &ShadowNode) -> impl Iterator<Item = &ShadowNode> {
    std::iter::once(root).chain(root.descendants().map(|node| &**node))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::id::SurfaceId;
    use crate::mutation::ShadowViewMutation;
    use crate::node::{Props, ShadowNodeFamily, ShadowNodeFragment};

    /// Families for tags `0..16`, shared between old and new trees.
    struct Fixture {
        families: Vec<Arc<ShadowNodeFamily>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                families: (0..16)
                    .map(|tag| ShadowNodeFamily::new(Tag(tag), SurfaceId(1), "View"))
                    .collect(),
            }
        }

        fn node(&self, tag: i32, children: Vec<Arc<ShadowNode>>) -> Arc<ShadowNode> {
            let family = Arc::clone(&self.families[usize::try_from(tag).unwrap()]);
            ShadowNode::new(family, ShadowNodeFragment::default().with_children(children))
        }

        fn leaf(&self, tag: i32) -> Arc<ShadowNode> {
            self.node(tag, vec![])
        }
    }

    fn render(mutations: &[ShadowViewMutation]) -> Vec<String> {
        mutations.iter().map(ToString::to_string).collect()
    }

    const BASIC: DiffOptions = DiffOptions::DEFAULT;
    const DETECTING: DiffOptions = DiffOptions::DEFAULT.with_detect_reparenting(true);

    #[test]
    fn identical_roots_produce_nothing() {
        let fx = Fixture::new();
        let root = fx.node(1, vec![fx.leaf(2)]);
        assert!(diff(&root, &root, BASIC).is_empty());

        let clone = root.clone_with(ShadowNodeFragment::default());
        assert!(diff(&root, &clone, BASIC).is_empty());
    }

    #[test]
    fn populating_an_empty_root() {
        let fx = Fixture::new();
        let old = fx.leaf(1);
        let new = fx.node(1, vec![fx.leaf(2), fx.leaf(3)]);
        assert_eq!(
            render(&diff(&old, &new, BASIC)),
            [
                "Create #2 (View)",
                "Create #3 (View)",
                "Insert #2 into #1 at 0",
                "Insert #3 into #1 at 1",
            ]
        );
    }

    #[test]
    fn creates_precede_inserts_for_nested_subtrees() {
        let fx = Fixture::new();
        let old = fx.leaf(1);
        let new = fx.node(1, vec![fx.node(2, vec![fx.leaf(3)])]);
        assert_eq!(
            render(&diff(&old, &new, BASIC)),
            [
                "Create #2 (View)",
                "Create #3 (View)",
                "Insert #3 into #2 at 0",
                "Insert #2 into #1 at 0",
            ]
        );
    }

    #[test]
    fn removing_a_middle_child() {
        let fx = Fixture::new();
        let (a, b, c) = (fx.leaf(2), fx.leaf(3), fx.leaf(4));
        let old = fx.node(1, vec![Arc::clone(&a), b, Arc::clone(&c)]);
        let new = fx.node(1, vec![a, c]);
        assert_eq!(
            render(&diff(&old, &new, BASIC)),
            ["Remove #3 from #1 at 1", "Delete #3"]
        );
    }

    #[test]
    fn removes_are_descending_per_parent() {
        let fx = Fixture::new();
        let old = fx.node(1, vec![fx.leaf(2), fx.leaf(3), fx.leaf(4)]);
        let new = fx.leaf(1);
        assert_eq!(
            render(&diff(&old, &new, BASIC)),
            [
                "Remove #4 from #1 at 2",
                "Remove #3 from #1 at 1",
                "Remove #2 from #1 at 0",
                "Delete #4",
                "Delete #3",
                "Delete #2",
            ]
        );
    }

    #[test]
    fn changed_props_emit_update() {
        let fx = Fixture::new();
        let b = fx.leaf(3);
        let old = fx.node(1, vec![fx.leaf(2), Arc::clone(&b)]);
        let b2 = b.clone_with(ShadowNodeFragment::default().with_props(Props::new(7_u32)));
        let new = old.clone_tree(b.family(), |_| b2).unwrap();

        let mutations = diff(&old, &new, BASIC);
        assert_eq!(render(&mutations), ["Update #3"]);
        let ShadowViewMutation::Update { parent, .. } = &mutations[0] else {
            panic!("expected an update");
        };
        assert_eq!(parent.as_ref().map(|p| p.tag), Some(Tag(1)));
    }

    #[test]
    fn root_update_has_no_parent() {
        let fx = Fixture::new();
        let old = fx.leaf(1);
        let new = old.clone_with(ShadowNodeFragment::default().with_props(Props::new(())));
        let mutations = diff(&old, &new, BASIC);
        assert_eq!(mutations.len(), 1);
        assert!(mutations[0].parent().is_none());
    }

    #[test]
    fn reordering_keeps_views() {
        let fx = Fixture::new();
        let (a, b, c) = (fx.leaf(2), fx.leaf(3), fx.leaf(4));
        let old = fx.node(1, vec![Arc::clone(&a), Arc::clone(&b), Arc::clone(&c)]);
        let new = fx.node(1, vec![c, a, b]);
        assert_eq!(
            render(&diff(&old, &new, BASIC)),
            [
                "Remove #3 from #1 at 1",
                "Remove #2 from #1 at 0",
                "Insert #2 into #1 at 1",
                "Insert #3 into #1 at 2",
            ]
        );
    }

    #[test]
    fn reparenting_is_a_move_when_detected() {
        let fx = Fixture::new();
        let x = fx.leaf(5);
        let old = fx.node(1, vec![fx.node(2, vec![Arc::clone(&x)]), fx.leaf(3)]);
        let new = fx.node(1, vec![fx.leaf(2), fx.node(3, vec![x])]);
        assert_eq!(
            render(&diff(&old, &new, DETECTING)),
            ["Remove #5 from #2 at 0", "Insert #5 into #3 at 0"]
        );
    }

    #[test]
    fn reparenting_recreates_by_default() {
        let fx = Fixture::new();
        let x = fx.leaf(5);
        let old = fx.node(1, vec![fx.node(2, vec![Arc::clone(&x)]), fx.leaf(3)]);
        let new = fx.node(1, vec![fx.leaf(2), fx.node(3, vec![x])]);
        assert!(!DiffOptions::default().detect_reparenting);
        assert_eq!(
            render(&diff(&old, &new, DiffOptions::default())),
            [
                "Remove #5 from #2 at 0",
                "Delete #5",
                "Create #5 (View)",
                "Insert #5 into #3 at 0",
            ]
        );
    }

    #[test]
    fn reparented_node_is_diffed_against_its_old_self() {
        let fx = Fixture::new();
        let x = fx.node(5, vec![fx.leaf(6)]);
        let old = fx.node(1, vec![fx.node(2, vec![Arc::clone(&x)]), fx.leaf(3)]);
        let x2 = x.clone_with(
            ShadowNodeFragment::default()
                .with_props(Props::new(1_u8))
                .with_children(vec![]),
        );
        let new = fx.node(1, vec![fx.leaf(2), fx.node(3, vec![x2])]);
        assert_eq!(
            render(&diff(&old, &new, DETECTING)),
            [
                "Remove #5 from #2 at 0",
                "Remove #6 from #5 at 0",
                "Delete #6",
                "Update #5",
                "Insert #5 into #3 at 0",
            ]
        );
    }

    #[test]
    fn recursive_teardown_flags_subsumed_operations() {
        let fx = Fixture::new();
        let old = fx.node(1, vec![fx.node(2, vec![fx.node(3, vec![fx.leaf(4)])])]);
        let new = fx.leaf(1);
        let options = DiffOptions::DEFAULT.with_capabilities(MountingCapabilities::RECURSIVE_TEARDOWN);
        assert_eq!(
            render(&diff(&old, &new, options)),
            [
                "Remove #4 from #3 at 0 (redundant)",
                "Remove #3 from #2 at 0 (redundant)",
                "RemoveDeleteTree #2 from #1 at 0",
                "Delete #4 (redundant)",
                "Delete #3 (redundant)",
            ]
        );

        let omitting = DiffOptions::DEFAULT.with_capabilities(
            MountingCapabilities::RECURSIVE_TEARDOWN.with_omit_redundant_operations(true),
        );
        assert_eq!(
            render(&diff(&old, &new, omitting)),
            ["RemoveDeleteTree #2 from #1 at 0"]
        );
    }

    #[test]
    fn teardown_keeps_reparented_descendants() {
        let fx = Fixture::new();
        let x = fx.leaf(4);
        let old = fx.node(1, vec![fx.node(2, vec![fx.leaf(3), Arc::clone(&x)])]);
        let new = fx.node(1, vec![x]);
        let options = DETECTING.with_capabilities(
            MountingCapabilities::RECURSIVE_TEARDOWN.with_omit_redundant_operations(true),
        );
        assert_eq!(
            render(&diff(&old, &new, options)),
            [
                "Remove #4 from #2 at 1",
                "RemoveDeleteTree #2 from #1 at 0",
                "Insert #4 into #1 at 0",
            ]
        );
    }

    #[test]
    fn shared_subtrees_are_skipped() {
        let fx = Fixture::new();
        let shared = fx.node(2, vec![fx.leaf(3), fx.leaf(4)]);
        let old = fx.node(1, vec![Arc::clone(&shared), fx.leaf(5)]);
        let new = fx.node(1, vec![shared, fx.leaf(5)]);
        assert!(diff(&old, &new, BASIC).is_empty());
    }

    #[test]
    fn diffing_is_deterministic() {
        let fx = Fixture::new();
        let old = fx.node(
            1,
            vec![fx.node(2, vec![fx.leaf(3), fx.leaf(4)]), fx.leaf(5), fx.leaf(6)],
        );
        let new = fx.node(
            1,
            vec![fx.leaf(6), fx.node(7, vec![fx.leaf(4)]), fx.leaf(2), fx.leaf(8)],
        );
        for detect in [false, true] {
            let options = DiffOptions::DEFAULT.with_detect_reparenting(detect);
            assert_eq!(diff(&old, &new, options), diff(&old, &new, options));
        }
    }
}
