// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Randomized checks that diffs replay correctly on a view hierarchy.

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;
use proptest::sample::Index;
use umbra_backend_stub::StubViewTree;
use umbra_core::differ::{DiffOptions, MountingCapabilities, diff};
use umbra_core::id::{SurfaceId, Tag};
use umbra_core::mutation::{MutationKind, ShadowViewMutation};
use umbra_core::node::{Props, ShadowNode, ShadowNodeFamily, ShadowNodeFragment};

const ROOT: i32 = 1;
const TAGS: std::ops::RangeInclusive<i32> = 2..=13;

/// A random tree: tags are placed in `order`, each under a random node that
/// was placed before it.
#[derive(Clone, Debug)]
struct TreeShape {
    order: Vec<i32>,
    slots: Vec<Slot>,
}

#[derive(Clone, Debug)]
struct Slot {
    parent: Index,
    included: bool,
    edited: bool,
}

fn tree_shape() -> impl Strategy<Value = TreeShape> {
    let slot = (any::<Index>(), prop::bool::weighted(0.8), prop::bool::weighted(0.2)).prop_map(
        |(parent, included, edited)| Slot {
            parent,
            included,
            edited,
        },
    );
    (
        Just(TAGS.collect::<Vec<_>>()).prop_shuffle(),
        prop::collection::vec(slot, TAGS.count()),
    )
        .prop_map(|(order, slots)| TreeShape { order, slots })
}

/// Families and default props shared by every tree of one test case.
struct Fixture {
    families: HashMap<i32, Arc<ShadowNodeFamily>>,
    props: HashMap<i32, Props>,
}

impl Fixture {
    fn new() -> Self {
        let tags = std::iter::once(ROOT).chain(TAGS);
        Self {
            families: tags
                .clone()
                .map(|tag| (tag, ShadowNodeFamily::new(Tag(tag), SurfaceId(1), "View")))
                .collect(),
            props: tags.map(|tag| (tag, Props::new(tag))).collect(),
        }
    }

    fn build(&self, shape: &TreeShape) -> Arc<ShadowNode> {
        let mut placed = vec![ROOT];
        let mut children: HashMap<i32, Vec<i32>> = HashMap::new();
        let mut edited = Vec::new();
        for (&tag, slot) in shape.order.iter().zip(&shape.slots) {
            if !slot.included {
                continue;
            }
            let parent = placed[slot.parent.index(placed.len())];
            children.entry(parent).or_default().push(tag);
            placed.push(tag);
            if slot.edited {
                edited.push(tag);
            }
        }
        self.node(ROOT, &children, &edited)
    }

    fn node(&self, tag: i32, children: &HashMap<i32, Vec<i32>>, edited: &[i32]) -> Arc<ShadowNode> {
        let kids = children
            .get(&tag)
            .map(|tags| tags.iter().map(|&t| self.node(t, children, edited)).collect())
            .unwrap_or_default();
        let props = if edited.contains(&tag) {
            Props::new(tag)
        } else {
            self.props[&tag].clone()
        };
        ShadowNode::new(
            Arc::clone(&self.families[&tag]),
            ShadowNodeFragment::default()
                .with_props(props)
                .with_children(kids),
        )
    }
}

fn all_options() -> Vec<DiffOptions> {
    let capabilities = [
        MountingCapabilities::BASIC,
        MountingCapabilities::RECURSIVE_TEARDOWN,
        MountingCapabilities::RECURSIVE_TEARDOWN.with_omit_redundant_operations(true),
    ];
    [false, true]
        .into_iter()
        .flat_map(|detect| {
            capabilities.into_iter().map(move |caps| {
                DiffOptions::DEFAULT
                    .with_detect_reparenting(detect)
                    .with_capabilities(caps)
            })
        })
        .collect()
}

proptest! {
    #[test]
    fn diff_replays_onto_the_old_hierarchy(old in tree_shape(), new in tree_shape()) {
        let fx = Fixture::new();
        let old = fx.build(&old);
        let new = fx.build(&new);
        let expected = StubViewTree::from_tree(&new);

        for options in all_options() {
            let mut views = StubViewTree::from_tree(&old);
            let mutations = diff(&old, &new, options);
            prop_assert_eq!(views.try_apply(&mutations), Ok(()), "{:?}", options);
            prop_assert_eq!(&views, &expected, "{:?}", options);
        }
    }

    #[test]
    fn mounting_from_empty_matches_the_tree(shape in tree_shape()) {
        let fx = Fixture::new();
        let tree = fx.build(&shape);
        let empty = tree.clone_with(ShadowNodeFragment::default().with_children(Vec::new()));

        for options in all_options() {
            let mut views = StubViewTree::from_tree(&empty);
            prop_assert_eq!(views.try_apply(&diff(&empty, &tree, options)), Ok(()));
            prop_assert_eq!(&views, &StubViewTree::from_tree(&tree));
        }
    }

    #[test]
    fn diffing_is_deterministic(old in tree_shape(), new in tree_shape()) {
        let fx = Fixture::new();
        let old = fx.build(&old);
        let new = fx.build(&new);
        for options in all_options() {
            prop_assert_eq!(diff(&old, &new, options), diff(&old, &new, options));
        }
    }

    #[test]
    fn detected_moves_never_recreate_views(old in tree_shape(), new in tree_shape()) {
        let fx = Fixture::new();
        let old = fx.build(&old);
        let new = fx.build(&new);
        let mutations = diff(&old, &new, DiffOptions::DEFAULT.with_detect_reparenting(true));

        let tags_of = |kind: MutationKind| -> Vec<Tag> {
            mutations
                .iter()
                .filter(|m| m.kind() == kind)
                .map(ShadowViewMutation::tag)
                .collect()
        };
        let deleted = tags_of(MutationKind::Delete);
        for created in tags_of(MutationKind::Create) {
            prop_assert!(!deleted.contains(&created), "{} recreated", created);
        }
    }

    #[test]
    fn omitting_leaves_no_redundant_operations(old in tree_shape(), new in tree_shape()) {
        let fx = Fixture::new();
        let old = fx.build(&old);
        let new = fx.build(&new);
        let options = DiffOptions::DEFAULT.with_capabilities(
            MountingCapabilities::RECURSIVE_TEARDOWN.with_omit_redundant_operations(true),
        );
        prop_assert!(diff(&old, &new, options).iter().all(|m| !m.is_redundant()));
    }
}
