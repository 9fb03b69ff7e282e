// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::mutation::ShadowViewMutation;
use crate::view::ShadowView;

/// Mutations grouped by the phase in which they must be applied.
///
/// Flattening yields removes, deletes, updates, creates, then inserts. Within
/// each bucket, mutations keep the order in which they were pushed.
#[derive(Debug, Default)]
pub(super) struct MutationBuffer {
    removes: Vec<ShadowViewMutation>,
    deletes: Vec<ShadowViewMutation>,
    updates: Vec<ShadowViewMutation>,
    creates: Vec<ShadowViewMutation>,
    inserts: Vec<ShadowViewMutation>,
}

impl MutationBuffer {
    pub(super) fn create(&mut self, new_child: ShadowView) {
        self.creates.push(ShadowViewMutation::Create { new_child });
    }

    pub(super) fn delete(&mut self, old_child: ShadowView, redundant: bool) {
        self.deletes.push(ShadowViewMutation::Delete {
            old_child,
            redundant,
        });
    }

    pub(super) fn insert(&mut self, parent: ShadowView, new_child: ShadowView, index: usize) {
        self.inserts.push(ShadowViewMutation::Insert {
            parent,
            new_child,
            index,
        });
    }

    pub(super) fn remove(
        &mut self,
        parent: ShadowView,
        old_child: ShadowView,
        index: usize,
        redundant: bool,
    ) {
        self.removes.push(ShadowViewMutation::Remove {
            parent,
            old_child,
            index,
            redundant,
        });
    }

    pub(super) fn remove_delete_tree(
        &mut self,
        parent: ShadowView,
        old_child: ShadowView,
        index: usize,
    ) {
        self.removes.push(ShadowViewMutation::RemoveDeleteTree {
            parent,
            old_child,
            index,
        });
    }

    pub(super) fn update(
        &mut self,
        parent: Option<ShadowView>,
        old_child: ShadowView,
        new_child: ShadowView,
    ) {
        self.updates.push(ShadowViewMutation::Update {
            parent,
            old_child,
            new_child,
        });
    }

    /// Flattens the buckets into the final edit script.
    pub(super) fn finish(self, omit_redundant: bool) -> Vec<ShadowViewMutation> {
        let len = self.removes.len()
            + self.deletes.len()
            + self.updates.len()
            + self.creates.len()
            + self.inserts.len();
        let mut out = Vec::with_capacity(len);
        for bucket in [
            self.removes,
            self.deletes,
            self.updates,
            self.creates,
            self.inserts,
        ] {
            if omit_redundant {
                out.extend(bucket.into_iter().filter(|m| !m.is_redundant()));
            } else {
                out.extend(bucket);
            }
        }
        out
    }
}
