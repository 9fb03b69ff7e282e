// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Strictly validating in-memory executor.

use std::sync::Arc;

use hashbrown::HashMap;
use umbra_core::coordinator::MountingTransaction;
use umbra_core::executor::MutationExecutor;
use umbra_core::id::Tag;
use umbra_core::mutation::ShadowViewMutation;
use umbra_core::node::{ComponentName, LayoutMetrics, Props, ShadowNode, State};
use umbra_core::view::ShadowView;

/// A mutation that is invalid against the current hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StubError {
    /// The mutation refers to a view that does not exist.
    #[error("unknown view {0}")]
    UnknownTag(Tag),
    /// `Create` for a view that already exists.
    #[error("view {0} created twice")]
    DuplicateCreate(Tag),
    /// `Insert` of a view that already has a parent.
    #[error("cannot insert {child} into {parent}: already attached to {current}")]
    InsertAttached {
        /// The view being inserted.
        child: Tag,
        /// The requested parent.
        parent: Tag,
        /// The view's current parent.
        current: Tag,
    },
    /// `Insert` or `Remove` past the end of the parent's child list.
    #[error("index {index} out of range for {parent} with {len} children")]
    IndexOutOfRange {
        /// The parent view.
        parent: Tag,
        /// The requested index.
        index: usize,
        /// The parent's child count.
        len: usize,
    },
    /// `Remove` of a view that is not at the given index.
    #[error("expected {expected} at index {index} of {parent}, found {found}")]
    RemoveMismatch {
        /// The parent view.
        parent: Tag,
        /// The requested index.
        index: usize,
        /// The view the mutation removes.
        expected: Tag,
        /// The view actually at `index`.
        found: Tag,
    },
    /// `Delete` of a view that still has a parent.
    #[error("cannot delete {tag}: still attached to {parent}")]
    DeleteAttached {
        /// The view being deleted.
        tag: Tag,
        /// Its parent.
        parent: Tag,
    },
    /// `Delete` of a view that still has children.
    #[error("cannot delete {tag}: still has {children} children")]
    DeleteNonEmpty {
        /// The view being deleted.
        tag: Tag,
        /// Its child count.
        children: usize,
    },
    /// `Update` whose old view does not match the mounted one.
    #[error("update of {0} does not start from the mounted view")]
    StaleUpdate(Tag),
    /// `Insert` whose view does not match the mounted one.
    #[error("insert of {0} does not carry the mounted view")]
    StaleInsert(Tag),
}

/// One mounted view.
#[derive(Clone, Debug)]
pub struct StubView {
    /// Component name.
    pub component_name: ComponentName,
    /// Mounted props.
    pub props: Props,
    /// Mounted state.
    pub state: Option<Arc<State>>,
    /// Mounted layout.
    pub layout: LayoutMetrics,
    /// Parent, if attached.
    pub parent: Option<Tag>,
    /// Children in order.
    pub children: Vec<Tag>,
}

impl StubView {
    fn detached(view: &ShadowView) -> Self {
        Self {
            component_name: view.component_name,
            props: view.props.clone(),
            state: view.state.clone(),
            layout: view.layout,
            parent: None,
            children: Vec::new(),
        }
    }

    fn set_content(&mut self, view: &ShadowView) {
        self.component_name = view.component_name;
        self.props = view.props.clone();
        self.state = view.state.clone();
        self.layout = view.layout;
    }

    /// Returns whether the mounted content equals `view`'s.
    #[must_use]
    pub fn shows(&self, view: &ShadowView) -> bool {
        self.component_name == view.component_name
            && self.props == view.props
            && same_state(self.state.as_ref(), view.state.as_ref())
            && self.layout == view.layout
    }
}

impl PartialEq for StubView {
    fn eq(&self, other: &Self) -> bool {
        self.component_name == other.component_name
            && self.props == other.props
            && same_state(self.state.as_ref(), other.state.as_ref())
            && self.layout == other.layout
            && self.parent == other.parent
            && self.children == other.children
    }
}

fn same_state(a: Option<&Arc<State>>, b: Option<&Arc<State>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// A view hierarchy kept in memory.
///
/// Two stubs compare equal when they hold the same views with the same
/// content and the same parent/child structure.
#[derive(Clone, Debug)]
pub struct StubViewTree {
    root: Tag,
    views: HashMap<Tag, StubView>,
    transactions_applied: u64,
}

impl StubViewTree {
    /// Creates a hierarchy holding just the root view.
    #[must_use]
    pub fn new(root: &ShadowView) -> Self {
        let mut views = HashMap::new();
        views.insert(root.tag, StubView::detached(root));
        Self {
            root: root.tag,
            views,
            transactions_applied: 0,
        }
    }

    /// Creates the hierarchy a shadow tree describes.
    #[must_use]
    pub fn from_tree(root: &ShadowNode) -> Self {
        let mut stub = Self::new(&ShadowView::new(root));
        stub.add_children(root);
        stub
    }

    fn add_children(&mut self, node: &ShadowNode) {
        let parent = node.tag();
        for child in node.children() {
            let mut view = StubView::detached(&ShadowView::new(child));
            view.parent = Some(parent);
            self.views.insert(child.tag(), view);
            if let Some(parent_view) = self.views.get_mut(&parent) {
                parent_view.children.push(child.tag());
            }
            self.add_children(child);
        }
    }

    /// Returns the root tag.
    #[must_use]
    pub fn root(&self) -> Tag {
        self.root
    }

    /// Returns the view with `tag`.
    #[must_use]
    pub fn get(&self, tag: Tag) -> Option<&StubView> {
        self.views.get(&tag)
    }

    /// Returns the number of views, attached or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Returns whether no view exists, which never holds for a valid stub.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Returns the number of transactions applied through
    /// [`MutationExecutor::apply`].
    #[must_use]
    pub fn transactions_applied(&self) -> u64 {
        self.transactions_applied
    }

    /// Applies `mutations` in order, stopping at the first invalid one.
    ///
    /// Mutations before the invalid one stay applied.
    pub fn try_apply(&mut self, mutations: &[ShadowViewMutation]) -> Result<(), StubError> {
        mutations.iter().try_for_each(|m| self.try_apply_one(m))
    }

    /// Applies one mutation.
    pub fn try_apply_one(&mut self, mutation: &ShadowViewMutation) -> Result<(), StubError> {
        match mutation {
            ShadowViewMutation::Create { new_child } => {
                if self.views.contains_key(&new_child.tag) {
                    return Err(StubError::DuplicateCreate(new_child.tag));
                }
                self.views
                    .insert(new_child.tag, StubView::detached(new_child));
            }
            ShadowViewMutation::Delete { old_child, .. } => self.delete(old_child.tag)?,
            ShadowViewMutation::Insert {
                parent,
                new_child,
                index,
            } => self.insert(parent.tag, new_child, *index)?,
            ShadowViewMutation::Remove {
                parent,
                old_child,
                index,
                ..
            } => self.remove(parent.tag, old_child.tag, *index)?,
            ShadowViewMutation::Update {
                old_child,
                new_child,
                ..
            } => {
                let view = self.view_mut(old_child.tag)?;
                if !view.shows(old_child) {
                    return Err(StubError::StaleUpdate(old_child.tag));
                }
                view.set_content(new_child);
            }
            ShadowViewMutation::RemoveDeleteTree {
                parent,
                old_child,
                index,
            } => {
                self.remove(parent.tag, old_child.tag, *index)?;
                self.delete_tree(old_child.tag);
            }
        }
        Ok(())
    }

    fn view_mut(&mut self, tag: Tag) -> Result<&mut StubView, StubError> {
        self.views.get_mut(&tag).ok_or(StubError::UnknownTag(tag))
    }

    fn insert(&mut self, parent: Tag, child: &ShadowView, index: usize) -> Result<(), StubError> {
        let child_view = self
            .views
            .get(&child.tag)
            .ok_or(StubError::UnknownTag(child.tag))?;
        if let Some(current) = child_view.parent {
            return Err(StubError::InsertAttached {
                child: child.tag,
                parent,
                current,
            });
        }
        if !child_view.shows(child) {
            return Err(StubError::StaleInsert(child.tag));
        }

        let parent_view = self.view_mut(parent)?;
        let len = parent_view.children.len();
        if index > len {
            return Err(StubError::IndexOutOfRange { parent, index, len });
        }
        parent_view.children.insert(index, child.tag);
        self.view_mut(child.tag)?.parent = Some(parent);
        Ok(())
    }

    fn remove(&mut self, parent: Tag, child: Tag, index: usize) -> Result<(), StubError> {
        if !self.views.contains_key(&child) {
            return Err(StubError::UnknownTag(child));
        }
        let parent_view = self.view_mut(parent)?;
        let len = parent_view.children.len();
        let found = *parent_view
            .children
            .get(index)
            .ok_or(StubError::IndexOutOfRange { parent, index, len })?;
        if found != child {
            return Err(StubError::RemoveMismatch {
                parent,
                index,
                expected: child,
                found,
            });
        }
        parent_view.children.remove(index);
        self.view_mut(child)?.parent = None;
        Ok(())
    }

    fn delete(&mut self, tag: Tag) -> Result<(), StubError> {
        let view = self.views.get(&tag).ok_or(StubError::UnknownTag(tag))?;
        if let Some(parent) = view.parent {
            return Err(StubError::DeleteAttached { tag, parent });
        }
        if !view.children.is_empty() {
            return Err(StubError::DeleteNonEmpty {
                tag,
                children: view.children.len(),
            });
        }
        self.views.remove(&tag);
        Ok(())
    }

    /// Deletes `tag` and everything still attached below it.
    fn delete_tree(&mut self, tag: Tag) {
        let mut pending = vec![tag];
        while let Some(tag) = pending.pop() {
            if let Some(view) = self.views.remove(&tag) {
                pending.extend(view.children);
            }
        }
    }
}

impl PartialEq for StubViewTree {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.views == other.views
    }
}

impl MutationExecutor for StubViewTree {
    /// Applies the transaction.
    ///
    /// # Panics
    ///
    /// Panics if a mutation is invalid against the current hierarchy.
    fn apply(&mut self, transaction: &MountingTransaction) {
        if let Err(error) = self.try_apply(transaction.mutations()) {
            panic!(
                "invalid mutation in transaction {} of surface {}: {error}",
                transaction.number(),
                transaction.surface_id()
            );
        }
        self.transactions_applied += 1;
    }
}
