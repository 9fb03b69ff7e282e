// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edit instructions for a live view hierarchy.

use std::fmt;

use crate::id::Tag;
use crate::view::ShadowView;

/// An ordered edit script produced by the [`differ`](crate::differ).
pub type ShadowViewMutationList = Vec<ShadowViewMutation>;

/// The kind of a [`ShadowViewMutation`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// See [`ShadowViewMutation::Create`].
    Create,
    /// See [`ShadowViewMutation::Delete`].
    Delete,
    /// See [`ShadowViewMutation::Insert`].
    Insert,
    /// See [`ShadowViewMutation::Remove`].
    Remove,
    /// See [`ShadowViewMutation::Update`].
    Update,
    /// See [`ShadowViewMutation::RemoveDeleteTree`].
    RemoveDeleteTree,
}

impl MutationKind {
    /// Returns a short human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Delete => "Delete",
            Self::Insert => "Insert",
            Self::Remove => "Remove",
            Self::Update => "Update",
            Self::RemoveDeleteTree => "RemoveDeleteTree",
        }
    }
}

/// One edit instruction.
///
/// Indices refer to the parent's child list at the moment the mutation is
/// applied, assuming every earlier mutation in the list has been applied.
#[derive(Clone, Debug, PartialEq)]
pub enum ShadowViewMutation {
    /// Create a detached view.
    Create {
        /// The view to create.
        new_child: ShadowView,
    },
    /// Destroy a detached, childless view.
    Delete {
        /// The view to destroy.
        old_child: ShadowView,
        /// Set when an ancestor's [`RemoveDeleteTree`](Self::RemoveDeleteTree)
        /// already covers this deletion.
        redundant: bool,
    },
    /// Attach a detached view to `parent` at `index`.
    Insert {
        /// The new parent.
        parent: ShadowView,
        /// The view to attach.
        new_child: ShadowView,
        /// Position in the parent's child list after insertion.
        index: usize,
    },
    /// Detach the view at `index` from `parent`.
    Remove {
        /// The current parent.
        parent: ShadowView,
        /// The view to detach.
        old_child: ShadowView,
        /// Position in the parent's child list before removal.
        index: usize,
        /// Set when an ancestor's [`RemoveDeleteTree`](Self::RemoveDeleteTree)
        /// already covers this removal.
        redundant: bool,
    },
    /// Replace the props, state or layout of an existing view.
    Update {
        /// The parent in the new tree; `None` for the root.
        parent: Option<ShadowView>,
        /// The view as last mounted.
        old_child: ShadowView,
        /// The view to mount.
        new_child: ShadowView,
    },
    /// Detach the view at `index` from `parent`, then destroy it together
    /// with every view still attached below it.
    RemoveDeleteTree {
        /// The current parent.
        parent: ShadowView,
        /// The root of the subtree to destroy.
        old_child: ShadowView,
        /// Position in the parent's child list before removal.
        index: usize,
    },
}

impl ShadowViewMutation {
    /// Returns the kind of this mutation.
    #[must_use]
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Create { .. } => MutationKind::Create,
            Self::Delete { .. } => MutationKind::Delete,
            Self::Insert { .. } => MutationKind::Insert,
            Self::Remove { .. } => MutationKind::Remove,
            Self::Update { .. } => MutationKind::Update,
            Self::RemoveDeleteTree { .. } => MutationKind::RemoveDeleteTree,
        }
    }

    /// Returns the parent view, if this mutation has one.
    #[must_use]
    pub fn parent(&self) -> Option<&ShadowView> {
        match self {
            Self::Insert { parent, .. }
            | Self::Remove { parent, .. }
            | Self::RemoveDeleteTree { parent, .. } => Some(parent),
            Self::Update { parent, .. } => parent.as_ref(),
            Self::Create { .. } | Self::Delete { .. } => None,
        }
    }

    /// Returns the view as it was before this mutation, if any.
    #[must_use]
    pub fn old_child(&self) -> Option<&ShadowView> {
        match self {
            Self::Delete { old_child, .. }
            | Self::Remove { old_child, .. }
            | Self::Update { old_child, .. }
            | Self::RemoveDeleteTree { old_child, .. } => Some(old_child),
            Self::Create { .. } | Self::Insert { .. } => None,
        }
    }

    /// Returns the view as it is after this mutation, if any.
    #[must_use]
    pub fn new_child(&self) -> Option<&ShadowView> {
        match self {
            Self::Create { new_child }
            | Self::Insert { new_child, .. }
            | Self::Update { new_child, .. } => Some(new_child),
            Self::Delete { .. } | Self::Remove { .. } | Self::RemoveDeleteTree { .. } => None,
        }
    }

    /// Returns the tag of the view this mutation acts on.
    #[must_use]
    pub fn tag(&self) -> Tag {
        match self {
            Self::Create { new_child } | Self::Insert { new_child, .. } => new_child.tag,
            Self::Delete { old_child, .. }
            | Self::Remove { old_child, .. }
            | Self::Update { old_child, .. }
            | Self::RemoveDeleteTree { old_child, .. } => old_child.tag,
        }
    }

    /// Returns the child index, for mutations that carry one.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Insert { index, .. }
            | Self::Remove { index, .. }
            | Self::RemoveDeleteTree { index, .. } => Some(*index),
            Self::Create { .. } | Self::Delete { .. } | Self::Update { .. } => None,
        }
    }

    /// Returns whether an ancestor's `RemoveDeleteTree` subsumes this
    /// mutation.
    #[must_use]
    pub fn is_redundant(&self) -> bool {
        matches!(
            self,
            Self::Delete {
                redundant: true,
                ..
            } | Self::Remove {
                redundant: true,
                ..
            }
        )
    }
}

impl fmt::Display for ShadowViewMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { new_child } => {
                write!(f, "Create {} ({})", new_child.tag, new_child.component_name)
            }
            Self::Delete { old_child, .. } => write!(f, "Delete {}", old_child.tag),
            Self::Insert {
                parent,
                new_child,
                index,
            } => write!(f, "Insert {} into {} at {index}", new_child.tag, parent.tag),
            Self::Remove {
                parent,
                old_child,
                index,
                ..
            } => write!(f, "Remove {} from {} at {index}", old_child.tag, parent.tag),
            Self::Update { old_child, .. } => write!(f, "Update {}", old_child.tag),
            Self::RemoveDeleteTree {
                parent,
                old_child,
                index,
            } => write!(
                f,
                "RemoveDeleteTree {} from {} at {index}",
                old_child.tag, parent.tag
            ),
        }?;
        if self.is_redundant() {
            f.write_str(" (redundant)")?;
        }
        Ok(())
    }
}
