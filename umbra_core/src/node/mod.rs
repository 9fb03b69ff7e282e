// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shadow tree data model.
//!
//! A *shadow node* is an immutable snapshot of one UI element at one
//! revision. Each node has:
//!
//! - An identity ([`ShadowNodeFamily`]) shared by every snapshot of the same
//!   element across revisions. Families are reference counted and outlive the
//!   nodes that point at them.
//! - **Props** ([`Props`]) and an optional **state** ([`State`]), compared by
//!   identity rather than by value.
//! - **Layout metrics** ([`LayoutMetrics`]) written by an external layout
//!   engine.
//! - An ordered list of children, shared between revisions.
//!
//! Nodes are never mutated after construction. Editing a tree clones the
//! edited node and each of its ancestors ([`ShadowNode::clone_tree`]); every
//! other subtree is shared with the previous revision, which lets the
//! [`differ`](crate::differ) skip identical subtrees by pointer comparison.

mod family;
mod layout;
mod props;
mod shadow_node;
mod state;
mod traverse;

pub use family::{ComponentName, ShadowNodeFamily};
pub use layout::{DisplayType, LayoutDirection, LayoutMetrics};
pub use props::Props;
pub use shadow_node::{ShadowNode, ShadowNodeFragment};
pub use state::State;
pub use traverse::Descendants;
