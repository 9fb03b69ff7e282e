// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory view hierarchy for umbra.
//!
//! [`StubViewTree`] implements
//! [`MutationExecutor`](umbra_core::executor::MutationExecutor) by keeping a
//! plain map of views and validating every mutation strictly against the
//! current hierarchy. It can also be built directly from a shadow tree, so a
//! hierarchy produced by applying mutations can be compared with the one the
//! tree describes:
//!
//! ```
//! # use std::sync::Arc;
//! # use umbra_core::differ::{diff, DiffOptions};
//! # use umbra_core::id::{SurfaceId, Tag};
//! # use umbra_core::node::{ShadowNode, ShadowNodeFamily, ShadowNodeFragment};
//! use umbra_backend_stub::StubViewTree;
//!
//! let root_family = ShadowNodeFamily::new(Tag(1), SurfaceId(1), "Root");
//! let old = ShadowNode::new(Arc::clone(&root_family), ShadowNodeFragment::default());
//! let child = ShadowNode::new(
//!     ShadowNodeFamily::new(Tag(2), SurfaceId(1), "View"),
//!     ShadowNodeFragment::default(),
//! );
//! let new = old.clone_with(ShadowNodeFragment::default().with_children(vec![child]));
//!
//! let mut views = StubViewTree::from_tree(&old);
//! views.try_apply(&diff(&old, &new, DiffOptions::DEFAULT)).unwrap();
//! assert_eq!(views, StubViewTree::from_tree(&new));
//! ```

mod stub;

pub use stub::{StubError, StubView, StubViewTree};
