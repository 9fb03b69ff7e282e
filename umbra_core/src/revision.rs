// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Numbered whole-tree snapshots.

use std::sync::Arc;

use crate::node::ShadowNode;
use crate::telemetry::TransactionTelemetry;

/// An immutable, numbered snapshot of a surface's shadow tree.
///
/// Revisions are cheap to clone: the tree is shared.
#[derive(Clone, Debug)]
pub struct ShadowTreeRevision {
    root: Arc<ShadowNode>,
    number: u64,
    telemetry: TransactionTelemetry,
}

impl ShadowTreeRevision {
    /// The number of the revision a tree starts with.
    pub const INITIAL_NUMBER: u64 = 0;

    /// Creates a revision.
    #[must_use]
    pub fn new(root: Arc<ShadowNode>, number: u64, telemetry: TransactionTelemetry) -> Self {
        Self {
            root,
            number,
            telemetry,
        }
    }

    /// Creates the initial revision of a tree.
    #[must_use]
    pub fn initial(root: Arc<ShadowNode>) -> Self {
        Self::new(root, Self::INITIAL_NUMBER, TransactionTelemetry::new())
    }

    /// Returns the root node.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Arc<ShadowNode> {
        &self.root
    }

    /// Returns the revision number.
    #[inline]
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Returns the telemetry recorded while committing this revision.
    #[inline]
    #[must_use]
    pub fn telemetry(&self) -> &TransactionTelemetry {
        &self.telemetry
    }
}
