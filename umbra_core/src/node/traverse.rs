// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use std::sync::Arc;

use super::shadow_node::ShadowNode;

/// A pre-order iterator over the descendants of a node.
///
/// Created by [`ShadowNode::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a Arc<ShadowNode>>,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(children: &'a [Arc<ShadowNode>]) -> Self {
        Self {
            stack: children.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Arc<ShadowNode>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}
