// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Differ configuration.

/// What the consuming mutation executor is able to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MountingCapabilities {
    /// Emit a single [`RemoveDeleteTree`] for each removed subtree root.
    ///
    /// [`RemoveDeleteTree`]: crate::mutation::ShadowViewMutation::RemoveDeleteTree
    pub recursive_teardown: bool,
    /// Drop the `Remove`/`Delete` mutations a `RemoveDeleteTree` subsumes
    /// instead of emitting them flagged as redundant.
    ///
    /// Has no effect without `recursive_teardown`.
    pub omit_redundant_operations: bool,
}

impl MountingCapabilities {
    /// Individual `Remove` and `Delete` for every view.
    pub const BASIC: Self = Self {
        recursive_teardown: false,
        omit_redundant_operations: false,
    };

    /// `RemoveDeleteTree` per removed subtree, with subsumed operations kept
    /// and flagged.
    pub const RECURSIVE_TEARDOWN: Self = Self {
        recursive_teardown: true,
        omit_redundant_operations: false,
    };

    /// Returns these capabilities with `recursive_teardown` set.
    #[must_use]
    pub const fn with_recursive_teardown(mut self, enabled: bool) -> Self {
        self.recursive_teardown = enabled;
        self
    }

    /// Returns these capabilities with `omit_redundant_operations` set.
    #[must_use]
    pub const fn with_omit_redundant_operations(mut self, enabled: bool) -> Self {
        self.omit_redundant_operations = enabled;
        self
    }
}

impl Default for MountingCapabilities {
    fn default() -> Self {
        Self::BASIC
    }
}

/// Options for [`diff`](super::diff).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DiffOptions {
    /// Match nodes by family across the whole tree, so a node moved to a new
    /// parent keeps its native view.
    pub detect_reparenting: bool,
    /// What the consumer can apply.
    pub capabilities: MountingCapabilities,
}

impl DiffOptions {
    /// Basic capabilities, reparenting detection off.
    pub const DEFAULT: Self = Self {
        detect_reparenting: false,
        capabilities: MountingCapabilities::BASIC,
    };

    /// Returns these options with `detect_reparenting` set.
    #[must_use]
    pub const fn with_detect_reparenting(mut self, enabled: bool) -> Self {
        self.detect_reparenting = enabled;
        self
    }

    /// Returns these options with the given capabilities.
    #[must_use]
    pub const fn with_capabilities(mut self, capabilities: MountingCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}
