// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recoverable commit errors.

/// Why a commit attempt did not install a revision.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Another commit installed a revision while this one was running.
    ///
    /// [`ShadowTree::commit`](crate::tree::ShadowTree::commit) retries these.
    #[error("revision conflict: expected revision {expected}, found {found}")]
    RevisionConflict {
        /// Revision the transform started from.
        expected: u64,
        /// Revision installed in the meantime.
        found: u64,
    },
    /// The transform gave up with an explanation.
    #[error("transaction aborted: {reason}")]
    Aborted {
        /// Human-readable reason.
        reason: String,
    },
    /// The transform failed.
    #[error("transaction failed")]
    Transform(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl TransactionError {
    /// Creates an [`Aborted`](Self::Aborted) error.
    #[must_use]
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    /// Returns whether [`ShadowTree::commit`](crate::tree::ShadowTree::commit)
    /// retries after this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RevisionConflict { .. })
    }
}
