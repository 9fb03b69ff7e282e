// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The authoritative revision of one surface and its commit protocol.
//!
//! A [`ShadowTree`] holds the current [`ShadowTreeRevision`] of a surface.
//! [`ShadowTree::commit`] replaces it by running a transform over the current
//! root:
//!
//! 1. The current revision is read and the transform runs without any lock
//!    held. Returning `Ok(None)` cancels the commit.
//! 2. Outdated states are optionally progressed
//!    ([`reconcile::progress_state`]), the delegate's commit hook runs, and
//!    the optional [`LayoutEngine`] lays the tree out.
//! 3. Under the write lock, the revision is installed with the next number,
//!    unless another commit got there first, in which case the whole attempt
//!    is retried from step 1.
//! 4. In [`CommitMode::Normal`], the revision is pushed to the
//!    [`MountingCoordinator`].
//!
//! [`reconcile::progress_state`]: crate::reconcile::progress_state

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::coordinator::MountingCoordinator;
use crate::differ::{self, DiffOptions};
use crate::error::TransactionError;
use crate::id::SurfaceId;
use crate::mutation::ShadowViewMutationList;
use crate::node::{ShadowNode, ShadowNodeFragment};
use crate::reconcile;
use crate::revision::ShadowTreeRevision;
use crate::telemetry::TransactionTelemetry;
use crate::time::HostTime;
use crate::trace::{CommitEvent, PhaseKind, Tracer};

/// Upper bound on commit attempts before a livelock is assumed.
const MAX_COMMIT_ATTEMPTS: u32 = 1024;

/// What a transform returns: a new root, `None` to cancel, or an error.
pub type TransactionResult = Result<Option<Arc<ShadowNode>>, TransactionError>;

/// Outcome of a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommitStatus {
    /// A new revision was installed.
    Succeeded,
    /// The transform failed; nothing was installed.
    Failed,
    /// The transform or a hook declined, or a yield was requested; nothing
    /// was installed.
    Cancelled,
}

/// Whether committed revisions reach the mounting side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CommitMode {
    /// Every installed revision is pushed to the coordinator.
    #[default]
    Normal,
    /// Revisions are installed but not pushed until the mode returns to
    /// `Normal`.
    Suspended,
}

/// Per-commit options.
#[derive(Clone, Copy, Default)]
pub struct CommitOptions<'a> {
    /// Progress outdated states in the new tree before installing it.
    pub enable_state_reconciliation: bool,
    /// Polled before the transform runs and again before installation;
    /// returning `true` cancels the commit.
    pub should_yield: Option<&'a dyn Fn() -> bool>,
}

impl<'a> CommitOptions<'a> {
    /// Returns these options with state reconciliation set.
    #[must_use]
    pub fn with_state_reconciliation(mut self, enabled: bool) -> Self {
        self.enable_state_reconciliation = enabled;
        self
    }

    /// Returns these options with a yield check.
    #[must_use]
    pub fn with_should_yield(mut self, should_yield: &'a dyn Fn() -> bool) -> Self {
        self.should_yield = Some(should_yield);
        self
    }

    fn yield_requested(&self) -> bool {
        self.should_yield.is_some_and(|should_yield| should_yield())
    }
}

impl fmt::Debug for CommitOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitOptions")
            .field(
                "enable_state_reconciliation",
                &self.enable_state_reconciliation,
            )
            .field("should_yield", &self.should_yield.is_some())
            .finish()
    }
}

/// Configuration of a [`ShadowTree`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShadowTreeConfig {
    /// Options for diffs computed by the tree's coordinator.
    pub diff: DiffOptions,
}

impl ShadowTreeConfig {
    /// Returns this configuration with the given diff options.
    #[must_use]
    pub const fn with_diff(mut self, diff: DiffOptions) -> Self {
        self.diff = diff;
        self
    }
}

/// Hooks into the commit protocol.
pub trait ShadowTreeDelegate: Send + Sync {
    /// Called with each new root before layout; returning `None` cancels the
    /// commit.
    fn will_commit(
        &self,
        tree: &ShadowTree,
        old_root: &Arc<ShadowNode>,
        new_root: Arc<ShadowNode>,
    ) -> Option<Arc<ShadowNode>> {
        _ = (tree, old_root);
        Some(new_root)
    }

    /// Called after a revision has been pushed to `coordinator`.
    fn did_finish_transaction(&self, coordinator: &Arc<MountingCoordinator>) {
        _ = coordinator;
    }
}

/// Computes layout metrics for a tree.
pub trait LayoutEngine: Send + Sync {
    /// Returns `root` with up-to-date layout metrics.
    ///
    /// Unchanged subtrees should be shared with the input.
    fn layout(&self, root: &Arc<ShadowNode>) -> Arc<ShadowNode>;
}

/// Owner of a surface's current revision.
pub struct ShadowTree {
    surface_id: SurfaceId,
    config: ShadowTreeConfig,
    current: RwLock<ShadowTreeRevision>,
    commit_mode: Mutex<CommitMode>,
    coordinator: Arc<MountingCoordinator>,
    delegate: Option<Arc<dyn ShadowTreeDelegate>>,
    layout_engine: Option<Arc<dyn LayoutEngine>>,
}

impl fmt::Debug for ShadowTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowTree")
            .field("surface_id", &self.surface_id)
            .field("revision", &self.current.read().number())
            .field("commit_mode", &*self.commit_mode.lock())
            .finish_non_exhaustive()
    }
}

impl ShadowTree {
    /// Creates a tree whose initial revision is `root`.
    ///
    /// The initial revision is also the coordinator's base revision, so it
    /// is never pushed.
    #[must_use]
    pub fn new(root: Arc<ShadowNode>, config: ShadowTreeConfig) -> Self {
        let revision = ShadowTreeRevision::initial(root);
        let coordinator = Arc::new(MountingCoordinator::new(revision.clone(), config.diff));
        Self {
            surface_id: revision.root().surface_id(),
            config,
            current: RwLock::new(revision),
            commit_mode: Mutex::new(CommitMode::Normal),
            coordinator,
            delegate: None,
            layout_engine: None,
        }
    }

    /// Sets the delegate.
    #[must_use]
    pub fn with_delegate(mut self, delegate: Arc<dyn ShadowTreeDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Sets the layout engine.
    #[must_use]
    pub fn with_layout_engine(mut self, engine: Arc<dyn LayoutEngine>) -> Self {
        self.layout_engine = Some(engine);
        self
    }

    // -- Accessors --

    /// Returns the surface this tree belongs to.
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ShadowTreeConfig {
        &self.config
    }

    /// Returns a snapshot of the current revision.
    #[must_use]
    pub fn current_revision(&self) -> ShadowTreeRevision {
        self.current.read().clone()
    }

    /// Returns the coordinator revisions are pushed to.
    #[must_use]
    pub fn mounting_coordinator(&self) -> &Arc<MountingCoordinator> {
        &self.coordinator
    }

    /// Returns the commit mode.
    #[must_use]
    pub fn commit_mode(&self) -> CommitMode {
        *self.commit_mode.lock()
    }

    // -- Commit --

    /// Switches the commit mode.
    ///
    /// Returning to [`CommitMode::Normal`] pushes the current revision unless
    /// it is the initial one.
    pub fn set_commit_mode(&self, mode: CommitMode) {
        let flush = {
            let mut current_mode = self.commit_mode.lock();
            if *current_mode == mode {
                return;
            }
            *current_mode = mode;
            (mode == CommitMode::Normal).then(|| self.current_revision())
        };
        tracing::debug!(surface_id = %self.surface_id, ?mode, "commit mode changed");
        if let Some(revision) = flush {
            if revision.number() != ShadowTreeRevision::INITIAL_NUMBER {
                self.mount(revision);
            }
        }
    }

    /// Runs `transaction` until its result is installed, it cancels, or it
    /// fails.
    ///
    /// Only lost races with concurrent commits are retried; the transform
    /// may therefore run more than once and should be pure.
    /// A transform returning `Ok(None)` yields [`CommitStatus::Cancelled`]
    /// and is not retried.
    pub fn commit<F>(&self, transaction: F, options: CommitOptions<'_>) -> CommitStatus
    where
        F: FnMut(&Arc<ShadowNode>) -> TransactionResult,
    {
        self.commit_traced(transaction, options, &mut Tracer::none())
    }

    /// Like [`commit`](Self::commit), emitting the commit and layout phases
    /// and a [`CommitEvent`] to `tracer`.
    pub fn commit_traced<F>(
        &self,
        mut transaction: F,
        options: CommitOptions<'_>,
        tracer: &mut Tracer<'_>,
    ) -> CommitStatus
    where
        F: FnMut(&Arc<ShadowNode>) -> TransactionResult,
    {
        let mut attempts = 0_u32;
        let status = loop {
            attempts += 1;
            debug_assert!(
                attempts <= MAX_COMMIT_ATTEMPTS,
                "commit did not converge after {MAX_COMMIT_ATTEMPTS} attempts"
            );
            match self.try_commit(&mut transaction, options) {
                Ok(status) => break status,
                Err(error) if error.is_retryable() => {
                    tracing::trace!(surface_id = %self.surface_id, %error, "retrying commit");
                }
                Err(error) => {
                    tracing::warn!(surface_id = %self.surface_id, %error, "commit failed");
                    break CommitStatus::Failed;
                }
            }
        };

        let revision = self.current_revision();
        match status {
            CommitStatus::Succeeded => tracer.telemetry_phases(
                self.surface_id,
                revision.telemetry(),
                &[PhaseKind::Commit, PhaseKind::Layout],
            ),
            CommitStatus::Cancelled => {
                tracing::debug!(surface_id = %self.surface_id, "commit cancelled");
            }
            CommitStatus::Failed => {}
        }
        tracer.commit(&CommitEvent {
            surface_id: self.surface_id,
            revision: revision.number(),
            status,
            attempts,
            timestamp: HostTime::now(),
        });
        status
    }

    /// Makes a single commit attempt.
    ///
    /// Returns [`CommitStatus::Succeeded`] or [`CommitStatus::Cancelled`];
    /// every failure, including a lost race
    /// ([`TransactionError::RevisionConflict`]), is an error.
    pub fn try_commit<F>(
        &self,
        mut transaction: F,
        options: CommitOptions<'_>,
    ) -> Result<CommitStatus, TransactionError>
    where
        F: FnMut(&Arc<ShadowNode>) -> TransactionResult,
    {
        let mut telemetry = TransactionTelemetry::new();
        telemetry.will_commit();

        if options.yield_requested() {
            return Ok(CommitStatus::Cancelled);
        }

        let (old_root, old_number) = {
            let current = self.current.read();
            (Arc::clone(current.root()), current.number())
        };

        let Some(mut new_root) = transaction(&old_root)? else {
            return Ok(CommitStatus::Cancelled);
        };
        debug_assert!(
            new_root.same_family(&old_root),
            "a commit must keep the root family"
        );

        if options.enable_state_reconciliation {
            new_root = reconcile::progress_state(&new_root, &old_root);
        }

        if let Some(delegate) = &self.delegate {
            let Some(root) = delegate.will_commit(self, &old_root, new_root) else {
                return Ok(CommitStatus::Cancelled);
            };
            new_root = root;
        }

        // Recorded as an empty span when there is no engine.
        telemetry.will_layout();
        if let Some(engine) = &self.layout_engine {
            let _current = telemetry.set_as_thread_local();
            new_root = engine.layout(&new_root);
        }
        telemetry.did_layout();

        if options.yield_requested() {
            return Ok(CommitStatus::Cancelled);
        }

        let revision = {
            let mut current = self.current.write();
            if current.number() != old_number {
                return Err(TransactionError::RevisionConflict {
                    expected: old_number,
                    found: current.number(),
                });
            }
            let number = old_number + 1;
            telemetry.did_commit();
            telemetry.set_revision_number(number);
            let revision = ShadowTreeRevision::new(new_root, number, telemetry);
            *current = revision.clone();
            revision
        };

        if self.commit_mode() == CommitMode::Normal {
            self.mount(revision);
        }
        Ok(CommitStatus::Succeeded)
    }

    /// Commits a clone of the current root without children.
    pub fn commit_empty_tree(&self) -> CommitStatus {
        self.commit(
            |root| Ok(Some(root.clone_with(ShadowNodeFragment::default().with_children(Vec::new())))),
            CommitOptions::default(),
        )
    }

    /// Diffs the current revision against the one last pulled from the
    /// coordinator, without pushing anything.
    ///
    /// Useful while [`CommitMode::Suspended`] hides revisions from the
    /// mounting side. Returns nothing once the coordinator is revoked.
    #[must_use]
    pub fn unmounted_mutations(&self) -> ShadowViewMutationList {
        let Some(base) = self.coordinator.base_revision() else {
            return ShadowViewMutationList::new();
        };
        let current = self.current_revision();
        differ::diff(base.root(), current.root(), self.config.diff)
    }

    fn mount(&self, revision: ShadowTreeRevision) {
        self.coordinator.push(revision);
        if let Some(delegate) = &self.delegate {
            delegate.did_finish_transaction(&self.coordinator);
        }
    }
}

impl Drop for ShadowTree {
    fn drop(&mut self) {
        self.coordinator.revoke();
    }
}
