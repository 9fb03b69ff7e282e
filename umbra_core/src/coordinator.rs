// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hand-off of committed revisions to the mounting thread.
//!
//! A [`MountingCoordinator`] sits between the thread that commits revisions
//! ([`ShadowTree`](crate::tree::ShadowTree)) and the thread that mounts them.
//! Commits [`push`](MountingCoordinator::push) revisions; the mounting thread
//! [`pull`](MountingCoordinator::pull_transaction)s a [`MountingTransaction`],
//! which is when the diff against the last mounted (*base*) revision is
//! computed. Revisions pushed in between are coalesced: only the newest one is
//! diffed.
//!
//! ```text
//!   commit thread                      mounting thread
//!   ─────────────                      ───────────────
//!   push(rev 3) ──► last = 3
//!   push(rev 4) ──► last = 4   ──►     wait_for_transaction()
//!                                      pull_transaction()
//!                                        diff(base 2, last 4)
//!                                        base = 4, last = None
//! ```

use std::sync::Weak;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::differ::{self, DiffOptions};
use crate::id::SurfaceId;
use crate::mutation::ShadowViewMutationList;
use crate::revision::ShadowTreeRevision;
use crate::telemetry::TransactionTelemetry;
use crate::time::HostTime;
use crate::trace::PhaseKind;

/// The mutations that bring a mounted view hierarchy from one revision to a
/// later one.
#[derive(Clone, Debug)]
pub struct MountingTransaction {
    surface_id: SurfaceId,
    number: u64,
    mutations: ShadowViewMutationList,
    telemetry: TransactionTelemetry,
}

impl MountingTransaction {
    /// Creates a transaction.
    #[must_use]
    pub fn new(
        surface_id: SurfaceId,
        number: u64,
        mutations: ShadowViewMutationList,
        telemetry: TransactionTelemetry,
    ) -> Self {
        Self {
            surface_id,
            number,
            mutations,
            telemetry,
        }
    }

    /// Returns the surface the transaction belongs to.
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Returns the transaction number, counted per coordinator from 1.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Returns the mutations, in application order.
    #[must_use]
    pub fn mutations(&self) -> &ShadowViewMutationList {
        &self.mutations
    }

    /// Returns the telemetry.
    #[must_use]
    pub fn telemetry(&self) -> &TransactionTelemetry {
        &self.telemetry
    }

    /// Returns the telemetry for recording the mount phase.
    pub fn telemetry_mut(&mut self) -> &mut TransactionTelemetry {
        &mut self.telemetry
    }

    /// Consumes the transaction, returning its mutations.
    #[must_use]
    pub fn into_mutations(self) -> ShadowViewMutationList {
        self.mutations
    }
}

/// Strategy that can take over [`MountingCoordinator::pull_transaction`],
/// e.g. to drive host-side animations.
pub trait MountingOverrideDelegate: Send + Sync {
    /// Returns whether the next pull should be handed to this delegate.
    fn should_override_pull_transaction(&self) -> bool;

    /// Produces the transaction for a pull.
    ///
    /// `mutations` holds the diffed mutations, or is empty when nothing was
    /// pending. `telemetry` has the layout, commit and diff phases completed.
    fn pull_transaction(
        &self,
        surface_id: SurfaceId,
        number: u64,
        telemetry: &TransactionTelemetry,
        mutations: ShadowViewMutationList,
    ) -> Option<MountingTransaction>;
}

#[derive(Debug)]
struct CoordinatorState {
    base: Option<ShadowTreeRevision>,
    last: Option<ShadowTreeRevision>,
    transaction_number: u64,
    revoked: bool,
}

/// Cross-thread queue that turns pushed revisions into pulled transactions.
pub struct MountingCoordinator {
    surface_id: SurfaceId,
    diff_options: DiffOptions,
    state: Mutex<CoordinatorState>,
    signal: Condvar,
    override_delegate: Mutex<Option<Weak<dyn MountingOverrideDelegate>>>,
}

impl std::fmt::Debug for MountingCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountingCoordinator")
            .field("surface_id", &self.surface_id)
            .field("diff_options", &self.diff_options)
            .finish_non_exhaustive()
    }
}

impl MountingCoordinator {
    /// Creates a coordinator whose consumer has already mounted `base`.
    #[must_use]
    pub fn new(base: ShadowTreeRevision, diff_options: DiffOptions) -> Self {
        Self {
            surface_id: base.root().surface_id(),
            diff_options,
            state: Mutex::new(CoordinatorState {
                base: Some(base),
                last: None,
                transaction_number: 0,
                revoked: false,
            }),
            signal: Condvar::new(),
            override_delegate: Mutex::new(None),
        }
    }

    /// Returns the surface this coordinator serves.
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Offers a newly committed revision to the mounting side.
    ///
    /// The revision replaces the pending one only if it is newer. Pushes
    /// after [`revoke`](Self::revoke) are ignored.
    pub fn push(&self, revision: ShadowTreeRevision) {
        {
            let mut state = self.state.lock();
            if state.revoked {
                tracing::trace!(
                    surface_id = %self.surface_id,
                    revision = revision.number(),
                    "ignoring push to a revoked coordinator"
                );
                return;
            }
            let newest = state
                .last
                .as_ref()
                .or(state.base.as_ref())
                .map(ShadowTreeRevision::number);
            if let Some(newest) = newest.filter(|&n| revision.number() <= n) {
                tracing::debug!(
                    surface_id = %self.surface_id,
                    revision = revision.number(),
                    newest,
                    "ignoring stale push"
                );
                return;
            }
            state.last = Some(revision);
        }
        self.signal.notify_all();
    }

    /// Blocks until a revision is pending or `timeout` elapses.
    ///
    /// Returns whether a revision is pending.
    pub fn wait_for_transaction(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        let _ = self.signal.wait_while_for(
            &mut state,
            |state| state.last.is_none() && !state.revoked,
            timeout,
        );
        state.last.is_some()
    }

    /// Diffs the pending revision against the mounted one and returns the
    /// resulting transaction.
    ///
    /// Returns `None` when nothing is pending (unless the override delegate
    /// takes over) and always after [`revoke`](Self::revoke).
    pub fn pull_transaction(&self) -> Option<MountingTransaction> {
        let delegate = self
            .override_delegate
            .lock()
            .as_ref()
            .and_then(Weak::upgrade);
        let overriding = delegate
            .as_ref()
            .is_some_and(|d| d.should_override_pull_transaction());

        let mut state = self.state.lock();
        if state.revoked {
            return None;
        }

        let mut transaction = None;
        if let Some(last) = state.last.take() {
            state.transaction_number += 1;
            let mut telemetry = last.telemetry().clone();
            telemetry.will_diff();
            let mutations = match &state.base {
                Some(base) => differ::diff(base.root(), last.root(), self.diff_options),
                None => ShadowViewMutationList::new(),
            };
            telemetry.did_diff();
            transaction = Some(MountingTransaction::new(
                self.surface_id,
                state.transaction_number,
                mutations,
                telemetry,
            ));
            state.base = Some(last);
        }

        let Some(delegate) = delegate.filter(|_| overriding) else {
            return transaction;
        };

        let (number, telemetry, mutations) = match transaction {
            Some(tx) => (tx.number, tx.telemetry, tx.mutations),
            None => {
                state.transaction_number += 1;
                let revision = state.base.as_ref().map_or(0, ShadowTreeRevision::number);
                (
                    state.transaction_number,
                    synthetic_telemetry(revision),
                    ShadowViewMutationList::new(),
                )
            }
        };
        drop(state);

        tracing::debug!(
            surface_id = %self.surface_id,
            number,
            "override delegate takes over pull"
        );
        delegate.pull_transaction(self.surface_id, number, &telemetry, mutations)
    }

    /// Returns whether a revision is waiting to be pulled.
    #[must_use]
    pub fn has_pending_transactions(&self) -> bool {
        self.state.lock().last.is_some()
    }

    /// Returns the revision the consumer last mounted.
    #[must_use]
    pub fn base_revision(&self) -> Option<ShadowTreeRevision> {
        self.state.lock().base.clone()
    }

    /// Declares that the consumer mounted `revision` by other means.
    pub fn update_base_revision(&self, revision: ShadowTreeRevision) {
        let mut state = self.state.lock();
        if !state.revoked {
            state.base = Some(revision);
        }
    }

    /// Drops the pending revision, if any.
    pub fn reset_latest_revision(&self) {
        self.state.lock().last = None;
    }

    /// Installs (or replaces) the override delegate.
    pub fn set_mounting_override_delegate(&self, delegate: Weak<dyn MountingOverrideDelegate>) {
        *self.override_delegate.lock() = Some(delegate);
    }

    /// Stops retaining any tree; later pulls return `None`.
    pub fn revoke(&self) {
        {
            let mut state = self.state.lock();
            state.revoked = true;
            state.base = None;
            state.last = None;
        }
        tracing::debug!(surface_id = %self.surface_id, "mounting coordinator revoked");
        self.signal.notify_all();
    }

    /// Returns whether [`revoke`](Self::revoke) was called.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.state.lock().revoked
    }
}

/// Telemetry for a transaction that was not produced by a commit.
fn synthetic_telemetry(revision: u64) -> TransactionTelemetry {
    let now = HostTime::now();
    let mut telemetry = TransactionTelemetry::new();
    for phase in [PhaseKind::Layout, PhaseKind::Commit, PhaseKind::Diff] {
        telemetry.will_phase_at(phase, now);
        telemetry.did_phase_at(phase, now);
    }
    telemetry.set_revision_number(revision);
    telemetry
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::id::Tag;
    use crate::node::{ShadowNode, ShadowNodeFamily, ShadowNodeFragment};

    fn root_family() -> Arc<ShadowNodeFamily> {
        ShadowNodeFamily::new(Tag(1), SurfaceId(3), "Root")
    }

    fn revision(family: &Arc<ShadowNodeFamily>, number: u64, children: usize) -> ShadowTreeRevision {
        let children = (0..children)
            .map(|i| {
                let tag = Tag(10 + i32::try_from(i).unwrap());
                ShadowNode::new(
                    ShadowNodeFamily::new(tag, SurfaceId(3), "View"),
                    ShadowNodeFragment::default(),
                )
            })
            .collect();
        let root = ShadowNode::new(
            Arc::clone(family),
            ShadowNodeFragment::default().with_children(children),
        );
        let mut telemetry = TransactionTelemetry::new();
        for phase in [PhaseKind::Commit, PhaseKind::Layout] {
            telemetry.will_phase_at(phase, HostTime(number));
            telemetry.did_phase_at(phase, HostTime(number + 1));
        }
        telemetry.set_revision_number(number);
        ShadowTreeRevision::new(root, number, telemetry)
    }

    fn coordinator(family: &Arc<ShadowNodeFamily>) -> MountingCoordinator {
        MountingCoordinator::new(revision(family, 0, 0), DiffOptions::DEFAULT)
    }

    #[test]
    fn pull_without_push_is_empty() {
        let f = root_family();
        let c = coordinator(&f);
        assert!(!c.has_pending_transactions());
        assert!(c.pull_transaction().is_none());
    }

    #[test]
    fn pull_diffs_against_base_and_advances_it() {
        let f = root_family();
        let c = coordinator(&f);
        c.push(revision(&f, 1, 2));
        assert!(c.has_pending_transactions());

        let tx = c.pull_transaction().unwrap();
        assert_eq!(tx.number(), 1);
        assert_eq!(tx.surface_id(), SurfaceId(3));
        assert_eq!(tx.mutations().len(), 4);
        assert!(tx.telemetry().is_complete(PhaseKind::Diff));
        assert_eq!(c.base_revision().map(|r| r.number()), Some(1));
        assert!(c.pull_transaction().is_none());
    }

    #[test]
    fn only_newer_pushes_replace_the_pending_revision() {
        let f = root_family();
        let c = coordinator(&f);
        c.push(revision(&f, 2, 1));
        c.push(revision(&f, 1, 3));
        c.pull_transaction().unwrap();
        assert_eq!(c.base_revision().map(|r| r.number()), Some(2));

        c.push(revision(&f, 2, 5));
        assert!(!c.has_pending_transactions());
    }

    #[test]
    fn revoke_drops_revisions_and_ignores_pushes() {
        let f = root_family();
        let c = coordinator(&f);
        c.push(revision(&f, 1, 1));
        c.revoke();
        assert!(c.is_revoked());
        assert!(c.base_revision().is_none());
        assert!(c.pull_transaction().is_none());

        c.push(revision(&f, 2, 1));
        assert!(c.pull_transaction().is_none());
    }

    #[test]
    fn reset_drops_the_pending_revision() {
        let f = root_family();
        let c = coordinator(&f);
        c.push(revision(&f, 1, 2));
        c.reset_latest_revision();
        assert!(!c.has_pending_transactions());
        assert!(c.pull_transaction().is_none());
        assert_eq!(c.base_revision().map(|r| r.number()), Some(0));

        c.push(revision(&f, 2, 1));
        assert_eq!(c.pull_transaction().map(|tx| tx.number()), Some(2));
    }

    #[test]
    fn updated_base_is_diffed_against() {
        let f = root_family();
        let c = coordinator(&f);
        let mounted = revision(&f, 1, 3);
        c.update_base_revision(mounted.clone());
        assert_eq!(c.base_revision().map(|r| r.number()), Some(1));

        let same_tree = ShadowTreeRevision::new(
            Arc::clone(mounted.root()),
            2,
            mounted.telemetry().clone(),
        );
        c.push(same_tree);
        let tx = c.pull_transaction().unwrap();
        assert_eq!(tx.number(), 2);
        assert!(tx.mutations().is_empty());
    }

    #[test]
    fn base_updates_after_revoke_are_ignored() {
        let f = root_family();
        let c = coordinator(&f);
        c.revoke();
        c.update_base_revision(revision(&f, 1, 1));
        assert!(c.base_revision().is_none());
    }

    #[test]
    fn wait_times_out_without_push() {
        let f = root_family();
        let c = coordinator(&f);
        assert!(!c.wait_for_transaction(Duration::from_millis(10)));
    }

    #[test]
    fn wait_returns_after_concurrent_push() {
        let f = root_family();
        let c = Arc::new(coordinator(&f));
        let pushed = revision(&f, 1, 1);
        let producer = {
            let c = Arc::clone(&c);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                c.push(pushed);
            })
        };
        assert!(c.wait_for_transaction(Duration::from_secs(10)));
        producer.join().unwrap();
    }

    struct Overrider {
        pulls: Mutex<Vec<(u64, usize, bool)>>,
    }

    impl MountingOverrideDelegate for Overrider {
        fn should_override_pull_transaction(&self) -> bool {
            true
        }

        fn pull_transaction(
            &self,
            surface_id: SurfaceId,
            number: u64,
            telemetry: &TransactionTelemetry,
            mutations: ShadowViewMutationList,
        ) -> Option<MountingTransaction> {
            let complete = telemetry.is_complete(PhaseKind::Diff)
                && telemetry.is_complete(PhaseKind::Commit)
                && telemetry.is_complete(PhaseKind::Layout);
            self.pulls.lock().push((number, mutations.len(), complete));
            Some(MountingTransaction::new(
                surface_id,
                number,
                mutations,
                telemetry.clone(),
            ))
        }
    }

    #[test]
    fn override_delegate_receives_pulls() {
        let f = root_family();
        let c = coordinator(&f);
        let delegate = Arc::new(Overrider {
            pulls: Mutex::new(Vec::new()),
        });
        let shared: Arc<dyn MountingOverrideDelegate> = Arc::clone(&delegate) as _;
        c.set_mounting_override_delegate(Arc::downgrade(&shared));

        let synthesized = c.pull_transaction().unwrap();
        assert_eq!(synthesized.number(), 1);
        assert!(synthesized.mutations().is_empty());

        c.push(revision(&f, 1, 1));
        let diffed = c.pull_transaction().unwrap();
        assert_eq!(diffed.number(), 2);
        assert_eq!(diffed.mutations().len(), 2);

        assert_eq!(*delegate.pulls.lock(), [(1, 0, true), (2, 2, true)]);
    }
}
