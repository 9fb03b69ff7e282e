// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract between the pipeline and a live view hierarchy.

use crate::coordinator::MountingTransaction;
use crate::telemetry::SurfaceTelemetry;

/// A consumer of [`MountingTransaction`]s, typically owning native views.
///
/// Implementations apply each transaction's mutations in order. The mounting
/// thread calls [`will_mount`](Self::will_mount), [`apply`](Self::apply) and
/// [`did_mount`](Self::did_mount) once per transaction, in that order.
pub trait MutationExecutor {
    /// Called before `apply`, with the surface's telemetry so far.
    fn will_mount(&mut self, transaction: &MountingTransaction, telemetry: &SurfaceTelemetry) {
        _ = (transaction, telemetry);
    }

    /// Applies every mutation of `transaction`, in order.
    fn apply(&mut self, transaction: &MountingTransaction);

    /// Called after `apply`, with the surface's telemetry including this
    /// transaction.
    fn did_mount(&mut self, transaction: &MountingTransaction, telemetry: &SurfaceTelemetry) {
        _ = (transaction, telemetry);
    }
}
