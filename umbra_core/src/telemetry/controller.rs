// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use parking_lot::Mutex;

use super::SurfaceTelemetry;
use crate::coordinator::MountingCoordinator;
use crate::executor::MutationExecutor;
use crate::trace::{PhaseKind, Tracer, TransactionSummary};

/// Drives the mount phase for one surface and keeps its
/// [`SurfaceTelemetry`].
#[derive(Debug)]
pub struct TelemetryController {
    coordinator: Arc<MountingCoordinator>,
    compound: Mutex<SurfaceTelemetry>,
}

impl TelemetryController {
    /// Creates a controller pulling from `coordinator`.
    #[must_use]
    pub fn new(coordinator: Arc<MountingCoordinator>) -> Self {
        Self {
            coordinator,
            compound: Mutex::new(SurfaceTelemetry::default()),
        }
    }

    /// Pulls a transaction and mounts it with `executor`.
    ///
    /// Returns `false` when nothing was pending.
    pub fn pull_transaction(
        &self,
        executor: &mut impl MutationExecutor,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let Some(mut transaction) = self.coordinator.pull_transaction() else {
            return false;
        };

        let snapshot = self.compound.lock().clone();
        executor.will_mount(&transaction, &snapshot);

        transaction.telemetry_mut().will_mount();
        executor.apply(&transaction);
        transaction.telemetry_mut().did_mount();

        let snapshot = {
            let mut compound = self.compound.lock();
            compound.incorporate(transaction.telemetry(), transaction.mutations().len());
            compound.clone()
        };
        executor.did_mount(&transaction, &snapshot);

        tracer.telemetry_phases(
            transaction.surface_id(),
            transaction.telemetry(),
            &[PhaseKind::Diff, PhaseKind::Mount],
        );
        tracer.transaction_summary(&TransactionSummary::from_transaction(&transaction));
        true
    }

    /// Returns a copy of the surface telemetry so far.
    #[must_use]
    pub fn compound_telemetry(&self) -> SurfaceTelemetry {
        self.compound.lock().clone()
    }

    /// Returns the coordinator this controller pulls from.
    #[must_use]
    pub fn coordinator(&self) -> &Arc<MountingCoordinator> {
        &self.coordinator
    }
}
