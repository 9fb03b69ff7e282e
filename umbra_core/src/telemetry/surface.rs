// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::VecDeque;

use super::TransactionTelemetry;
use crate::time::Duration;
use crate::trace::PhaseKind;

/// Aggregated telemetry of every transaction mounted on one surface.
#[derive(Clone, Debug, Default)]
pub struct SurfaceTelemetry {
    layout_time: Duration,
    text_measure_time: Duration,
    commit_time: Duration,
    diff_time: Duration,
    mount_time: Duration,
    transaction_count: u64,
    text_measure_count: u64,
    mutation_count: u64,
    last_revision_number: u64,
    recent: VecDeque<TransactionTelemetry>,
}

impl SurfaceTelemetry {
    /// Number of recent transactions retained by [`recent`](Self::recent).
    pub const MAX_RECENT: usize = 16;

    /// Adds one mounted transaction.
    ///
    /// Phases that were not measured contribute nothing.
    pub fn incorporate(&mut self, telemetry: &TransactionTelemetry, mutation_count: usize) {
        let add = |total: &mut Duration, phase| {
            if let Some(d) = telemetry.try_duration(phase) {
                *total = total.saturating_add(d);
            }
        };
        add(&mut self.layout_time, PhaseKind::Layout);
        add(&mut self.commit_time, PhaseKind::Commit);
        add(&mut self.diff_time, PhaseKind::Diff);
        add(&mut self.mount_time, PhaseKind::Mount);
        self.text_measure_time = self
            .text_measure_time
            .saturating_add(telemetry.text_measure_time());

        self.transaction_count += 1;
        self.text_measure_count += u64::from(telemetry.text_measure_count());
        self.mutation_count += u64::try_from(mutation_count).unwrap_or(u64::MAX);
        self.last_revision_number = telemetry.revision_number();

        if self.recent.len() == Self::MAX_RECENT {
            self.recent.pop_front();
        }
        self.recent.push_back(telemetry.clone());
    }

    /// Total time spent in layout.
    #[must_use]
    pub fn layout_time(&self) -> Duration {
        self.layout_time
    }

    /// Total time spent measuring text.
    #[must_use]
    pub fn text_measure_time(&self) -> Duration {
        self.text_measure_time
    }

    /// Total time spent committing.
    #[must_use]
    pub fn commit_time(&self) -> Duration {
        self.commit_time
    }

    /// Total time spent diffing.
    #[must_use]
    pub fn diff_time(&self) -> Duration {
        self.diff_time
    }

    /// Total time spent mounting.
    #[must_use]
    pub fn mount_time(&self) -> Duration {
        self.mount_time
    }

    /// Number of incorporated transactions.
    #[must_use]
    pub fn transaction_count(&self) -> u64 {
        self.transaction_count
    }

    /// Number of text measurements across all transactions.
    #[must_use]
    pub fn text_measure_count(&self) -> u64 {
        self.text_measure_count
    }

    /// Number of mutations across all transactions.
    #[must_use]
    pub fn mutation_count(&self) -> u64 {
        self.mutation_count
    }

    /// Revision number of the most recently incorporated transaction.
    #[must_use]
    pub fn last_revision_number(&self) -> u64 {
        self.last_revision_number
    }

    /// The most recent transactions, oldest first.
    pub fn recent(&self) -> impl ExactSizeIterator<Item = &TransactionTelemetry> {
        self.recent.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::HostTime;

    fn telemetry(revision: u64, mount_ticks: u64) -> TransactionTelemetry {
        let mut t = TransactionTelemetry::new();
        t.set_revision_number(revision);
        t.will_phase_at(PhaseKind::Mount, HostTime(100));
        t.did_phase_at(PhaseKind::Mount, HostTime(100 + mount_ticks));
        t
    }

    #[test]
    fn totals_accumulate() {
        let mut s = SurfaceTelemetry::default();
        s.incorporate(&telemetry(1, 5), 3);
        s.incorporate(&telemetry(2, 7), 4);
        assert_eq!(s.mount_time(), Duration(12));
        assert_eq!(s.diff_time(), Duration::ZERO);
        assert_eq!(s.transaction_count(), 2);
        assert_eq!(s.mutation_count(), 7);
        assert_eq!(s.last_revision_number(), 2);
    }

    #[test]
    fn recent_is_bounded() {
        let mut s = SurfaceTelemetry::default();
        for revision in 1..=20 {
            s.incorporate(&telemetry(revision, 1), 0);
        }
        assert_eq!(s.recent().len(), SurfaceTelemetry::MAX_RECENT);
        assert_eq!(s.recent().next().map(|t| t.revision_number()), Some(5));
    }
}
