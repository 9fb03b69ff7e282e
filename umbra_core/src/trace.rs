// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the commit and mount pipeline.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! pipeline instrumentation calls at each stage. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Commit-side events (the `Commit` and `Layout` phases plus a
//! [`CommitEvent`]) come from [`ShadowTree::commit_traced`]; mount-side events
//! (the `Diff` and `Mount` phases plus a [`TransactionSummary`]) come from
//! [`TelemetryController::pull_transaction`].
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//!
//! [`ShadowTree::commit_traced`]: crate::tree::ShadowTree::commit_traced
//! [`TelemetryController::pull_transaction`]: crate::telemetry::TelemetryController::pull_transaction

use crate::coordinator::MountingTransaction;
use crate::id::SurfaceId;
use crate::telemetry::TransactionTelemetry;
use crate::time::HostTime;
use crate::tree::CommitStatus;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a transaction is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Running the transform and installing the new revision.
    Commit,
    /// Running the layout engine over the new tree.
    Layout,
    /// Diffing the mounted revision against the new one.
    Diff,
    /// Applying the mutations to the view hierarchy.
    Mount,
}

impl PhaseKind {
    /// Every phase, in pipeline order.
    pub const ALL: [Self; 4] = [Self::Commit, Self::Layout, Self::Diff, Self::Mount];

    /// Returns a short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Layout => "layout",
            Self::Diff => "diff",
            Self::Mount => "mount",
        }
    }

    /// Maps the phase to an array index.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Commit => 0,
            Self::Layout => 1,
            Self::Diff => 2,
            Self::Mount => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Surface the transaction belongs to.
    pub surface_id: SurfaceId,
    /// Revision number the phase works on.
    pub revision: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Surface the transaction belongs to.
    pub surface_id: SurfaceId,
    /// Revision number the phase works on.
    pub revision: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted once per [`ShadowTree::commit_traced`](crate::tree::ShadowTree::commit_traced) call.
#[derive(Clone, Copy, Debug)]
pub struct CommitEvent {
    /// Surface that was committed to.
    pub surface_id: SurfaceId,
    /// Current revision number after the call.
    pub revision: u64,
    /// Outcome of the call.
    pub status: CommitStatus,
    /// Number of attempts, including the successful one.
    pub attempts: u32,
    /// Host time when the call returned.
    pub timestamp: HostTime,
}

/// Per-transaction timing summary, emitted after mounting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransactionSummary {
    /// Surface the transaction belongs to.
    pub surface_id: SurfaceId,
    /// Transaction number.
    pub number: u64,
    /// Revision number the transaction brings the view hierarchy to.
    pub revision: u64,
    /// Commit phase duration in ticks (0 if not measured).
    pub commit_ticks: u64,
    /// Layout phase duration in ticks (0 if not measured).
    pub layout_ticks: u64,
    /// Diff phase duration in ticks (0 if not measured).
    pub diff_ticks: u64,
    /// Mount phase duration in ticks (0 if not measured).
    pub mount_ticks: u64,
    /// Total time spent measuring text, in ticks.
    pub text_measure_ticks: u64,
    /// Number of text measurements.
    pub text_measure_count: u32,
    /// Number of mutations applied.
    pub mutation_count: usize,
}

impl TransactionSummary {
    /// Summarizes a transaction and its telemetry.
    #[must_use]
    pub fn from_transaction(transaction: &MountingTransaction) -> Self {
        let telemetry = transaction.telemetry();
        Self {
            surface_id: transaction.surface_id(),
            number: transaction.number(),
            revision: telemetry.revision_number(),
            commit_ticks: measured(telemetry, PhaseKind::Commit),
            layout_ticks: measured(telemetry, PhaseKind::Layout),
            diff_ticks: measured(telemetry, PhaseKind::Diff),
            mount_ticks: measured(telemetry, PhaseKind::Mount),
            text_measure_ticks: telemetry.text_measure_time().ticks(),
            text_measure_count: telemetry.text_measure_count(),
            mutation_count: transaction.mutations().len(),
        }
    }
}

fn measured(telemetry: &TransactionTelemetry, phase: PhaseKind) -> u64 {
    telemetry
        .try_duration(phase)
        .map_or(0, |duration| duration.ticks())
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the pipeline.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the beginning of a phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a commit call returns.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }

    /// Called with a per-transaction timing summary.
    fn on_transaction_summary(&mut self, s: &TransactionSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: std::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl std::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: std::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: std::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommitEvent`].
    #[inline]
    pub fn commit(&mut self, e: &CommitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_commit(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TransactionSummary`].
    #[inline]
    pub fn transaction_summary(&mut self, s: &TransactionSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_transaction_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits begin and end events for every completed phase in `telemetry`
    /// out of `phases`.
    pub(crate) fn telemetry_phases(
        &mut self,
        surface_id: SurfaceId,
        telemetry: &TransactionTelemetry,
        phases: &[PhaseKind],
    ) {
        for &phase in phases {
            let (Some(start), Some(end)) = (
                telemetry.try_start_time(phase),
                telemetry.try_end_time(phase),
            ) else {
                continue;
            };
            let revision = telemetry.revision_number();
            self.phase_begin(&PhaseBeginEvent {
                surface_id,
                revision,
                phase,
                timestamp: start,
            });
            self.phase_end(&PhaseEndEvent {
                surface_id,
                revision,
                phase,
                timestamp: end,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
