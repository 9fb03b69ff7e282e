// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Phase timing for transactions.
//!
//! [`TransactionTelemetry`] records paired start/end timestamps for the four
//! [`PhaseKind`]s of a transaction plus an accumulator for text measurement.
//! Each `will_*` call must be followed by exactly one matching `did_*` call;
//! violations, and reading a phase before it finished, are debug assertions.
//!
//! While a commit runs its layout pass, the telemetry being recorded is
//! installed as the thread's *current* telemetry through
//! [`TransactionTelemetry::set_as_thread_local`], so code deep in layout
//! (text measurement in particular) can record into it through
//! [`TransactionTelemetry::with_current`] without threading a parameter
//! through every call.
//!
//! [`SurfaceTelemetry`] aggregates the telemetry of mounted transactions, and
//! [`TelemetryController`] drives the mount phase on top of a
//! [`MountingCoordinator`](crate::coordinator::MountingCoordinator).

mod controller;
mod surface;

pub use controller::TelemetryController;
pub use surface::SurfaceTelemetry;

use std::cell::RefCell;
use std::fmt;

use crate::time::{Duration, HostTime};
use crate::trace::PhaseKind;

std::thread_local! {
    static CURRENT: RefCell<Option<TransactionTelemetry>> = const { RefCell::new(None) };
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct PhaseTimes {
    start: Option<HostTime>,
    end: Option<HostTime>,
}

/// Timestamps for the phases of one transaction.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TransactionTelemetry {
    phases: [PhaseTimes; 4],
    text_measure_start: Option<HostTime>,
    text_measure_time: Duration,
    text_measure_count: u32,
    revision_number: u64,
}

impl TransactionTelemetry {
    /// Creates telemetry with no phase recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Recording --

    /// Marks the start of `phase` at `time`.
    pub fn will_phase_at(&mut self, phase: PhaseKind, time: HostTime) {
        let times = &mut self.phases[phase.index()];
        debug_assert!(
            times.start.is_none(),
            "`will` called twice for the {} phase",
            phase.name()
        );
        times.start = Some(time);
    }

    /// Marks the end of `phase` at `time`.
    pub fn did_phase_at(&mut self, phase: PhaseKind, time: HostTime) {
        let times = &mut self.phases[phase.index()];
        debug_assert!(
            times.start.is_some() && times.end.is_none(),
            "`did` without a matching `will` for the {} phase",
            phase.name()
        );
        times.end = Some(time);
    }

    /// Marks the start of the commit phase now.
    pub fn will_commit(&mut self) {
        self.will_phase_at(PhaseKind::Commit, HostTime::now());
    }

    /// Marks the end of the commit phase now.
    pub fn did_commit(&mut self) {
        self.did_phase_at(PhaseKind::Commit, HostTime::now());
    }

    /// Marks the start of the layout phase now.
    pub fn will_layout(&mut self) {
        self.will_phase_at(PhaseKind::Layout, HostTime::now());
    }

    /// Marks the end of the layout phase now.
    pub fn did_layout(&mut self) {
        self.did_phase_at(PhaseKind::Layout, HostTime::now());
    }

    /// Marks the start of the diff phase now.
    pub fn will_diff(&mut self) {
        self.will_phase_at(PhaseKind::Diff, HostTime::now());
    }

    /// Marks the end of the diff phase now.
    pub fn did_diff(&mut self) {
        self.did_phase_at(PhaseKind::Diff, HostTime::now());
    }

    /// Marks the start of the mount phase now.
    pub fn will_mount(&mut self) {
        self.will_phase_at(PhaseKind::Mount, HostTime::now());
    }

    /// Marks the end of the mount phase now.
    pub fn did_mount(&mut self) {
        self.did_phase_at(PhaseKind::Mount, HostTime::now());
    }

    /// Marks the start of one text measurement.
    ///
    /// Text measurements may repeat; each one adds to the accumulated time.
    pub fn will_measure_text(&mut self) {
        debug_assert!(
            self.text_measure_start.is_none(),
            "text measurements must not nest"
        );
        self.text_measure_start = Some(HostTime::now());
    }

    /// Marks the end of the current text measurement.
    pub fn did_measure_text(&mut self) {
        debug_assert!(
            self.text_measure_start.is_some(),
            "`did_measure_text` without `will_measure_text`"
        );
        if let Some(start) = self.text_measure_start.take() {
            let elapsed = HostTime::now().saturating_duration_since(start);
            self.text_measure_time = self.text_measure_time.saturating_add(elapsed);
            self.text_measure_count += 1;
        }
    }

    /// Sets the revision number this telemetry describes.
    pub fn set_revision_number(&mut self, number: u64) {
        self.revision_number = number;
    }

    // -- Reading --

    /// Returns when `phase` started.
    ///
    /// The phase must have finished.
    #[must_use]
    pub fn start_time(&self, phase: PhaseKind) -> HostTime {
        self.assert_complete(phase);
        self.phases[phase.index()].start.unwrap_or_default()
    }

    /// Returns when `phase` ended.
    ///
    /// The phase must have finished.
    #[must_use]
    pub fn end_time(&self, phase: PhaseKind) -> HostTime {
        self.assert_complete(phase);
        self.phases[phase.index()].end.unwrap_or_default()
    }

    /// Returns how long `phase` took.
    ///
    /// The phase must have finished.
    #[must_use]
    pub fn duration(&self, phase: PhaseKind) -> Duration {
        self.end_time(phase)
            .saturating_duration_since(self.start_time(phase))
    }

    /// Returns when `phase` started, if it did.
    #[must_use]
    pub fn try_start_time(&self, phase: PhaseKind) -> Option<HostTime> {
        self.phases[phase.index()].start
    }

    /// Returns when `phase` ended, if it did.
    #[must_use]
    pub fn try_end_time(&self, phase: PhaseKind) -> Option<HostTime> {
        self.phases[phase.index()].end
    }

    /// Returns how long `phase` took, if it finished.
    #[must_use]
    pub fn try_duration(&self, phase: PhaseKind) -> Option<Duration> {
        let PhaseTimes { start, end } = self.phases[phase.index()];
        Some(end?.saturating_duration_since(start?))
    }

    /// Returns whether both ends of `phase` have been recorded.
    #[must_use]
    pub fn is_complete(&self, phase: PhaseKind) -> bool {
        let times = self.phases[phase.index()];
        times.start.is_some() && times.end.is_some()
    }

    /// Returns the total time spent measuring text.
    #[must_use]
    pub fn text_measure_time(&self) -> Duration {
        self.text_measure_time
    }

    /// Returns the number of completed text measurements.
    #[must_use]
    pub fn text_measure_count(&self) -> u32 {
        self.text_measure_count
    }

    /// Returns the revision number this telemetry describes.
    #[must_use]
    pub fn revision_number(&self) -> u64 {
        self.revision_number
    }

    fn assert_complete(&self, phase: PhaseKind) {
        debug_assert!(
            self.is_complete(phase),
            "the {} phase has not finished",
            phase.name()
        );
    }

    // -- Thread-local current instance --

    /// Installs this telemetry as the calling thread's current telemetry
    /// until the returned guard drops.
    ///
    /// The telemetry is moved into the thread-local slot; dropping the guard
    /// moves it back, including anything recorded through
    /// [`with_current`](Self::with_current) in between. Installations must
    /// not nest.
    #[must_use = "the telemetry is uninstalled when the guard drops"]
    pub fn set_as_thread_local(&mut self) -> CurrentTelemetryGuard<'_> {
        let value = std::mem::take(self);
        CURRENT.with(|slot| {
            let previous = slot.borrow_mut().replace(value);
            debug_assert!(
                previous.is_none(),
                "another telemetry is already installed on this thread"
            );
        });
        CurrentTelemetryGuard { owner: self }
    }

    /// Runs `f` with the calling thread's current telemetry, if one is
    /// installed.
    ///
    /// `f` must not call `with_current` itself.
    pub fn with_current<R>(f: impl FnOnce(&mut Self) -> R) -> Option<R> {
        CURRENT.with(|slot| slot.borrow_mut().as_mut().map(f))
    }

    /// Runs `measure` bracketed as a text measurement on the current
    /// telemetry, if one is installed.
    pub fn measure_text<R>(measure: impl FnOnce() -> R) -> R {
        Self::with_current(Self::will_measure_text);
        let result = measure();
        Self::with_current(Self::did_measure_text);
        result
    }
}

impl fmt::Debug for TransactionTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("TransactionTelemetry");
        s.field("revision_number", &self.revision_number);
        for phase in PhaseKind::ALL {
            if let Some(duration) = self.try_duration(phase) {
                s.field(phase.name(), &duration);
            }
        }
        s.field("text_measure_count", &self.text_measure_count)
            .finish_non_exhaustive()
    }
}

/// Keeps a [`TransactionTelemetry`] installed as the thread's current
/// telemetry.
///
/// Created by [`TransactionTelemetry::set_as_thread_local`].
#[derive(Debug)]
pub struct CurrentTelemetryGuard<'a> {
    owner: &'a mut TransactionTelemetry,
}

impl Drop for CurrentTelemetryGuard<'_> {
    fn drop(&mut self) {
        if let Some(value) = CURRENT.with(|slot| slot.borrow_mut().take()) {
            *self.owner = value;
        }
    }
}
