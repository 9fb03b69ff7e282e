// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].
//!
//! [`format_mutations`] renders a mutation list one instruction per line,
//! which is handy in test failure messages.

use std::fmt::Write as _;
use std::io::Write;

use umbra_core::mutation::ShadowViewMutation;
use umbra_core::time::{HostTime, Timebase};
use umbra_core::trace::{
    CommitEvent, PhaseBeginEvent, PhaseEndEvent, TraceSink, TransactionSummary,
};
use umbra_core::tree::CommitStatus;

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ticks_to_us(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1000.0
    }

    fn host_us(&self, t: HostTime) -> f64 {
        self.ticks_to_us(t.ticks())
    }
}

fn status_label(status: CommitStatus) -> &'static str {
    match status {
        CommitStatus::Succeeded => "ok",
        CommitStatus::Failed => "FAILED",
        CommitStatus::Cancelled => "cancelled",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] surface={} rev={} {} at {:.1}µs",
            e.surface_id,
            e.revision,
            e.phase.name(),
            self.host_us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] surface={} rev={} {} at {:.1}µs",
            e.surface_id,
            e.revision,
            e.phase.name(),
            self.host_us(e.timestamp),
        );
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        let _ = writeln!(
            self.writer,
            "[commit] surface={} rev={} status={} attempts={}",
            e.surface_id,
            e.revision,
            status_label(e.status),
            e.attempts,
        );
    }

    fn on_transaction_summary(&mut self, s: &TransactionSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] surface={} tx={} rev={} mutations={} commit={:.1}µs \
             layout={:.1}µs diff={:.1}µs mount={:.1}µs text={}x/{:.1}µs",
            s.surface_id,
            s.number,
            s.revision,
            s.mutation_count,
            self.ticks_to_us(s.commit_ticks),
            self.ticks_to_us(s.layout_ticks),
            self.ticks_to_us(s.diff_ticks),
            self.ticks_to_us(s.mount_ticks),
            s.text_measure_count,
            self.ticks_to_us(s.text_measure_ticks),
        );
    }
}

/// Renders mutations one per line, in order.
///
/// Lines end with a newline; an empty list renders as an empty string.
#[must_use]
pub fn format_mutations(mutations: &[ShadowViewMutation]) -> String {
    let mut out = String::new();
    for mutation in mutations {
        let _ = writeln!(out, "{mutation}");
    }
    out
}
