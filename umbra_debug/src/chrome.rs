// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each surface becomes a process. Commit-side phases (`commit`, `layout`)
//! land on thread 0 and mount-side phases (`diff`, `mount`) on thread 1, so
//! begin/end pairs nest correctly even when the two sides overlap.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use umbra_core::time::Timebase;
use umbra_core::trace::PhaseKind;
use umbra_core::tree::CommitStatus;

use crate::recorder::{RecordedEvent, decode};

const COMMIT_THREAD: u8 = 0;
const MOUNT_THREAD: u8 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
/// Transaction summaries carry no timestamp of their own; they are placed at
/// the timestamp of the most recent event before them.
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last_ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PhaseBegin(e) => {
                last_ts = ticks_to_us(e.timestamp.ticks(), timebase);
                events.push(json!({
                    "ph": "B",
                    "name": e.phase.name(),
                    "cat": "Transaction",
                    "ts": last_ts,
                    "pid": e.surface_id.0,
                    "tid": thread_for(e.phase),
                    "args": {
                        "revision": e.revision,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                last_ts = ticks_to_us(e.timestamp.ticks(), timebase);
                events.push(json!({
                    "ph": "E",
                    "name": e.phase.name(),
                    "cat": "Transaction",
                    "ts": last_ts,
                    "pid": e.surface_id.0,
                    "tid": thread_for(e.phase),
                    "args": {
                        "revision": e.revision,
                    }
                }));
            }
            RecordedEvent::Commit(e) => {
                last_ts = ticks_to_us(e.timestamp.ticks(), timebase);
                events.push(json!({
                    "ph": "i",
                    "name": "Commit",
                    "cat": "Commit",
                    "ts": last_ts,
                    "pid": e.surface_id.0,
                    "tid": COMMIT_THREAD,
                    "s": "t",
                    "args": {
                        "revision": e.revision,
                        "status": status_name(e.status),
                        "attempts": e.attempts,
                    }
                }));
            }
            RecordedEvent::TransactionSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "TransactionSummary",
                    "cat": "Summary",
                    "ts": last_ts,
                    "pid": s.surface_id.0,
                    "tid": MOUNT_THREAD,
                    "s": "p",
                    "args": {
                        "number": s.number,
                        "revision": s.revision,
                        "commit_us": ticks_to_us(s.commit_ticks, timebase),
                        "layout_us": ticks_to_us(s.layout_ticks, timebase),
                        "diff_us": ticks_to_us(s.diff_ticks, timebase),
                        "mount_us": ticks_to_us(s.mount_ticks, timebase),
                        "text_measure_us": ticks_to_us(s.text_measure_ticks, timebase),
                        "text_measure_count": s.text_measure_count,
                        "mutation_count": s.mutation_count,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn thread_for(phase: PhaseKind) -> u8 {
    match phase {
        PhaseKind::Commit | PhaseKind::Layout => COMMIT_THREAD,
        PhaseKind::Diff | PhaseKind::Mount => MOUNT_THREAD,
    }
}

fn status_name(status: CommitStatus) -> &'static str {
    match status {
        CommitStatus::Succeeded => "succeeded",
        CommitStatus::Failed => "failed",
        CommitStatus::Cancelled => "cancelled",
    }
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use umbra_core::id::SurfaceId;
    use umbra_core::time::HostTime;
    use umbra_core::trace::{
        CommitEvent, PhaseBeginEvent, PhaseEndEvent, TraceSink, TransactionSummary,
    };

    fn export_to_values(bytes: &[u8]) -> Vec<Value> {
        let mut out = Vec::new();
        export(bytes, Timebase::NANOS, &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn export_produces_valid_json() {
        let surface = SurfaceId(3);
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            surface_id: surface,
            revision: 1,
            phase: PhaseKind::Commit,
            timestamp: HostTime(1_000_000),
        });
        rec.on_phase_end(&PhaseEndEvent {
            surface_id: surface,
            revision: 1,
            phase: PhaseKind::Commit,
            timestamp: HostTime(1_000_500),
        });
        rec.on_commit(&CommitEvent {
            surface_id: surface,
            revision: 1,
            status: CommitStatus::Succeeded,
            attempts: 1,
            timestamp: HostTime(1_000_600),
        });

        let parsed = export_to_values(rec.as_bytes());
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "commit");
        assert_eq!(parsed[0]["pid"], 3);
        assert_eq!(parsed[0]["ts"], 1000.0);

        assert_eq!(parsed[1]["ph"], "E");
        assert_eq!(parsed[1]["ts"], 1000.5);

        assert_eq!(parsed[2]["ph"], "i");
        assert_eq!(parsed[2]["args"]["status"], "succeeded");
        assert_eq!(parsed[2]["args"]["attempts"], 1);
    }

    #[test]
    fn mount_phases_use_their_own_thread() {
        let surface = SurfaceId(1);
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            surface_id: surface,
            revision: 2,
            phase: PhaseKind::Layout,
            timestamp: HostTime(10),
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            surface_id: surface,
            revision: 1,
            phase: PhaseKind::Mount,
            timestamp: HostTime(20),
        });

        let parsed = export_to_values(rec.as_bytes());
        assert_eq!(parsed[0]["tid"], 0);
        assert_eq!(parsed[1]["tid"], 1);
    }

    #[test]
    fn summary_is_placed_after_last_phase() {
        let surface = SurfaceId(1);
        let mut rec = RecorderSink::new();
        rec.on_phase_end(&PhaseEndEvent {
            surface_id: surface,
            revision: 1,
            phase: PhaseKind::Mount,
            timestamp: HostTime(4_000),
        });
        rec.on_transaction_summary(&TransactionSummary {
            surface_id: surface,
            number: 1,
            revision: 1,
            mount_ticks: 2_000,
            mutation_count: 5,
            ..TransactionSummary::default()
        });

        let parsed = export_to_values(rec.as_bytes());
        assert_eq!(parsed[1]["name"], "TransactionSummary");
        assert_eq!(parsed[1]["ts"], 4.0);
        assert_eq!(parsed[1]["args"]["mount_us"], 2.0);
        assert_eq!(parsed[1]["args"]["mutation_count"], 5);
    }

    #[test]
    fn export_empty_recording() {
        assert!(export_to_values(&[]).is_empty());
    }
}
