// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Every record starts with a one-byte tag; decoding stops at the first
//! unknown tag or truncated record.

use umbra_core::id::SurfaceId;
use umbra_core::time::HostTime;
use umbra_core::trace::{
    CommitEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink, TransactionSummary,
};
use umbra_core::tree::CommitStatus;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PHASE_BEGIN: u8 = 1;
const TAG_PHASE_END: u8 = 2;
const TAG_COMMIT: u8 = 3;
const TAG_TRANSACTION_SUMMARY: u8 = 4;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Commit => 0,
            PhaseKind::Layout => 1,
            PhaseKind::Diff => 2,
            PhaseKind::Mount => 3,
        });
    }

    fn write_status(&mut self, s: CommitStatus) {
        self.write_u8(match s {
            CommitStatus::Succeeded => 0,
            CommitStatus::Failed => 1,
            CommitStatus::Cancelled => 2,
        });
    }

    fn write_phase_record(
        &mut self,
        tag: u8,
        surface_id: SurfaceId,
        revision: u64,
        phase: PhaseKind,
        timestamp: HostTime,
    ) {
        self.write_u8(tag);
        self.write_i32(surface_id.0);
        self.write_u64(revision);
        self.write_phase(phase);
        self.write_u64(timestamp.ticks());
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_phase_record(TAG_PHASE_BEGIN, e.surface_id, e.revision, e.phase, e.timestamp);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_phase_record(TAG_PHASE_END, e.surface_id, e.revision, e.phase, e.timestamp);
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.write_u8(TAG_COMMIT);
        self.write_i32(e.surface_id.0);
        self.write_u64(e.revision);
        self.write_status(e.status);
        self.write_u32(e.attempts);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_transaction_summary(&mut self, s: &TransactionSummary) {
        self.write_u8(TAG_TRANSACTION_SUMMARY);
        self.write_i32(s.surface_id.0);
        self.write_u64(s.number);
        self.write_u64(s.revision);
        self.write_u64(s.commit_ticks);
        self.write_u64(s.layout_ticks);
        self.write_u64(s.diff_ticks);
        self.write_u64(s.mount_ticks);
        self.write_u64(s.text_measure_ticks);
        self.write_u32(s.text_measure_count);
        self.write_u64(u64::try_from(s.mutation_count).unwrap_or(u64::MAX));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`CommitEvent`].
    Commit(CommitEvent),
    /// A [`TransactionSummary`].
    TransactionSummary(TransactionSummary),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Commit,
            1 => PhaseKind::Layout,
            2 => PhaseKind::Diff,
            3 => PhaseKind::Mount,
            _ => return None,
        })
    }

    fn read_status(&mut self) -> Option<CommitStatus> {
        Some(match self.read_u8()? {
            0 => CommitStatus::Succeeded,
            1 => CommitStatus::Failed,
            2 => CommitStatus::Cancelled,
            _ => return None,
        })
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            surface_id: SurfaceId(self.read_i32()?),
            revision: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            surface_id: SurfaceId(self.read_i32()?),
            revision: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_commit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Commit(CommitEvent {
            surface_id: SurfaceId(self.read_i32()?),
            revision: self.read_u64()?,
            status: self.read_status()?,
            attempts: self.read_u32()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_transaction_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TransactionSummary(TransactionSummary {
            surface_id: SurfaceId(self.read_i32()?),
            number: self.read_u64()?,
            revision: self.read_u64()?,
            commit_ticks: self.read_u64()?,
            layout_ticks: self.read_u64()?,
            diff_ticks: self.read_u64()?,
            mount_ticks: self.read_u64()?,
            text_measure_ticks: self.read_u64()?,
            text_measure_count: self.read_u32()?,
            mutation_count: usize::try_from(self.read_u64()?).unwrap_or(usize::MAX),
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_COMMIT => self.decode_commit(),
            TAG_TRANSACTION_SUMMARY => self.decode_transaction_summary(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SURFACE: SurfaceId = SurfaceId(11);

    fn sample_summary() -> TransactionSummary {
        TransactionSummary {
            surface_id: SURFACE,
            number: 4,
            revision: 9,
            commit_ticks: 120,
            layout_ticks: 300,
            diff_ticks: 45,
            mount_ticks: 800,
            text_measure_ticks: 60,
            text_measure_count: 3,
            mutation_count: 17,
        }
    }

    #[test]
    fn phase_events_decode_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            surface_id: SURFACE,
            revision: 2,
            phase: PhaseKind::Layout,
            timestamp: HostTime(2000),
        });
        rec.on_phase_end(&PhaseEndEvent {
            surface_id: SURFACE,
            revision: 2,
            phase: PhaseKind::Layout,
            timestamp: HostTime(3000),
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::PhaseBegin(e) => {
                assert_eq!(e.surface_id, SURFACE);
                assert_eq!(e.revision, 2);
                assert_eq!(e.phase, PhaseKind::Layout);
                assert_eq!(e.timestamp, HostTime(2000));
            }
            other => panic!("expected PhaseBegin, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::PhaseEnd(e) => {
                assert_eq!(e.phase, PhaseKind::Layout);
                assert_eq!(e.timestamp, HostTime(3000));
            }
            other => panic!("expected PhaseEnd, got {other:?}"),
        }
    }

    #[test]
    fn commit_event_keeps_status_and_attempts() {
        let mut rec = RecorderSink::new();
        rec.on_commit(&CommitEvent {
            surface_id: SURFACE,
            revision: 5,
            status: CommitStatus::Cancelled,
            attempts: 3,
            timestamp: HostTime(42),
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match events.as_slice() {
            [RecordedEvent::Commit(e)] => {
                assert_eq!(e.revision, 5);
                assert_eq!(e.status, CommitStatus::Cancelled);
                assert_eq!(e.attempts, 3);
                assert_eq!(e.timestamp, HostTime(42));
            }
            other => panic!("expected one Commit, got {other:?}"),
        }
    }

    #[test]
    fn transaction_summary_survives_recording() {
        let mut rec = RecorderSink::new();
        let orig = sample_summary();
        rec.on_transaction_summary(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match events.as_slice() {
            [RecordedEvent::TransactionSummary(s)] => assert_eq!(*s, orig),
            other => panic!("expected one TransactionSummary, got {other:?}"),
        }
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_transaction_summary(&sample_summary());
        rec.on_transaction_summary(&sample_summary());
        let bytes = rec.into_bytes();

        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn unknown_tag_stops_decoding() {
        let events: Vec<_> = decode(&[0xff, 1, 2, 3]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn clear_discards_recording() {
        let mut rec = RecorderSink::new();
        rec.on_transaction_summary(&sample_summary());
        rec.clear();
        assert!(rec.as_bytes().is_empty());
        assert_eq!(decode(rec.as_bytes()).count(), 0);
    }
}
