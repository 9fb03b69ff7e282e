// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable shadow trees, tree diffing, and cross-thread mounting.
//!
//! `umbra_core` turns a sequence of immutable UI-tree snapshots into ordered,
//! minimal mutation scripts for a live native view hierarchy, and hands them
//! from the thread that produces trees to the thread that mounts views.
//!
//! # Architecture
//!
//! ```text
//!   producer thread                               mounting thread
//!   ───────────────                               ───────────────
//!   ShadowTree::commit(transform)
//!       │  transform(old root) ──► new root
//!       │  progress_state / will_commit / layout
//!       ▼
//!   ShadowTreeRevision { root, number + 1 }
//!       │
//!       ▼ push
//!   MountingCoordinator ◄──────────────── wait_for_transaction / pull_transaction
//!                                             │  diff(base root, last root)
//!                                             ▼
//!                                         MountingTransaction
//!                                             │
//!                                             ▼
//!                                         MutationExecutor::apply
//! ```
//!
//! **[`node`]**: Shadow nodes, families, props, states and layout metrics.
//! Nodes are immutable and structurally shared between revisions.
//!
//! **[`differ`]**: The structural diff producing
//! [`ShadowViewMutation`](mutation::ShadowViewMutation)s, with optional
//! reparenting detection and recursive teardown.
//!
//! **[`tree`]**: [`ShadowTree`](tree::ShadowTree) and its retrying commit
//! protocol.
//!
//! **[`coordinator`]**: [`MountingCoordinator`](coordinator::MountingCoordinator),
//! the push/pull hand-off between threads.
//!
//! **[`reconcile`]**: Bringing outdated states in a new tree up to date.
//!
//! **[`telemetry`]**: Phase timing per transaction and per surface, with a
//! thread-local current instance for nested measurements.
//!
//! **[`executor`]**: The [`MutationExecutor`](executor::MutationExecutor)
//! trait that view backends implement.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! pipeline instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod coordinator;
pub mod differ;
pub mod error;
pub mod executor;
pub mod id;
pub mod mutation;
pub mod node;
pub mod reconcile;
pub mod revision;
pub mod telemetry;
pub mod time;
pub mod trace;
pub mod tree;
pub mod view;
