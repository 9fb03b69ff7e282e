// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-family state payloads.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use super::family::ShadowNodeFamily;

/// Immutable state payload attached to a family at a given revision.
///
/// A state keeps a non-owning handle to its family, so any historical state
/// can resolve the latest value through
/// [`most_recent`](Self::most_recent) without creating an ownership cycle.
pub struct State {
    family: Weak<ShadowNodeFamily>,
    generation: u64,
    data: Arc<dyn Any + Send + Sync>,
}

impl State {
    pub(super) fn new(
        family: Weak<ShadowNodeFamily>,
        generation: u64,
        data: Arc<dyn Any + Send + Sync>,
    ) -> Self {
        Self {
            family,
            generation,
            data,
        }
    }

    /// Returns the generation this state was minted with.
    ///
    /// Generations increase monotonically per family.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the payload if it has type `T`.
    #[must_use]
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref()
    }

    /// Returns the owning family, if it is still alive.
    #[must_use]
    pub fn family(&self) -> Option<Arc<ShadowNodeFamily>> {
        self.family.upgrade()
    }

    /// Returns the newest state published for this state's family.
    ///
    /// Returns `None` only when the family has been destroyed.
    #[must_use]
    pub fn most_recent(&self) -> Option<Arc<Self>> {
        self.family.upgrade()?.most_recent_state()
    }

    pub(super) fn belongs_to(&self, family: &ShadowNodeFamily) -> bool {
        std::ptr::eq(self.family.as_ptr(), family)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
