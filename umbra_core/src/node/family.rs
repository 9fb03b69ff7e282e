// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-revision element identity.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::state::State;
use crate::id::{SurfaceId, Tag};

/// Name of the component type that produces a family's native view.
pub type ComponentName = &'static str;

/// Persistent identity of one UI element across all revisions.
///
/// A family is created once, when the element first appears, and is shared by
/// every [`ShadowNode`](super::ShadowNode) snapshot of that element. It also
/// owns the element's *most recent state*: a slot that only ever advances to a
/// [`State`] with a higher generation, no matter in which order commits
/// publish states.
pub struct ShadowNodeFamily {
    tag: Tag,
    surface_id: SurfaceId,
    component_name: ComponentName,
    state_generation: AtomicU64,
    most_recent_state: Mutex<Option<Arc<State>>>,
}

impl ShadowNodeFamily {
    /// Creates a new family.
    #[must_use]
    pub fn new(tag: Tag, surface_id: SurfaceId, component_name: ComponentName) -> Arc<Self> {
        Arc::new(Self {
            tag,
            surface_id,
            component_name,
            state_generation: AtomicU64::new(0),
            most_recent_state: Mutex::new(None),
        })
    }

    /// Returns the element's tag.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Returns the surface this element belongs to.
    #[inline]
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Returns the component name.
    #[inline]
    #[must_use]
    pub fn component_name(&self) -> ComponentName {
        self.component_name
    }

    /// Mints a new state for this family with the next generation number.
    ///
    /// The state is not published until a node carrying it is constructed
    /// (see [`set_most_recent_state`](Self::set_most_recent_state)).
    pub fn new_state<T>(self: &Arc<Self>, data: T) -> Arc<State>
    where
        T: std::any::Any + Send + Sync,
    {
        let generation = self.state_generation.fetch_add(1, Ordering::Relaxed) + 1;
        Arc::new(State::new(Arc::downgrade(self), generation, Arc::new(data)))
    }

    /// Returns the newest state ever published for this family.
    #[must_use]
    pub fn most_recent_state(&self) -> Option<Arc<State>> {
        self.most_recent_state.lock().clone()
    }

    /// Publishes `state` as the most recent one if its generation is strictly
    /// greater than the current one.
    ///
    /// Returns whether the slot advanced.
    pub fn set_most_recent_state(&self, state: Arc<State>) -> bool {
        debug_assert!(
            state.belongs_to(self),
            "state published to a foreign family"
        );
        let mut slot = self.most_recent_state.lock();
        match slot.as_ref() {
            Some(current) if current.generation() >= state.generation() => false,
            _ => {
                *slot = Some(state);
                true
            }
        }
    }
}

impl fmt::Debug for ShadowNodeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowNodeFamily")
            .field("tag", &self.tag)
            .field("surface_id", &self.surface_id)
            .field("component_name", &self.component_name)
            .finish_non_exhaustive()
    }
}
