// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-erased, shared component props.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;

/// Shared, immutable props of a shadow node.
///
/// The concrete schema belongs to the component; the core only stores and
/// compares props. Two `Props` are equal when they share the same allocation,
/// so cloning a node without new props never produces an update.
#[derive(Clone)]
pub struct Props(Arc<dyn Any + Send + Sync>);

impl Props {
    /// Wraps a props value.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Returns the props value if it has type `T`.
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Returns whether both handles share the same allocation.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Props {
    /// Returns the process-wide empty props instance.
    fn default() -> Self {
        static EMPTY: OnceLock<Props> = OnceLock::new();
        EMPTY.get_or_init(|| Self::new(())).clone()
    }
}

impl PartialEq for Props {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Props {}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Props({:p})", Arc::as_ptr(&self.0).cast::<()>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_identity() {
        let a = Props::new(1_u8);
        let b = Props::new(1_u8);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn default_is_shared() {
        assert_eq!(Props::default(), Props::default());
        assert_eq!(Props::default().get::<()>(), Some(&()));
    }
}
