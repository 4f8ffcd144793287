//! Stable handles into the kernel arenas
//!
//! Every schema element and every object instance is addressed by a small
//! copyable index. Handles are never reused for a different element, so a
//! handle kept across a deletion is detected as stale instead of aliasing.

use std::fmt;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Create a handle from a raw arena index
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            /// Arena index of this handle
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Raw handle value
            #[inline]
            pub const fn as_u32(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "#{}"), self.0)
            }
        }
    };
}

define_handle!(
    /// Handle of an object instance (or proxy) in the object arena
    ObjectId,
    "object"
);

define_handle!(
    /// Handle of a classifier (class, data type or enumeration)
    ClassifierId,
    "classifier"
);

define_handle!(
    /// Handle of a structural feature (attribute or reference)
    FeatureId,
    "feature"
);

define_handle!(
    /// Handle of an operation
    OperationId,
    "operation"
);

define_handle!(
    /// Handle of a package
    PackageId,
    "package"
);

/// Opaque token naming the resource that hosts a deferred reference
///
/// The kernel never interprets it; it is handed back verbatim to the
/// resolver together with the proxy path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource#{}", self.0)
    }
}
