//! Identity types for Tessera entities.
//!
//! All identifiers are 64-bit values that are:
//! - Unique within their kind
//! - Immutable once assigned
//! - Zero when unset

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create a new ID from a raw value.
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the raw value.
            pub fn raw(&self) -> u64 {
                self.0
            }

            /// Returns true if the ID was never assigned.
            pub fn is_zero(&self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(
    /// Identifier of a namespace (tenant).
    NamespaceId,
    "ns"
);
define_id!(
    /// Identifier of a module (runtime schema) within a namespace.
    ModuleId,
    "m"
);
define_id!(
    /// Identifier of a record.
    RecordId,
    "r"
);
define_id!(
    /// Identifier of a user (actor, owner, reference target).
    UserId,
    "u"
);

/// Allocates strictly increasing, never-zero IDs.
///
/// Safe to share between threads; concurrent callers never observe the same ID.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Create a generator whose first ID is 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Create a generator whose first ID is `first` (clamped to 1).
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first.max(1)),
        }
    }

    /// Allocate the next raw ID.
    pub fn next_raw(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Allocate the next record ID.
    pub fn next_record_id(&self) -> RecordId {
        RecordId::new(self.next_raw())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
