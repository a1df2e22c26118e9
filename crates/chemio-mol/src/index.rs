//! Type-safe index wrappers
//!
//! Atoms, bonds and substructure groups are addressed by 0-based positions
//! in the owning molecule. File formats count from 1; the conversion happens
//! once, in [`AtomIndex::from_one_based`] and friends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker for an index that does not point anywhere
pub const INVALID_INDEX: u32 = u32::MAX;

macro_rules! define_index {
    (
        $(#[$meta:meta])*
        $name:ident, $debug_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Create a new 0-based index
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            /// Convert a 1-based file index; 0 has no 0-based counterpart
            #[inline]
            pub const fn from_one_based(index: u32) -> Option<Self> {
                if index == 0 {
                    None
                } else {
                    Some($name(index - 1))
                }
            }

            /// The 1-based number used when writing files
            #[inline]
            pub const fn one_based(&self) -> u32 {
                self.0 + 1
            }

            #[inline]
            pub const fn as_usize(&self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn is_valid(&self) -> bool {
                self.0 != INVALID_INDEX
            }

            #[inline]
            pub const fn invalid() -> Self {
                $name(INVALID_INDEX)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $debug_name, self.0)
                } else {
                    write!(f, "{}(INVALID)", $debug_name)
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}", self.0)
                } else {
                    write!(f, "INVALID")
                }
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                $name(index as u32)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(index: $name) -> Self {
                index.0 as usize
            }
        }
    };
}

define_index!(
    /// Position of an atom in a molecule
    AtomIndex, "AtomIndex"
);

define_index!(
    /// Position of a bond in a molecule
    BondIndex, "BondIndex"
);
