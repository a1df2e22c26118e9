//! Error types for building molecules

use thiserror::Error;

/// Errors raised when a draft molecule is given inconsistent content
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MolError {
    /// Atom index is out of bounds
    #[error("Atom index {0} is out of bounds (atom count: {1})")]
    AtomIndexOutOfBounds(u32, usize),

    /// Bond index is out of bounds
    #[error("Bond index {0} is out of bounds (bond count: {1})")]
    BondIndexOutOfBounds(u32, usize),

    /// Bond from an atom to itself
    #[error("Invalid bond: atom {0} bonded to itself")]
    SelfBond(u32),

    /// A bond between the two atoms already exists
    #[error("Duplicate bond between atoms {0} and {1}")]
    DuplicateBond(u32, u32),

    /// Sgroup parent reference does not point at a group
    #[error("Sgroup parent {0} is out of bounds (group count: {1})")]
    SgroupParentOutOfBounds(usize, usize),
}

impl MolError {
    pub fn atom_out_of_bounds(index: u32, count: usize) -> Self {
        MolError::AtomIndexOutOfBounds(index, count)
    }

    pub fn bond_out_of_bounds(index: u32, count: usize) -> Self {
        MolError::BondIndexOutOfBounds(index, count)
    }
}

/// Result type for molecule construction
pub type MolResult<T> = Result<T, MolError>;
