//! Molecular structure model for chemical file I/O
//!
//! This crate holds the in-memory representation that chemio readers build
//! and writers consume:
//!
//! - [`Atom`] - element, coordinates, charge, isotope, radical, mapping
//! - [`Bond`] - connectivity, order (including query types) and stereo marker
//! - [`Sgroup`] - substructure groups (abbreviations, repeat units, data)
//! - [`MoleculeDraft`] - mutable container filled while parsing
//! - [`Molecule`] - read-only result of [`MoleculeDraft::finalize`]
//!
//! # Example
//!
//! ```rust
//! use chemio_mol::{Atom, BondOrder, MoleculeDraft};
//!
//! let mut draft = MoleculeDraft::new("water");
//! let o = draft.add_atom(Atom::from_symbol("O"));
//! let h1 = draft.add_atom(Atom::from_symbol("H"));
//! let h2 = draft.add_atom(Atom::from_symbol("H"));
//! draft.add_bond(o, h1, BondOrder::Single).unwrap();
//! draft.add_bond(o, h2, BondOrder::Single).unwrap();
//!
//! let mol = draft.finalize().unwrap();
//! assert_eq!(mol.atom_count(), 3);
//! assert_eq!(mol.implicit_hydrogen_count(), 0);
//! ```

mod atom;
mod bond;
mod element;
mod error;
mod index;
mod molecule;
mod sgroup;
pub mod stereo;
pub mod valence;

pub use atom::{Atom, Radical};
pub use bond::{Bond, BondOrder, BondStereo, QueryBond};
pub use element::{Element, ELEMENT_COUNT};
pub use error::{MolError, MolResult};
pub use index::{AtomIndex, BondIndex, INVALID_INDEX};
pub use molecule::{Molecule, MoleculeDraft};
pub use sgroup::{Sgroup, SgroupBracket, SgroupConnectivity, SgroupType};
pub use stereo::{DoubleBondConfiguration, StereoElement, Winding};
