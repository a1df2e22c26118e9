//! Molecule containers
//!
//! Readers populate a [`MoleculeDraft`] line by line. Once the terminating
//! marker of a record has been seen the draft is turned into a read-only
//! [`Molecule`] by [`MoleculeDraft::finalize`], which also runs valence
//! inference and, on request, stereo perception.

use std::fmt;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder, BondStereo};
use crate::error::{MolError, MolResult};
use crate::index::{AtomIndex, BondIndex};
use crate::sgroup::Sgroup;
use crate::stereo::{self, StereoElement};
use crate::valence;

type Adjacency = Vec<SmallVec<[BondIndex; 4]>>;

/// A molecule under construction
#[derive(Debug, Clone, Default)]
pub struct MoleculeDraft {
    /// First header line (molecule name)
    pub title: String,
    /// Second header line (program, timestamp, dimension code)
    pub program_line: String,
    /// Third header line (free comment)
    pub comment: String,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Adjacency,
    properties: IndexMap<String, String>,
    sgroups: Vec<Sgroup>,
    stereo: Vec<StereoElement>,
}

impl MoleculeDraft {
    pub fn new(title: impl Into<String>) -> Self {
        MoleculeDraft {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_capacity(title: impl Into<String>, atoms: usize, bonds: usize) -> Self {
        MoleculeDraft {
            title: title.into(),
            atoms: Vec::with_capacity(atoms),
            bonds: Vec::with_capacity(bonds),
            adjacency: Vec::with_capacity(atoms),
            ..Default::default()
        }
    }

    // =========================================================================
    // Atoms
    // =========================================================================

    /// Append an atom and return its index
    pub fn add_atom(&mut self, atom: Atom) -> AtomIndex {
        let index = AtomIndex(self.atoms.len() as u32);
        self.atoms.push(atom);
        self.adjacency.push(SmallVec::new());
        index
    }

    #[inline]
    pub fn atom(&self, index: AtomIndex) -> Option<&Atom> {
        self.atoms.get(index.as_usize())
    }

    #[inline]
    pub fn atom_mut(&mut self, index: AtomIndex) -> Option<&mut Atom> {
        self.atoms.get_mut(index.as_usize())
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn atoms_mut(&mut self) -> impl Iterator<Item = &mut Atom> {
        self.atoms.iter_mut()
    }

    // =========================================================================
    // Bonds
    // =========================================================================

    /// Add a bond between two existing atoms
    ///
    /// Fails for indices past the current atom count, self bonds, and
    /// duplicates of an existing bond.
    pub fn add_bond(
        &mut self,
        begin: AtomIndex,
        end: AtomIndex,
        order: BondOrder,
    ) -> MolResult<BondIndex> {
        self.add_bond_with_stereo(begin, end, order, BondStereo::None)
    }

    pub fn add_bond_with_stereo(
        &mut self,
        begin: AtomIndex,
        end: AtomIndex,
        order: BondOrder,
        stereo: BondStereo,
    ) -> MolResult<BondIndex> {
        let n_atoms = self.atoms.len();
        for index in [begin, end] {
            if index.as_usize() >= n_atoms {
                return Err(MolError::atom_out_of_bounds(index.0, n_atoms));
            }
        }
        if begin == end {
            return Err(MolError::SelfBond(begin.0));
        }
        if self.find_bond(begin, end).is_some() {
            return Err(MolError::DuplicateBond(begin.0, end.0));
        }

        let index = BondIndex(self.bonds.len() as u32);
        self.bonds.push(Bond::new(begin, end, order).with_stereo(stereo));
        self.adjacency[begin.as_usize()].push(index);
        self.adjacency[end.as_usize()].push(index);
        Ok(index)
    }

    #[inline]
    pub fn bond(&self, index: BondIndex) -> Option<&Bond> {
        self.bonds.get(index.as_usize())
    }

    #[inline]
    pub fn bond_mut(&mut self, index: BondIndex) -> Option<&mut Bond> {
        self.bonds.get_mut(index.as_usize())
    }

    #[inline]
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn find_bond(&self, a: AtomIndex, b: AtomIndex) -> Option<BondIndex> {
        find_bond(&self.bonds, &self.adjacency, a, b)
    }

    // =========================================================================
    // Properties, groups, stereo
    // =========================================================================

    /// Set a string property; re-setting a key keeps its original position
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Add a substructure group after checking its references
    pub fn add_sgroup(&mut self, sgroup: Sgroup) -> MolResult<usize> {
        for atom in &sgroup.atoms {
            if atom.as_usize() >= self.atoms.len() {
                return Err(MolError::atom_out_of_bounds(atom.0, self.atoms.len()));
            }
        }
        for bond in &sgroup.bonds {
            if bond.as_usize() >= self.bonds.len() {
                return Err(MolError::bond_out_of_bounds(bond.0, self.bonds.len()));
            }
        }
        // parent bounds are checked in finalize: parents may be added after children
        self.sgroups.push(sgroup);
        Ok(self.sgroups.len() - 1)
    }

    pub fn sgroup_count(&self) -> usize {
        self.sgroups.len()
    }

    pub fn add_stereo_element(&mut self, element: StereoElement) {
        self.stereo.push(element);
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    /// Finalize without stereo perception
    pub fn finalize(self) -> MolResult<Molecule> {
        self.finalize_with(false)
    }

    /// Run valence inference (and optionally stereo perception) and freeze the draft
    pub fn finalize_with(mut self, perceive_stereo: bool) -> MolResult<Molecule> {
        let n_groups = self.sgroups.len();
        for group in &self.sgroups {
            if let Some(parent) = group.parent {
                if parent >= n_groups {
                    return Err(MolError::SgroupParentOutOfBounds(parent, n_groups));
                }
            }
        }

        valence::assign_implicit_hydrogens(&mut self.atoms, &self.bonds, &self.adjacency);

        if perceive_stereo {
            let perceived = stereo::perceive(&self.atoms, &self.bonds, &self.adjacency);
            for element in perceived {
                if !self.stereo.contains(&element) {
                    self.stereo.push(element);
                }
            }
        }

        Ok(Molecule {
            title: self.title,
            program_line: self.program_line,
            comment: self.comment,
            atoms: self.atoms,
            bonds: self.bonds,
            adjacency: self.adjacency,
            properties: self.properties,
            sgroups: self.sgroups,
            stereo: self.stereo,
        })
    }
}

/// A finalized, read-only molecule
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    title: String,
    program_line: String,
    comment: String,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Adjacency,
    properties: IndexMap<String, String>,
    sgroups: Vec<Sgroup>,
    stereo: Vec<StereoElement>,
}

impl Molecule {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn program_line(&self) -> &str {
        &self.program_line
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    #[inline]
    pub fn atom(&self, index: AtomIndex) -> Option<&Atom> {
        self.atoms.get(index.as_usize())
    }

    #[inline]
    pub fn bond(&self, index: BondIndex) -> Option<&Bond> {
        self.bonds.get(index.as_usize())
    }

    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter()
    }

    pub fn atoms_indexed(&self) -> impl Iterator<Item = (AtomIndex, &Atom)> {
        self.atoms
            .iter()
            .enumerate()
            .map(|(i, a)| (AtomIndex(i as u32), a))
    }

    pub fn bonds(&self) -> impl Iterator<Item = &Bond> {
        self.bonds.iter()
    }

    pub fn bonds_indexed(&self) -> impl Iterator<Item = (BondIndex, &Bond)> {
        self.bonds
            .iter()
            .enumerate()
            .map(|(i, b)| (BondIndex(i as u32), b))
    }

    /// Bonds touching an atom
    pub fn atom_bonds(&self, atom: AtomIndex) -> &[BondIndex] {
        self.adjacency
            .get(atom.as_usize())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn neighbors(&self, atom: AtomIndex) -> Vec<AtomIndex> {
        self.atom_bonds(atom)
            .iter()
            .filter_map(|&b| self.bonds.get(b.as_usize()).and_then(|bond| bond.other(atom)))
            .collect()
    }

    pub fn find_bond(&self, a: AtomIndex, b: AtomIndex) -> Option<BondIndex> {
        find_bond(&self.bonds, &self.adjacency, a, b)
    }

    pub fn properties(&self) -> &IndexMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn sgroups(&self) -> &[Sgroup] {
        &self.sgroups
    }

    pub fn stereo_elements(&self) -> &[StereoElement] {
        &self.stereo
    }

    /// True when any atom carries 3D coordinates
    pub fn has_3d_coordinates(&self) -> bool {
        self.atoms.iter().any(|a| a.point3d.is_some())
    }

    pub fn has_2d_coordinates(&self) -> bool {
        self.atoms.iter().any(|a| a.point2d.is_some())
    }

    /// Sum of implicit hydrogens over all atoms
    pub fn implicit_hydrogen_count(&self) -> u32 {
        self.atoms
            .iter()
            .map(|a| a.implicit_hydrogens.unwrap_or(0) as u32)
            .sum()
    }

    /// Reopen the molecule for editing
    pub fn into_draft(self) -> MoleculeDraft {
        MoleculeDraft {
            title: self.title,
            program_line: self.program_line,
            comment: self.comment,
            atoms: self.atoms,
            bonds: self.bonds,
            adjacency: self.adjacency,
            properties: self.properties,
            sgroups: self.sgroups,
            stereo: self.stereo,
        }
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} atoms, {} bonds",
            if self.title.is_empty() { "<untitled>" } else { &self.title },
            self.atoms.len(),
            self.bonds.len()
        )
    }
}

fn find_bond(bonds: &[Bond], adjacency: &Adjacency, a: AtomIndex, b: AtomIndex) -> Option<BondIndex> {
    adjacency
        .get(a.as_usize())?
        .iter()
        .copied()
        .find(|idx| bonds.get(idx.as_usize()).is_some_and(|bond| bond.connects(a, b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sgroup::SgroupType;

    fn ethanol() -> MoleculeDraft {
        let mut draft = MoleculeDraft::new("ethanol");
        let c1 = draft.add_atom(Atom::from_symbol("C"));
        let c2 = draft.add_atom(Atom::from_symbol("C"));
        let o = draft.add_atom(Atom::from_symbol("O"));
        draft.add_bond(c1, c2, BondOrder::Single).unwrap();
        draft.add_bond(c2, o, BondOrder::Single).unwrap();
        draft
    }

    #[test]
    fn test_bond_validation() {
        let mut draft = ethanol();
        assert_eq!(
            draft.add_bond(AtomIndex(0), AtomIndex(7), BondOrder::Single),
            Err(MolError::AtomIndexOutOfBounds(7, 3))
        );
        assert_eq!(
            draft.add_bond(AtomIndex(1), AtomIndex(1), BondOrder::Single),
            Err(MolError::SelfBond(1))
        );
        assert_eq!(
            draft.add_bond(AtomIndex(1), AtomIndex(0), BondOrder::Double),
            Err(MolError::DuplicateBond(1, 0))
        );
    }

    #[test]
    fn test_finalize_assigns_hydrogens() {
        let mol = ethanol().finalize().unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.implicit_hydrogen_count(), 6);
        assert_eq!(mol.neighbors(AtomIndex(1)), vec![AtomIndex(0), AtomIndex(2)]);
    }

    #[test]
    fn test_properties_keep_insertion_order() {
        let mut draft = ethanol();
        draft.set_property("b", "1");
        draft.set_property("a", "2");
        draft.set_property("b", "3");
        let mol = draft.finalize().unwrap();
        let keys: Vec<_> = mol.properties().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(mol.property("b"), Some("3"));
    }

    #[test]
    fn test_sgroup_checks() {
        let mut draft = ethanol();
        let mut group = Sgroup::new(SgroupType::Superatom);
        group.atoms = vec![AtomIndex(2)];
        assert_eq!(draft.add_sgroup(group.clone()), Ok(0));

        group.atoms = vec![AtomIndex(9)];
        assert!(draft.add_sgroup(group).is_err());

        let mut orphan = Sgroup::new(SgroupType::Data);
        orphan.parent = Some(4);
        draft.add_sgroup(orphan).unwrap();
        assert_eq!(draft.finalize().unwrap_err(), MolError::SgroupParentOutOfBounds(4, 2));
    }

    #[test]
    fn test_display() {
        let mol = ethanol().finalize().unwrap();
        assert_eq!(mol.to_string(), "ethanol: 3 atoms, 2 bonds");
    }
}
