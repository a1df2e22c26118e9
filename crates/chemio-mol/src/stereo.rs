//! Stereo elements and their perception from coordinates
//!
//! Tetrahedral centres are perceived from 3D coordinates, or from 2D
//! coordinates plus wedge bonds drawn from the centre. Double bond
//! configurations come from the positions of the first substituent on
//! each side.

use lin_alg::f32::Vec3;
use smallvec::SmallVec;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder, BondStereo};
use crate::index::{AtomIndex, BondIndex};

const EPSILON: f32 = 1e-4;

/// Looking from the first neighbour, the turn made by the other three
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winding {
    Clockwise,
    Anticlockwise,
}

/// Relative placement of the reference substituents of a double bond
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoubleBondConfiguration {
    /// Same side (cis / Z-like)
    Together,
    /// Opposite sides (trans / E-like)
    Opposite,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StereoElement {
    Tetrahedral {
        focus: AtomIndex,
        /// Neighbours in increasing index order; the winding refers to this order
        neighbors: SmallVec<[AtomIndex; 4]>,
        winding: Winding,
    },
    DoubleBond {
        bond: BondIndex,
        /// Reference substituents on the begin and end atom
        references: [AtomIndex; 2],
        configuration: DoubleBondConfiguration,
    },
}

/// Perceive all stereo elements that the geometry defines
pub fn perceive(
    atoms: &[Atom],
    bonds: &[Bond],
    adjacency: &[SmallVec<[BondIndex; 4]>],
) -> Vec<StereoElement> {
    let mut elements = Vec::new();
    for focus in 0..atoms.len() {
        if let Some(element) = tetrahedral(atoms, bonds, adjacency, AtomIndex(focus as u32)) {
            elements.push(element);
        }
    }
    for (i, bond) in bonds.iter().enumerate() {
        if bond.order == BondOrder::Double && bond.stereo != BondStereo::EOrZ {
            if let Some(element) = double_bond(atoms, bonds, adjacency, BondIndex(i as u32)) {
                elements.push(element);
            }
        }
    }
    elements
}

fn neighbors_of(
    bonds: &[Bond],
    adjacency: &[SmallVec<[BondIndex; 4]>],
    atom: AtomIndex,
) -> SmallVec<[(AtomIndex, BondIndex); 4]> {
    let mut result: SmallVec<[(AtomIndex, BondIndex); 4]> = adjacency
        .get(atom.as_usize())
        .into_iter()
        .flatten()
        .filter_map(|&b| bonds.get(b.as_usize()).and_then(|bond| bond.other(atom)).map(|n| (n, b)))
        .collect();
    result.sort_by_key(|(n, _)| *n);
    result
}

fn tetrahedral(
    atoms: &[Atom],
    bonds: &[Bond],
    adjacency: &[SmallVec<[BondIndex; 4]>],
    focus: AtomIndex,
) -> Option<StereoElement> {
    let centre = atoms.get(focus.as_usize())?;
    let neighbors = neighbors_of(bonds, adjacency, focus);
    if !(3..=4).contains(&neighbors.len()) {
        return None;
    }

    let mut points: SmallVec<[Vec3; 4]> = SmallVec::new();
    let origin;
    if let Some(p) = centre.point3d.filter(|_| centre.stereo_parity != 0) {
        origin = p;
        for (n, _) in &neighbors {
            points.push(atoms.get(n.as_usize())?.point3d?);
        }
    } else {
        let [x, y] = centre.point2d?;
        origin = Vec3::new(x, y, 0.0);
        let mut wedged = false;
        for (n, b) in &neighbors {
            let [nx, ny] = atoms.get(n.as_usize())?.point2d?;
            let bond = &bonds[b.as_usize()];
            // only wedges whose narrow end sits on this centre count
            let z = match bond.stereo {
                BondStereo::Up if bond.begin == focus => 1.0,
                BondStereo::Down if bond.begin == focus => -1.0,
                BondStereo::Either => return None,
                _ => 0.0,
            };
            wedged |= z != 0.0;
            points.push(Vec3::new(nx, ny, z));
        }
        if !wedged {
            return None;
        }
    }

    let a = points[0] - origin;
    let b = points[1] - origin;
    let c = points[2] - origin;
    let volume = a.dot(b.cross(c));
    if volume.abs() < EPSILON {
        return None;
    }
    Some(StereoElement::Tetrahedral {
        focus,
        neighbors: neighbors.iter().map(|(n, _)| *n).collect(),
        winding: if volume > 0.0 {
            Winding::Anticlockwise
        } else {
            Winding::Clockwise
        },
    })
}

fn double_bond(
    atoms: &[Atom],
    bonds: &[Bond],
    adjacency: &[SmallVec<[BondIndex; 4]>],
    index: BondIndex,
) -> Option<StereoElement> {
    let bond = bonds.get(index.as_usize())?;
    let reference = |atom: AtomIndex, other: AtomIndex| -> Option<AtomIndex> {
        let neighbors = neighbors_of(bonds, adjacency, atom);
        if !(2..=3).contains(&neighbors.len()) {
            return None;
        }
        if neighbors
            .iter()
            .any(|(_, b)| bonds[b.as_usize()].stereo == BondStereo::Either)
        {
            return None;
        }
        neighbors.iter().map(|(n, _)| *n).find(|n| *n != other)
    };
    let ref_begin = reference(bond.begin, bond.end)?;
    let ref_end = reference(bond.end, bond.begin)?;

    let position = |i: AtomIndex| atoms.get(i.as_usize()).and_then(Atom::position);
    let begin = position(bond.begin)?;
    let end = position(bond.end)?;
    let axis = end - begin;
    let axis_len2 = axis.dot(axis);
    if axis_len2 < EPSILON {
        return None;
    }
    // substituent directions with the bond-axis component removed
    let project = |v: Vec3| v - axis * (v.dot(axis) / axis_len2);
    let u = project(position(ref_begin)? - begin);
    let v = project(position(ref_end)? - end);
    let side = u.dot(v);
    if side.abs() < EPSILON {
        return None;
    }
    Some(StereoElement::DoubleBond {
        bond: index,
        references: [ref_begin, ref_end],
        configuration: if side > 0.0 {
            DoubleBondConfiguration::Together
        } else {
            DoubleBondConfiguration::Opposite
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::MoleculeDraft;

    #[test]
    fn test_but2ene_configuration() {
        // trans-but-2-ene drawn in 2D
        let mut draft = MoleculeDraft::new("trans");
        let c1 = draft.add_atom(Atom::from_symbol("C").with_point2d(-1.3, 0.75));
        let c2 = draft.add_atom(Atom::from_symbol("C").with_point2d(0.0, 0.0));
        let c3 = draft.add_atom(Atom::from_symbol("C").with_point2d(1.3, 0.75));
        let c4 = draft.add_atom(Atom::from_symbol("C").with_point2d(2.6, 0.0));
        draft.add_bond(c1, c2, BondOrder::Single).unwrap();
        draft.add_bond(c2, c3, BondOrder::Double).unwrap();
        draft.add_bond(c3, c4, BondOrder::Single).unwrap();

        let mol = draft.finalize_with(true).unwrap();
        let configs: Vec<_> = mol
            .stereo_elements()
            .iter()
            .filter_map(|e| match e {
                StereoElement::DoubleBond { configuration, .. } => Some(*configuration),
                _ => None,
            })
            .collect();
        assert_eq!(configs, vec![DoubleBondConfiguration::Opposite]);
    }

    #[test]
    fn test_unspecified_double_bond_is_skipped() {
        let mut draft = MoleculeDraft::new("either");
        let c1 = draft.add_atom(Atom::from_symbol("C").with_point2d(-1.3, 0.75));
        let c2 = draft.add_atom(Atom::from_symbol("C").with_point2d(0.0, 0.0));
        let c3 = draft.add_atom(Atom::from_symbol("C").with_point2d(1.3, 0.75));
        let c4 = draft.add_atom(Atom::from_symbol("C").with_point2d(2.6, 1.5));
        draft.add_bond(c1, c2, BondOrder::Single).unwrap();
        draft
            .add_bond_with_stereo(c2, c3, BondOrder::Double, BondStereo::EOrZ)
            .unwrap();
        draft.add_bond(c3, c4, BondOrder::Single).unwrap();
        let mol = draft.finalize_with(true).unwrap();
        assert!(mol.stereo_elements().is_empty());
    }

    #[test]
    fn test_wedged_centre() {
        let mut draft = MoleculeDraft::new("centre");
        let c = draft.add_atom(Atom::from_symbol("C").with_point2d(0.0, 0.0));
        let f = draft.add_atom(Atom::from_symbol("F").with_point2d(0.0, 1.0));
        let cl = draft.add_atom(Atom::from_symbol("Cl").with_point2d(-0.87, -0.5));
        let br = draft.add_atom(Atom::from_symbol("Br").with_point2d(0.87, -0.5));
        draft.add_bond_with_stereo(c, f, BondOrder::Single, BondStereo::Up).unwrap();
        draft.add_bond(c, cl, BondOrder::Single).unwrap();
        draft.add_bond(c, br, BondOrder::Single).unwrap();

        let unperceived = draft.clone().finalize().unwrap();
        assert!(unperceived.stereo_elements().is_empty());

        let mol = draft.finalize_with(true).unwrap();
        assert_eq!(mol.stereo_elements().len(), 1);
        assert!(matches!(
            mol.stereo_elements()[0],
            StereoElement::Tetrahedral { focus, .. } if focus == c
        ));
    }
}
