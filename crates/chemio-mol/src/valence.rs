//! Implicit hydrogen inference
//!
//! Applies the MDL valence model: an atom's explicit valence (bond orders
//! plus radical electrons) is compared against the lowest valence its
//! element allows at its charge. Atoms already above that valence are
//! hypervalent and receive no hydrogens.

use smallvec::SmallVec;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::element::Element;
use crate::index::BondIndex;

/// Explicit valence from bonds, in whole bond units (aromatic halves round up)
pub fn bond_order_sum(bonds: &[Bond], incident: &[BondIndex]) -> u32 {
    let halves: u32 = incident
        .iter()
        .filter_map(|b| bonds.get(b.as_usize()))
        .map(|b| b.order.valence_halves())
        .sum();
    halves.div_ceil(2)
}

/// Valences allowed for an element at a given formal charge
///
/// Groups 15 to 17 gain one bond per positive charge and lose one per
/// negative charge (N+ is tetravalent, O- monovalent). Groups 13 and 14
/// lose one bond per unit of charge either way, except that a negative
/// charge on a group 13 atom makes it carbon-like.
pub fn charge_adjusted_valences(element: Element, charge: i8) -> SmallVec<[u8; 4]> {
    let base = element.default_valences();
    if charge == 0 {
        return base.iter().copied().collect();
    }
    let q = charge as i32;
    let shifted = |v: u8, delta: i32| -> Option<u8> {
        let value = v as i32 + delta;
        (value >= 0).then_some(value as u8)
    };
    match element.main_group() {
        Some(15..=17) => base.iter().filter_map(|&v| shifted(v, q)).collect(),
        Some(13) if q < 0 => base.iter().filter_map(|&v| shifted(v, -q)).collect(),
        Some(13 | 14) => base.iter().filter_map(|&v| shifted(v, -q.abs())).collect(),
        // hydrogen, alkali and alkaline earth ions carry no hydrogens
        _ if !base.is_empty() => base.iter().filter_map(|&v| shifted(v, -q.abs())).collect(),
        _ => SmallVec::new(),
    }
}

/// Implicit hydrogen count for one atom with the given explicit valence
pub fn implicit_hydrogens(atom: &Atom, explicit: u32) -> u8 {
    if atom.is_pseudo() || atom.query_hydrogen_count > 0 {
        return 0;
    }
    let explicit = explicit + atom.radical.valence_contribution() as u32;

    if let Some(valence) = atom.valence {
        return (valence as u32).saturating_sub(explicit) as u8;
    }

    let valences = charge_adjusted_valences(atom.element, atom.formal_charge);
    match valences.first() {
        Some(&lowest) if explicit <= lowest as u32 => (lowest as u32 - explicit) as u8,
        _ => 0,
    }
}

/// Fill `implicit_hydrogens` for every atom
pub fn assign_implicit_hydrogens(
    atoms: &mut [Atom],
    bonds: &[Bond],
    adjacency: &[SmallVec<[BondIndex; 4]>],
) {
    for (i, atom) in atoms.iter_mut().enumerate() {
        let incident = adjacency.get(i).map(|v| v.as_slice()).unwrap_or(&[]);
        let explicit = bond_order_sum(bonds, incident);
        atom.implicit_hydrogens = Some(implicit_hydrogens(atom, explicit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Radical;

    fn atom(symbol: &str, charge: i8) -> Atom {
        Atom::from_symbol(symbol).with_charge(charge)
    }

    #[test]
    fn test_neutral_nitrogen() {
        let n = atom("N", 0);
        assert_eq!(implicit_hydrogens(&n, 0), 3);
        assert_eq!(implicit_hydrogens(&n, 3), 0);
        // four bonds: pentavalent, no hydrogens
        assert_eq!(implicit_hydrogens(&n, 4), 0);
    }

    #[test]
    fn test_charged_atoms() {
        assert_eq!(implicit_hydrogens(&atom("N", 1), 0), 4);
        assert_eq!(implicit_hydrogens(&atom("N", 1), 3), 1);
        assert_eq!(implicit_hydrogens(&atom("O", -1), 1), 0);
        assert_eq!(implicit_hydrogens(&atom("O", 1), 1), 2);
        assert_eq!(implicit_hydrogens(&atom("C", -1), 2), 1);
        assert_eq!(implicit_hydrogens(&atom("B", -1), 0), 4);
        assert_eq!(implicit_hydrogens(&atom("H", 1), 0), 0);
        assert_eq!(implicit_hydrogens(&atom("Na", 1), 0), 0);
    }

    #[test]
    fn test_valence_override_and_radical() {
        let mut c = atom("C", 0);
        c.valence = Some(0);
        assert_eq!(implicit_hydrogens(&c, 0), 0);

        let mut methyl = atom("C", 0);
        methyl.radical = Radical::Doublet;
        assert_eq!(implicit_hydrogens(&methyl, 0), 3);
    }

    #[test]
    fn test_metals_and_pseudo_atoms() {
        assert_eq!(implicit_hydrogens(&atom("Fe", 0), 0), 0);
        assert_eq!(implicit_hydrogens(&Atom::pseudo("R1"), 0), 0);
    }
}
