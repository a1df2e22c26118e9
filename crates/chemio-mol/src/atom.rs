//! Atom data structure

use lin_alg::f32::Vec3;
use serde::{Deserialize, Serialize};

use crate::element::Element;

/// Unpaired electron state of an atom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Radical {
    #[default]
    None,
    /// Two unpaired electrons with opposite spin (MDL code 1)
    Singlet,
    /// One unpaired electron (MDL code 2)
    Doublet,
    /// Two unpaired electrons with parallel spin (MDL code 3)
    Triplet,
}

impl Radical {
    /// Decode an `M  RAD` / V3000 `RAD=` value
    pub fn from_mdl(code: i32) -> Option<Self> {
        match code {
            0 => Some(Radical::None),
            1 => Some(Radical::Singlet),
            2 => Some(Radical::Doublet),
            3 => Some(Radical::Triplet),
            _ => None,
        }
    }

    pub fn to_mdl(&self) -> u8 {
        match self {
            Radical::None => 0,
            Radical::Singlet => 1,
            Radical::Doublet => 2,
            Radical::Triplet => 3,
        }
    }

    /// Number of bonding positions the unpaired electrons occupy
    pub fn valence_contribution(&self) -> u8 {
        match self {
            Radical::None => 0,
            Radical::Doublet => 1,
            Radical::Singlet | Radical::Triplet => 2,
        }
    }
}

/// A single atom as read from a structure file
///
/// Coordinates are optional because several formats (SMILES-like inputs,
/// coordinate-free CML) carry none. An atom normally holds either 2D or 3D
/// coordinates, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Symbol as written in the file ("C", "D", "R#", ...)
    pub symbol: String,
    pub element: Element,
    pub point2d: Option<[f32; 2]>,
    pub point3d: Option<Vec3>,
    pub formal_charge: i8,
    /// Absolute mass number; `None` means natural abundance
    pub mass_number: Option<u16>,
    pub radical: Radical,
    /// Atom-block stereo parity (0 none, 1 odd, 2 even, 3 either)
    pub stereo_parity: u8,
    /// Query hydrogen count from the atom block (0 = not specified)
    pub query_hydrogen_count: u8,
    /// Explicit valence override; `Some(0)` is a legal, zero valence
    pub valence: Option<u8>,
    /// Implicit hydrogens, filled in when a draft is finalized
    pub implicit_hydrogens: Option<u8>,
    /// Atom-atom mapping number (0 = unmapped)
    pub map_number: u32,
    /// Label of a pseudo atom, or alias text
    pub label: Option<String>,
    /// Free-text atom value (MDL `V` lines)
    pub value: Option<String>,
}

impl Atom {
    /// Create an atom of a known element
    pub fn new(symbol: impl Into<String>, element: Element) -> Self {
        Atom {
            symbol: symbol.into(),
            element,
            point2d: None,
            point3d: None,
            formal_charge: 0,
            mass_number: None,
            radical: Radical::None,
            stereo_parity: 0,
            query_hydrogen_count: 0,
            valence: None,
            implicit_hydrogens: None,
            map_number: 0,
            label: None,
            value: None,
        }
    }

    /// Create an atom from a symbol, falling back to a pseudo atom labelled
    /// with the symbol when it is not an element
    pub fn from_symbol(symbol: &str) -> Self {
        match Element::from_symbol(symbol) {
            Some(element) => Atom::new(element.symbol(), element),
            None => Atom::pseudo(symbol),
        }
    }

    /// Create a pseudo atom carrying a label
    pub fn pseudo(label: impl Into<String>) -> Self {
        let label = label.into();
        let mut atom = Atom::new(label.clone(), Element::PSEUDO);
        atom.label = Some(label);
        atom
    }

    pub fn with_charge(mut self, charge: i8) -> Self {
        self.formal_charge = charge;
        self
    }

    pub fn with_point2d(mut self, x: f32, y: f32) -> Self {
        self.point2d = Some([x, y]);
        self.point3d = None;
        self
    }

    pub fn with_point3d(mut self, point: Vec3) -> Self {
        self.point3d = Some(point);
        self.point2d = None;
        self
    }

    #[inline]
    pub fn is_pseudo(&self) -> bool {
        self.element.is_pseudo()
    }

    /// Coordinates as a 3D point, lifting 2D coordinates onto z = 0
    pub fn position(&self) -> Option<Vec3> {
        match (self.point3d, self.point2d) {
            (Some(p), _) => Some(p),
            (None, Some([x, y])) => Some(Vec3::new(x, y, 0.0)),
            (None, None) => None,
        }
    }

    /// Mass number relative to the element's nominal mass, as used in MDL atom blocks
    pub fn mass_difference(&self) -> i32 {
        match self.mass_number {
            Some(mass) if !self.is_pseudo() => mass as i32 - self.element.nominal_mass() as i32,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_symbol() {
        let c = Atom::from_symbol("C");
        assert_eq!(c.element, Element::CARBON);
        assert!(c.label.is_none());

        let r = Atom::from_symbol("R#");
        assert!(r.is_pseudo());
        assert_eq!(r.label.as_deref(), Some("R#"));
    }

    #[test]
    fn test_position_lifts_2d() {
        let atom = Atom::from_symbol("O").with_point2d(1.0, 2.0);
        let p = atom.position().unwrap();
        assert_eq!((p.x, p.y, p.z), (1.0, 2.0, 0.0));
    }

    #[test]
    fn test_mass_difference() {
        let mut atom = Atom::from_symbol("C");
        assert_eq!(atom.mass_difference(), 0);
        atom.mass_number = Some(13);
        assert_eq!(atom.mass_difference(), 1);
    }
}
