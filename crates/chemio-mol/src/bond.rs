//! Bond data structure
//!
//! Provides the `Bond` struct, `BondOrder` (including MDL query bond types)
//! and `BondStereo` wedge/hash markers.

use serde::{Deserialize, Serialize};

use crate::index::AtomIndex;

/// Query bond types that do not resolve to a single concrete order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryBond {
    SingleOrDouble,
    SingleOrAromatic,
    DoubleOrAromatic,
    Any,
}

/// Bond order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BondOrder {
    #[default]
    Unset,
    Single,
    Double,
    Triple,
    /// Delocalized (1.5) bond
    Aromatic,
    Query(QueryBond),
}

impl BondOrder {
    /// Decode an MDL bond type code (1..=8)
    pub fn from_mdl(code: i32) -> Option<Self> {
        match code {
            1 => Some(BondOrder::Single),
            2 => Some(BondOrder::Double),
            3 => Some(BondOrder::Triple),
            4 => Some(BondOrder::Aromatic),
            5 => Some(BondOrder::Query(QueryBond::SingleOrDouble)),
            6 => Some(BondOrder::Query(QueryBond::SingleOrAromatic)),
            7 => Some(BondOrder::Query(QueryBond::DoubleOrAromatic)),
            8 => Some(BondOrder::Query(QueryBond::Any)),
            _ => None,
        }
    }

    /// Encode as an MDL bond type code; unset orders are written as single
    pub fn to_mdl(&self) -> u8 {
        match self {
            BondOrder::Unset | BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
            BondOrder::Query(QueryBond::SingleOrDouble) => 5,
            BondOrder::Query(QueryBond::SingleOrAromatic) => 6,
            BondOrder::Query(QueryBond::DoubleOrAromatic) => 7,
            BondOrder::Query(QueryBond::Any) => 8,
        }
    }

    /// Contribution to an atom's valence, in half-bond units
    ///
    /// Aromatic bonds count 3 halves; unresolved orders count as single.
    pub fn valence_halves(&self) -> u32 {
        match self {
            BondOrder::Double => 4,
            BondOrder::Triple => 6,
            BondOrder::Aromatic => 3,
            _ => 2,
        }
    }

    #[inline]
    pub fn is_query(&self) -> bool {
        matches!(self, BondOrder::Query(_))
    }
}

impl std::fmt::Display for BondOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BondOrder::Unset => write!(f, "?"),
            BondOrder::Single => write!(f, "-"),
            BondOrder::Double => write!(f, "="),
            BondOrder::Triple => write!(f, "#"),
            BondOrder::Aromatic => write!(f, ":"),
            BondOrder::Query(_) => write!(f, "~"),
        }
    }
}

/// Bond stereo marker, as drawn (wedges) or declared (unspecified cis/trans)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BondStereo {
    #[default]
    None,
    /// Solid wedge, narrow end at the begin atom
    Up,
    /// Hashed wedge, narrow end at the begin atom
    Down,
    /// Wavy bond: up or down
    Either,
    /// Double bond with explicitly unknown cis/trans configuration
    EOrZ,
}

impl BondStereo {
    /// Decode an MDL V2000 bond stereo code
    pub fn from_mdl(code: i32) -> Option<Self> {
        match code {
            0 => Some(BondStereo::None),
            1 => Some(BondStereo::Up),
            3 => Some(BondStereo::EOrZ),
            4 => Some(BondStereo::Either),
            6 => Some(BondStereo::Down),
            _ => None,
        }
    }

    pub fn to_mdl(&self) -> u8 {
        match self {
            BondStereo::None => 0,
            BondStereo::Up => 1,
            BondStereo::EOrZ => 3,
            BondStereo::Either => 4,
            BondStereo::Down => 6,
        }
    }

    /// Decode a V3000 `CFG=` value, which depends on the bond order
    pub fn from_v3000(cfg: i32, order: BondOrder) -> Option<Self> {
        match (cfg, order) {
            (0, _) => Some(BondStereo::None),
            (1, _) => Some(BondStereo::Up),
            (2, BondOrder::Double) => Some(BondStereo::EOrZ),
            (2, _) => Some(BondStereo::Either),
            (3, _) => Some(BondStereo::Down),
            _ => None,
        }
    }

    /// Whether this marker may appear on a bond of the given order
    ///
    /// Wedges belong on single bonds; the cis/trans marker on double bonds.
    /// Query and unset orders accept anything.
    pub fn is_legal_for(&self, order: BondOrder) -> bool {
        match self {
            BondStereo::None => true,
            BondStereo::Up | BondStereo::Down | BondStereo::Either => {
                matches!(order, BondOrder::Single | BondOrder::Unset | BondOrder::Query(_))
            }
            BondStereo::EOrZ => {
                matches!(order, BondOrder::Double | BondOrder::Unset | BondOrder::Query(_))
            }
        }
    }

    #[inline]
    pub fn is_wedge(&self) -> bool {
        matches!(self, BondStereo::Up | BondStereo::Down | BondStereo::Either)
    }
}

/// A bond between two atoms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bond {
    pub begin: AtomIndex,
    pub end: AtomIndex,
    pub order: BondOrder,
    pub stereo: BondStereo,
}

impl Bond {
    pub fn new(begin: AtomIndex, end: AtomIndex, order: BondOrder) -> Self {
        Bond {
            begin,
            end,
            order,
            stereo: BondStereo::None,
        }
    }

    pub fn with_stereo(mut self, stereo: BondStereo) -> Self {
        self.stereo = stereo;
        self
    }

    #[inline]
    pub fn involves(&self, atom: AtomIndex) -> bool {
        self.begin == atom || self.end == atom
    }

    /// The atom on the other side of `atom`, if the bond involves it
    pub fn other(&self, atom: AtomIndex) -> Option<AtomIndex> {
        if self.begin == atom {
            Some(self.end)
        } else if self.end == atom {
            Some(self.begin)
        } else {
            None
        }
    }

    #[inline]
    pub fn connects(&self, a: AtomIndex, b: AtomIndex) -> bool {
        (self.begin == a && self.end == b) || (self.begin == b && self.end == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mdl_order_codes() {
        for code in 1..=8 {
            let order = BondOrder::from_mdl(code).unwrap();
            assert_eq!(order.to_mdl() as i32, code);
        }
        assert!(BondOrder::from_mdl(9).is_none());
        assert!(BondOrder::from_mdl(5).unwrap().is_query());
    }

    #[test]
    fn test_stereo_legality() {
        assert!(BondStereo::Up.is_legal_for(BondOrder::Single));
        assert!(!BondStereo::Up.is_legal_for(BondOrder::Double));
        assert!(BondStereo::EOrZ.is_legal_for(BondOrder::Double));
        assert!(!BondStereo::EOrZ.is_legal_for(BondOrder::Single));
        assert!(BondStereo::None.is_legal_for(BondOrder::Triple));
    }

    #[test]
    fn test_v3000_cfg_depends_on_order() {
        assert_eq!(BondStereo::from_v3000(2, BondOrder::Double), Some(BondStereo::EOrZ));
        assert_eq!(BondStereo::from_v3000(2, BondOrder::Single), Some(BondStereo::Either));
        assert_eq!(BondStereo::from_v3000(3, BondOrder::Single), Some(BondStereo::Down));
    }

    #[test]
    fn test_bond_other() {
        let bond = Bond::new(AtomIndex(0), AtomIndex(3), BondOrder::Single);
        assert_eq!(bond.other(AtomIndex(0)), Some(AtomIndex(3)));
        assert_eq!(bond.other(AtomIndex(2)), None);
        assert!(bond.connects(AtomIndex(3), AtomIndex(0)));
    }
}
