//! Chemical element definitions
//!
//! Elements are identified by atomic number; number 0 is reserved for
//! pseudo atoms (R-groups, query atoms, attachment points).

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Number of entries in the element tables (pseudo atom + 118 elements)
pub const ELEMENT_COUNT: usize = 119;

const SYMBOLS: [&str; ELEMENT_COUNT] = [
    "*", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Mass number of the most abundant (or longest lived) isotope. MDL mass
/// differences are relative to this value.
const NOMINAL_MASS: [u16; ELEMENT_COUNT] = [
    0, 1, 4, 7, 9, 11, 12, 14, 16, 19, 20, 23, 24, 27, 28, 31, 32, 35, 40, 39, 40, 45, 48, 51, 52,
    55, 56, 59, 58, 63, 64, 69, 74, 75, 80, 79, 84, 85, 88, 89, 90, 93, 98, 98, 102, 103, 106, 107,
    114, 115, 120, 121, 130, 127, 132, 133, 138, 139, 140, 141, 142, 145, 152, 153, 158, 159, 164,
    165, 166, 169, 174, 175, 180, 181, 184, 187, 192, 193, 195, 197, 202, 205, 208, 209, 209, 210,
    222, 223, 226, 227, 232, 231, 238, 237, 244, 243, 247, 247, 251, 252, 257, 258, 259, 262, 267,
    268, 269, 270, 269, 278, 281, 282, 285, 286, 289, 290, 293, 294, 294,
];

static SYMBOL_MAP: OnceLock<AHashMap<&'static str, Element>> = OnceLock::new();

fn symbol_map() -> &'static AHashMap<&'static str, Element> {
    SYMBOL_MAP.get_or_init(|| {
        SYMBOLS
            .iter()
            .enumerate()
            .skip(1)
            .map(|(n, symbol)| (*symbol, Element(n as u8)))
            .collect()
    })
}

/// A chemical element, stored as its atomic number
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Element(u8);

impl Element {
    /// Pseudo atom (no element)
    pub const PSEUDO: Element = Element(0);
    pub const HYDROGEN: Element = Element(1);
    pub const BORON: Element = Element(5);
    pub const CARBON: Element = Element(6);
    pub const NITROGEN: Element = Element(7);
    pub const OXYGEN: Element = Element(8);
    pub const FLUORINE: Element = Element(9);
    pub const PHOSPHORUS: Element = Element(15);
    pub const SULFUR: Element = Element(16);
    pub const CHLORINE: Element = Element(17);
    pub const BROMINE: Element = Element(35);
    pub const IODINE: Element = Element(53);

    /// Create an element from its atomic number (0..=118)
    #[inline]
    pub fn from_atomic_number(n: u8) -> Option<Self> {
        ((n as usize) < ELEMENT_COUNT).then_some(Element(n))
    }

    /// Look up an element by symbol, ignoring case ("CL", "cl" and "Cl" all match)
    ///
    /// Pseudo atom markers are not elements and return `None`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let symbol = symbol.trim();
        if symbol.is_empty() || symbol.len() > 3 {
            return None;
        }
        let mut titlecase = String::with_capacity(symbol.len());
        for (i, c) in symbol.chars().enumerate() {
            if i == 0 {
                titlecase.push(c.to_ascii_uppercase());
            } else {
                titlecase.push(c.to_ascii_lowercase());
            }
        }
        symbol_map().get(titlecase.as_str()).copied()
    }

    #[inline]
    pub const fn atomic_number(&self) -> u8 {
        self.0
    }

    #[inline]
    pub fn symbol(&self) -> &'static str {
        SYMBOLS[self.0 as usize]
    }

    /// Mass number that an MDL mass difference of 0 refers to
    #[inline]
    pub fn nominal_mass(&self) -> u16 {
        NOMINAL_MASS[self.0 as usize]
    }

    #[inline]
    pub fn is_pseudo(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_hydrogen(&self) -> bool {
        self.0 == 1
    }

    /// IUPAC group for main-group elements from group 13 to 17
    pub fn main_group(&self) -> Option<u8> {
        match self.0 {
            5 | 13 | 31 | 49 | 81 => Some(13),
            6 | 14 | 32 | 50 | 82 => Some(14),
            7 | 15 | 33 | 51 | 83 => Some(15),
            8 | 16 | 34 | 52 | 84 => Some(16),
            9 | 17 | 35 | 53 | 85 => Some(17),
            _ => None,
        }
    }

    /// Allowed neutral valences in increasing order
    ///
    /// An empty slice means the element never receives implicit hydrogens.
    pub fn default_valences(&self) -> &'static [u8] {
        match self.0 {
            1 | 3 | 11 | 19 | 37 | 55 | 87 => &[1],
            4 | 12 | 20 | 38 | 56 | 88 => &[2],
            5 | 13 | 31 | 49 => &[3],
            81 => &[1, 3],
            6 | 14 | 32 => &[4],
            50 | 82 => &[2, 4],
            7 => &[3, 5],
            15 | 33 | 51 | 83 => &[3, 5],
            8 => &[2],
            16 | 34 | 52 | 84 => &[2, 4, 6],
            9 => &[1],
            17 | 35 | 53 | 85 => &[1, 3, 5, 7],
            _ => &[],
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({})", self.symbol())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
