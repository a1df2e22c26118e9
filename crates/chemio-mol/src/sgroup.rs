//! Substructure groups (Sgroups)
//!
//! A typed subset of a molecule's atoms and bonds: abbreviations, repeat
//! units, mixture components, attached data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::index::{AtomIndex, BondIndex};

/// Sgroup type as named by the three-letter MDL code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SgroupType {
    /// Abbreviation / superatom
    Superatom,
    Multiple,
    /// Structural repeat unit
    RepeatUnit,
    Monomer,
    Mer,
    Copolymer,
    Crosslink,
    Modification,
    Graft,
    Component,
    Mixture,
    Formulation,
    Data,
    AnyPolymer,
    Generic,
}

impl SgroupType {
    pub fn code(&self) -> &'static str {
        match self {
            SgroupType::Superatom => "SUP",
            SgroupType::Multiple => "MUL",
            SgroupType::RepeatUnit => "SRU",
            SgroupType::Monomer => "MON",
            SgroupType::Mer => "MER",
            SgroupType::Copolymer => "COP",
            SgroupType::Crosslink => "CRO",
            SgroupType::Modification => "MOD",
            SgroupType::Graft => "GRA",
            SgroupType::Component => "COM",
            SgroupType::Mixture => "MIX",
            SgroupType::Formulation => "FOR",
            SgroupType::Data => "DAT",
            SgroupType::AnyPolymer => "ANY",
            SgroupType::Generic => "GEN",
        }
    }
}

impl FromStr for SgroupType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_uppercase().as_str() {
            "SUP" => SgroupType::Superatom,
            "MUL" => SgroupType::Multiple,
            "SRU" => SgroupType::RepeatUnit,
            "MON" => SgroupType::Monomer,
            "MER" => SgroupType::Mer,
            "COP" => SgroupType::Copolymer,
            "CRO" => SgroupType::Crosslink,
            "MOD" => SgroupType::Modification,
            "GRA" => SgroupType::Graft,
            "COM" => SgroupType::Component,
            "MIX" => SgroupType::Mixture,
            "FOR" => SgroupType::Formulation,
            "DAT" => SgroupType::Data,
            "ANY" => SgroupType::AnyPolymer,
            "GEN" => SgroupType::Generic,
            other => return Err(format!("unknown Sgroup type '{}'", other)),
        };
        Ok(kind)
    }
}

impl fmt::Display for SgroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Repeat pattern of a polymer Sgroup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SgroupConnectivity {
    HeadToHead,
    HeadToTail,
    EitherUnknown,
}

impl SgroupConnectivity {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "HH" => Some(SgroupConnectivity::HeadToHead),
            "HT" => Some(SgroupConnectivity::HeadToTail),
            "EU" => Some(SgroupConnectivity::EitherUnknown),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SgroupConnectivity::HeadToHead => "HH",
            SgroupConnectivity::HeadToTail => "HT",
            SgroupConnectivity::EitherUnknown => "EU",
        }
    }
}

/// Display bracket given by two end points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SgroupBracket {
    pub first: [f32; 2],
    pub second: [f32; 2],
}

/// A substructure group
#[derive(Debug, Clone, PartialEq)]
pub struct Sgroup {
    pub kind: SgroupType,
    /// Subtype (`ALT`, `RAN`, `BLO` for copolymers)
    pub subtype: Option<String>,
    /// Subscript or abbreviation label
    pub label: Option<String>,
    pub atoms: Vec<AtomIndex>,
    pub bonds: Vec<BondIndex>,
    pub connectivity: Option<SgroupConnectivity>,
    /// Position of the parent group in the molecule's Sgroup list
    pub parent: Option<usize>,
    pub brackets: Vec<SgroupBracket>,
    /// Field name of a data Sgroup
    pub field_name: Option<String>,
    /// Field value of a data Sgroup
    pub data: Option<String>,
}

impl Sgroup {
    pub fn new(kind: SgroupType) -> Self {
        Sgroup {
            kind,
            subtype: None,
            label: None,
            atoms: Vec::new(),
            bonds: Vec::new(),
            connectivity: None,
            parent: None,
            brackets: Vec::new(),
            field_name: None,
            data: None,
        }
    }

    pub fn contains_atom(&self, atom: AtomIndex) -> bool {
        self.atoms.contains(&atom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_codes() {
        for code in ["SUP", "MUL", "SRU", "MON", "MER", "COP", "CRO", "MOD", "GRA", "COM", "MIX", "FOR", "DAT", "ANY", "GEN"] {
            let kind: SgroupType = code.parse().unwrap();
            assert_eq!(kind.code(), code);
        }
        assert!("XYZ".parse::<SgroupType>().is_err());
        assert_eq!("sru".parse::<SgroupType>(), Ok(SgroupType::RepeatUnit));
    }

    #[test]
    fn test_connectivity_codes() {
        assert_eq!(SgroupConnectivity::from_code("ht"), Some(SgroupConnectivity::HeadToTail));
        assert_eq!(SgroupConnectivity::from_code("XX"), None);
    }
}
