//! Protein Data Bank format
//!
//! Only the records that carry connection-table information are read:
//! `ATOM`/`HETATM`, `CONECT`, the `TITLE`/`COMPND` text and the
//! `MODEL`/`ENDMDL`/`END` structure. Every model becomes its own molecule.

mod reader;
mod records;

pub use reader::PdbReader;
pub use records::{infer_element_from_name, parse_pdb_charge, AtomRecord, ConectRecord};

/// Record names that open a PDB entry
const HEADER_RECORDS: [&str; 7] = ["HEADER", "COMPND", "TITLE", "CRYST1", "REMARK", "MODEL", "SOURCE"];

/// Record name in columns 1-6
pub(crate) fn record_name(line: &str) -> &str {
    line.get(..6).unwrap_or(line).trim_end()
}

/// Detection: an entry header record first, or a full-width coordinate record
pub fn matches(lines: &[String]) -> bool {
    let header = lines
        .iter()
        .find(|l| !l.trim().is_empty())
        .is_some_and(|l| HEADER_RECORDS.contains(&record_name(l)));
    header
        || lines
            .iter()
            .any(|l| (l.starts_with("ATOM  ") || l.starts_with("HETATM")) && l.trim_end().len() >= 54)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    #[test]
    fn test_matches() {
        assert!(matches(&lines("HEADER    HYDROLASE                               01-JAN-00   1ABC\n")));
        assert!(matches(&lines(
            "ATOM      1  N   ALA A   1       0.000   0.000   0.000  1.00 20.00           N\n"
        )));
        assert!(!matches(&lines("ATOM 1\n")));
        assert!(!matches(&lines("4\nBortrifluorid\nB 0 0 0\n")));
    }
}
