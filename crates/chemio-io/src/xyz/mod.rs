//! XYZ coordinate files
//!
//! An atom count line, a free comment line, then one `symbol x y z` line
//! per atom. Files may hold several frames back to back.

mod parser;
mod writer;

pub use parser::XyzReader;
pub use writer::XyzWriter;

/// Detection: atom count, comment, and an `El x y z` line
pub fn matches(lines: &[String]) -> bool {
    let (Some(count), Some(atom)) = (lines.first(), lines.get(2)) else {
        return false;
    };
    let declared = count.trim().parse::<usize>().is_ok_and(|n| n > 0);
    declared && parser::split_atom_line(atom).is_some()
}
