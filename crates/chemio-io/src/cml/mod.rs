//! Chemical Markup Language
//!
//! Only the connection-table subset is read: `molecule`, `atomArray` /
//! `atom`, `bondArray` / `bond` and `bondStereo`, in both the element and
//! the array (space-separated attribute lists) form.

mod reader;

pub use reader::CmlReader;

/// Detection: a `cml` or `molecule` element near the start of the document
pub fn matches(lines: &[String]) -> bool {
    lines.iter().any(|line| {
        ["<cml", "<molecule", ":cml", ":molecule"]
            .iter()
            .any(|tag| {
                line.match_indices(tag).any(|(at, _)| {
                    let rest = &line[at + tag.len()..];
                    rest.is_empty() || rest.starts_with([' ', '>', '/', '\t'])
                })
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    #[test]
    fn test_matches() {
        assert!(matches(&lines("<?xml version=\"1.0\"?>\n<cml xmlns=\"http://www.xml-cml.org/schema\">\n")));
        assert!(matches(&lines("<molecule id=\"m1\">\n")));
        assert!(matches(&lines("<cml:molecule>\n")));
        assert!(!matches(&lines("<moleculeList>\n")));
        assert!(!matches(&lines("4\nBortrifluorid\nB 0 0 0\n")));
    }
}
