//! Keyword vocabulary of the LP format.
//!
//! Matching is case-insensitive and exact. The first entry of each list is the
//! canonical spelling used by the writer.

use lpfile_model::ObjectiveSense;

pub const MINIMIZE: &[&str] = &["minimize", "min", "minimum"];
pub const MAXIMIZE: &[&str] = &["maximize", "max", "maximum"];
pub const SUBJECT_TO: &[&str] = &["subject to", "such that", "st", "s.t."];
pub const BOUNDS: &[&str] = &["bounds", "bound"];
pub const INFINITY: &[&str] = &["infinity", "inf"];
pub const FREE: &[&str] = &["free"];
pub const GENERAL: &[&str] = &["general", "generals", "gen"];
pub const BINARY: &[&str] = &["binary", "binaries", "bin"];
pub const SEMI_CONTINUOUS: &[&str] = &["semi-continuous", "semi", "semis"];
pub const SOS: &[&str] = &["sos"];
pub const END: &[&str] = &["end"];

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Objective(ObjectiveSense),
    Constraints,
    Bounds,
    General,
    Binary,
    SemiContinuous,
    Sos,
    End,
}

impl Section {
    /// Canonical keyword introducing the section.
    pub fn keyword(self) -> &'static str {
        let words = match self {
            Section::Objective(ObjectiveSense::Minimize) => MINIMIZE,
            Section::Objective(ObjectiveSense::Maximize) => MAXIMIZE,
            Section::Constraints => SUBJECT_TO,
            Section::Bounds => BOUNDS,
            Section::General => GENERAL,
            Section::Binary => BINARY,
            Section::SemiContinuous => SEMI_CONTINUOUS,
            Section::Sos => SOS,
            Section::End => END,
        };
        words[0]
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "section keyword '{}'", self.keyword())
    }
}

pub fn is_keyword(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| k.eq_ignore_ascii_case(text))
}

pub fn objective_sense(text: &str) -> Option<ObjectiveSense> {
    if is_keyword(text, MINIMIZE) {
        Some(ObjectiveSense::Minimize)
    } else if is_keyword(text, MAXIMIZE) {
        Some(ObjectiveSense::Maximize)
    } else {
        None
    }
}

/// Section introduced by `text`, which may be a multi-word form such as
/// `subject to` or `semi-continuous`.
pub fn section(text: &str) -> Option<Section> {
    if let Some(sense) = objective_sense(text) {
        return Some(Section::Objective(sense));
    }
    let table: [(&[&str], Section); 7] = [
        (SUBJECT_TO, Section::Constraints),
        (BOUNDS, Section::Bounds),
        (GENERAL, Section::General),
        (BINARY, Section::Binary),
        (SEMI_CONTINUOUS, Section::SemiContinuous),
        (SOS, Section::Sos),
        (END, Section::End),
    ];
    table
        .into_iter()
        .find(|(words, _)| is_keyword(text, words))
        .map(|(_, section)| section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("MINIMIZE", Some(ObjectiveSense::Minimize))]
    #[case("Minimize", Some(ObjectiveSense::Minimize))]
    #[case("min", Some(ObjectiveSense::Minimize))]
    #[case("Minimum", Some(ObjectiveSense::Minimize))]
    #[case("MAX", Some(ObjectiveSense::Maximize))]
    #[case("maximum", Some(ObjectiveSense::Maximize))]
    #[case("minimise", None)]
    #[case("mi", None)]
    fn test_objective_sense(#[case] text: &str, #[case] expected: Option<ObjectiveSense>) {
        assert_eq!(objective_sense(text), expected);
    }

    #[rstest]
    #[case("Subject To", Section::Constraints)]
    #[case("such that", Section::Constraints)]
    #[case("ST", Section::Constraints)]
    #[case("s.t.", Section::Constraints)]
    #[case("bound", Section::Bounds)]
    #[case("GENERALS", Section::General)]
    #[case("bin", Section::Binary)]
    #[case("Semi-Continuous", Section::SemiContinuous)]
    #[case("semis", Section::SemiContinuous)]
    #[case("SOS", Section::Sos)]
    #[case("End", Section::End)]
    fn test_section_keywords(#[case] text: &str, #[case] expected: Section) {
        assert_eq!(section(text), Some(expected));
    }

    #[test]
    fn test_no_prefix_matches() {
        assert_eq!(section("subject"), None);
        assert_eq!(section("bounds2"), None);
        assert_eq!(section("ends"), None);
        assert_eq!(section("free"), None);
    }

    #[test]
    fn test_canonical_keywords() {
        assert_eq!(Section::Objective(ObjectiveSense::Maximize).keyword(), "maximize");
        assert_eq!(Section::Constraints.keyword(), "subject to");
        assert_eq!(Section::SemiContinuous.keyword(), "semi-continuous");
        assert_eq!(Section::Binary.keyword(), "binary");
    }
}
