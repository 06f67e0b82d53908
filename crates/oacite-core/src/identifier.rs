//! Canonical citation identifiers.
//!
//! Shape: ISO 3166-1 alpha-2 code, Gregorian year, serial, then at most one
//! kind-code letter which some offices follow with a single digit.
//!
//! - `JP2014178928A`   published application
//! - `JP1985075198U`   utility model
//! - `US20150183083A1` kind code with publication-kind digit
//! - `WO2017018016`    international publication, no kind code

use std::sync::LazyLock;

use regex::Regex;

static CANONICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{2}[0-9]{5,}(?:[A-Z][0-9]?)?$").expect("valid identifier regex")
});

/// The identifier a publication records for itself: `JP{number}A`.
pub fn publication_seed(publication_number: &str) -> String {
    format!("JP{}A", publication_number.trim())
}

/// File name of the ledger belonging to a publication.
pub fn ledger_file_name(publication_number: &str) -> String {
    format!("{}.txt", publication_seed(publication_number))
}

/// Whether `candidate` has the canonical identifier shape. Exact match, no case folding.
pub fn looks_canonical(candidate: &str) -> bool {
    CANONICAL.is_match(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_and_file_name() {
        assert_eq!(publication_seed("2025012345"), "JP2025012345A");
        assert_eq!(publication_seed(" 2025012345 "), "JP2025012345A");
        assert_eq!(ledger_file_name("2025012345"), "JP2025012345A.txt");
    }

    #[test]
    fn accepts_canonical_shapes() {
        for id in [
            "JP2014178928A",
            "JP198947880A",
            "JP1985075198U",
            "US20150183083A1",
            "WO2017018016",
            "WO2011092813",
        ] {
            assert!(looks_canonical(id), "{id} should be canonical");
        }
    }

    #[test]
    fn rejects_other_shapes() {
        for id in [
            "jp2011167995A",
            "JP2014178928AB",
            "特開２０１４－１７８９２８号公報",
            "JP12A",
            "",
            " JP2014178928A",
        ] {
            assert!(!looks_canonical(id), "{id:?} should not be canonical");
        }
    }
}
