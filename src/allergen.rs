//! Fixed allergen code table and allergy-string parsing.
//!
//! Codes are single uppercase letters. A lone letter outside the table is
//! kept as its raw code instead of being rejected.

use std::collections::BTreeSet;

use crate::error::{CanteenError, CanteenResult};

/// Set of allergen codes attached to a meal or avoided by a user.
pub type AllergenSet = BTreeSet<char>;

/// Bidirectional code/name table.
pub const ALLERGENS: [(char, &str); 15] = [
    ('F', "fish"),
    ('N', "nuts"),
    ('G', "gluten"),
    ('M', "milk"),
    ('E', "eggs"),
    ('S', "soy"),
    ('C', "celery"),
    ('U', "mustard"),
    ('T', "sesame"),
    ('L', "lupin"),
    ('P', "peanuts"),
    ('I', "sulfites"),
    ('K', "crustaceans"),
    ('W', "molluscs"),
    ('H', "tree nuts"),
];

/// Human-readable name for `code`; unknown codes pass through unchanged.
pub fn name_for(code: char) -> String {
    ALLERGENS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Code for a human-readable name (case-insensitive).
pub fn code_for(name: &str) -> Option<char> {
    let name = name.trim();
    ALLERGENS
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(c, _)| *c)
}

fn is_known_code(code: char) -> bool {
    ALLERGENS.iter().any(|(c, _)| *c == code)
}

/// Parses a user-entered allergy string.
///
/// Accepts comma separated names (`"fish, tree nuts"`), separated codes
/// (`"F,H"`) or packed codes (`"FHG"`). Blank input means no allergens.
/// A packed run is only accepted when every letter is a known code.
pub fn parse_allergens(raw: &str) -> CanteenResult<AllergenSet> {
    let mut out = AllergenSet::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some(code) = code_for(token) {
            out.insert(code);
            continue;
        }
        for word in token.split_whitespace() {
            out.extend(parse_word(word)?);
        }
    }
    Ok(out)
}

fn parse_word(word: &str) -> CanteenResult<Vec<char>> {
    if let Some(code) = code_for(word) {
        return Ok(vec![code]);
    }
    let codes: Vec<char> = word.chars().map(|c| c.to_ascii_uppercase()).collect();
    match codes.as_slice() {
        [single] if single.is_ascii_alphabetic() => Ok(codes),
        packed if packed.iter().all(|c| is_known_code(*c)) => Ok(codes),
        _ => Err(CanteenError::validation(format!(
            "'{word}' is not a known allergen"
        ))),
    }
}

/// Packed storage form, e.g. `"FGN"`.
pub fn encode(codes: &AllergenSet) -> String {
    codes.iter().collect()
}

/// Inverse of [`encode`]; ignores anything that is not a letter.
pub fn decode(raw: &str) -> AllergenSet {
    raw.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Comma separated display names.
pub fn describe(codes: &AllergenSet) -> String {
    codes
        .iter()
        .map(|c| name_for(*c))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_bidirectional() {
        for (code, name) in ALLERGENS {
            assert_eq!(code_for(name), Some(code));
            assert_eq!(name_for(code), name);
        }
    }

    #[test]
    fn unknown_code_passes_through() {
        assert_eq!(name_for('Z'), "Z");
        let parsed = parse_allergens("Z").expect("parse");
        assert_eq!(parsed, AllergenSet::from(['Z']));
        assert_eq!(describe(&parsed), "Z");
    }

    #[test]
    fn blank_means_no_restrictions() {
        assert!(parse_allergens("").expect("parse").is_empty());
        assert!(parse_allergens("  , ").expect("parse").is_empty());
    }

    #[test]
    fn table_matches_the_published_codes() {
        let expected = [
            ('F', "fish"),
            ('N', "nuts"),
            ('G', "gluten"),
            ('M', "milk"),
            ('E', "eggs"),
            ('S', "soy"),
            ('C', "celery"),
            ('U', "mustard"),
            ('T', "sesame"),
            ('L', "lupin"),
            ('P', "peanuts"),
            ('I', "sulfites"),
            ('K', "crustaceans"),
            ('W', "molluscs"),
            ('H', "tree nuts"),
        ];
        assert_eq!(ALLERGENS.len(), expected.len());
        for (code, name) in expected {
            assert_eq!(name_for(code), name);
            assert_eq!(code_for(name), Some(code));
        }
    }

    #[test]
    fn accepts_names_codes_and_packed_codes() {
        let expected: AllergenSet = ['F', 'G', 'H'].into_iter().collect();
        assert_eq!(parse_allergens("fish, tree nuts, G").expect("parse"), expected);
        assert_eq!(parse_allergens("fhg").expect("parse"), expected);
        assert_eq!(parse_allergens("F, H G").expect("parse"), expected);
    }

    #[test]
    fn names_map_to_a_single_code() {
        let nuts = parse_allergens("nuts").expect("parse");
        assert_eq!(nuts, AllergenSet::from(['N']));
        let mixed = parse_allergens("Nuts, tree nuts").expect("parse");
        assert_eq!(mixed, AllergenSet::from(['H', 'N']));
    }

    #[test]
    fn unknown_words_are_rejected() {
        let err = parse_allergens("peanut").expect_err("typo");
        assert!(matches!(&err, CanteenError::Validation(msg) if msg.contains("peanut")));
        assert!(matches!(
            parse_allergens("fish, shellfish"),
            Err(CanteenError::Validation(_))
        ));
    }

    #[test]
    fn rejects_digits() {
        assert!(matches!(
            parse_allergens("F,3"),
            Err(CanteenError::Validation(_))
        ));
    }
}
