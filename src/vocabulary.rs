// src/vocabulary.rs

use crate::normalize::normalize_token;
use std::collections::HashMap;
use tracing::info;

/// The fixed symbol table: normalized mark spelling -> litres delivered.
///
/// The vendor's marks are a bare "9" for one litre, "911" for one and a
/// half, and "x" for no delivery. The rest of the table is the set of
/// OCR misreads observed for "911": confusions of `9`/`g`/`q` and
/// `1`/`l`/`i`. The config file can extend or override it.
const BUILTIN_MARKS: &[(&str, f64)] = &[
    ("9", 1.0),
    ("g", 1.0),
    ("q", 1.0),
    ("911", 1.5),
    ("9111", 1.5),
    ("9ii", 1.5),
    ("9ll", 1.5),
    ("9il", 1.5),
    ("9li", 1.5),
    ("9l1", 1.5),
    ("91l", 1.5),
    ("9i1", 1.5),
    ("91i", 1.5),
    ("q11", 1.5),
    ("g11", 1.5),
    ("qll", 1.5),
    ("gll", 1.5),
    ("3y1", 1.5),
    ("x", 0.0),
];

pub struct Vocabulary {
    marks: HashMap<String, f64>,
}

impl Vocabulary {
    /// Build the vocabulary from the built-in table merged with the
    /// config file's marks. A config entry with the same spelling as a
    /// built-in replaces it; two *different* spellings that collapse to
    /// the same normalized key with different quantities are ambiguous,
    /// which is a configuration defect and fatal at startup.
    pub fn from_config(
        configured: &HashMap<String, f64>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut raw: HashMap<String, f64> = BUILTIN_MARKS
            .iter()
            .map(|(token, litres)| (token.to_string(), *litres))
            .collect();
        for (token, litres) in configured {
            if *litres < 0.0 {
                return Err(format!("vocabulary mark '{token}' has negative quantity").into());
            }
            raw.insert(token.clone(), *litres);
        }

        let mut marks: HashMap<String, f64> = HashMap::new();
        let mut spelling_for: HashMap<String, String> = HashMap::new();
        for (token, litres) in &raw {
            let key = normalize_token(token);
            if key.is_empty() {
                return Err(format!("vocabulary mark '{token}' normalizes to nothing").into());
            }
            if let Some(existing) = marks.get(&key) {
                if *existing != *litres {
                    let other = &spelling_for[&key];
                    return Err(format!(
                        "ambiguous vocabulary: '{token}' and '{other}' both normalize \
                         to '{key}' but map to different quantities"
                    )
                    .into());
                }
            }
            marks.insert(key.clone(), *litres);
            spelling_for.insert(key, token.clone());
        }

        info!(marks = marks.len(), "Symbol vocabulary ready");
        Ok(Self { marks })
    }

    /// Look up a normalized token. `None` means "not a known mark",
    /// never zero; the caller decides whether to drop the token or fall
    /// through to heuristic counting.
    pub fn lookup(&self, normalized: &str) -> Option<f64> {
        self.marks.get(normalized).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> Vocabulary {
        Vocabulary::from_config(&HashMap::new()).unwrap()
    }

    #[test]
    fn canonical_marks_resolve() {
        let vocab = builtin();
        assert_eq!(vocab.lookup("9"), Some(1.0));
        assert_eq!(vocab.lookup("911"), Some(1.5));
        assert_eq!(vocab.lookup("x"), Some(0.0));
    }

    #[test]
    fn misread_variants_resolve() {
        let vocab = builtin();
        assert_eq!(vocab.lookup("9ii"), Some(1.5));
        assert_eq!(vocab.lookup("q11"), Some(1.5));
        assert_eq!(vocab.lookup("3y1"), Some(1.5));
    }

    #[test]
    fn unlisted_token_is_no_match_not_zero() {
        let vocab = builtin();
        assert_eq!(vocab.lookup("banana"), None);
        assert_eq!(vocab.lookup("70"), None);
    }

    #[test]
    fn lookup_is_deterministic() {
        let vocab = builtin();
        for (token, _) in BUILTIN_MARKS {
            let key = normalize_token(token);
            assert_eq!(vocab.lookup(&key), vocab.lookup(&key));
        }
    }

    #[test]
    fn config_marks_extend_the_table() {
        let mut extra = HashMap::new();
        extra.insert("9lll".to_string(), 1.5);
        let vocab = Vocabulary::from_config(&extra).unwrap();
        assert_eq!(vocab.lookup("9lll"), Some(1.5));
    }

    #[test]
    fn config_can_override_a_builtin_spelling() {
        let mut extra = HashMap::new();
        extra.insert("3y1".to_string(), 1.0);
        let vocab = Vocabulary::from_config(&extra).unwrap();
        assert_eq!(vocab.lookup("3y1"), Some(1.0));
    }

    #[test]
    fn colliding_spellings_fail_the_self_check() {
        // "9LL" normalizes to the same key as the built-in "9ll" but
        // claims a different quantity.
        let mut extra = HashMap::new();
        extra.insert("9LL".to_string(), 2.0);
        assert!(Vocabulary::from_config(&extra).is_err());
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let mut extra = HashMap::new();
        extra.insert("zz".to_string(), -1.0);
        assert!(Vocabulary::from_config(&extra).is_err());
    }
}
