// src/normalize.rs

/// Canonicalize one candidate mark token for vocabulary lookup.
///
/// OCR mangles the handwritten register marks in predictable ways:
/// "9 11" comes back split, "9Il" mixes case, and a vertical stroke is
/// often read as `|`. Lowercase everything, drop internal whitespace so
/// split marks re-join, and map `|` to `l` so stroke misreads land on
/// the listed vocabulary variants.
///
/// Digit runs that participate in the vendor's own arithmetic never
/// pass through here; explicit-total detection reads the raw line, and
/// "70" cannot be corrupted into "l0" by token normalization.
pub fn normalize_token(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '|' => 'l',
            _ => c.to_ascii_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case() {
        assert_eq!(normalize_token("9Il"), "9il");
        assert_eq!(normalize_token("X"), "x");
    }

    #[test]
    fn rejoins_split_marks() {
        assert_eq!(normalize_token(" 9 11 "), "911");
    }

    #[test]
    fn maps_pipe_to_letterform() {
        assert_eq!(normalize_token("9|1"), "9l1");
    }

    #[test]
    fn leaves_plain_digits_alone() {
        assert_eq!(normalize_token("70"), "70");
    }
}
