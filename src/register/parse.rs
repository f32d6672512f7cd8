use super::{ExplicitTotal, Ledger, Method, RecognizedEntry, RegisterReading};
use crate::normalize::normalize_token;
use crate::vocabulary::Vocabulary;
use regex::Regex;

/// Main extraction entry point — runs both strategies over the text.
///
/// The vendor's own arithmetic ("39 x 70 = 2730") is looked for first
/// and, if present, is authoritative for the bill total. Per-line mark
/// resolution still runs for the remaining lines so the ledger can be
/// reviewed against it. Only when neither produces anything does the
/// last-resort count of raw '1' marks kick in.
pub fn read(text: &str, vocab: &Vocabulary) -> RegisterReading {
    let explicit_total = extract_explicit_total(text);
    let mut ledger = Ledger::new();

    for line in text.lines() {
        let line = line.trim();
        // The vendor's total line must not be re-read as delivery marks.
        if line.is_empty() || is_arithmetic_line(line) {
            continue;
        }
        let (date, rest) = split_date_label(line);
        resolve_line(rest, date, vocab, &mut ledger);
    }

    let mut fallback = false;
    if explicit_total.is_none() && ledger.is_empty() {
        let count = count_one_marks(text);
        if count > 0 {
            ledger.push(RecognizedEntry {
                label: "counted '1' marks".to_string(),
                litres: f64::from(count),
                method: Method::HeuristicCount,
            });
            fallback = true;
        }
    }

    RegisterReading {
        explicit_total,
        ledger,
        fallback,
    }
}

// ---------------------------------------------------------------------------
// Explicit-total pattern
// ---------------------------------------------------------------------------

/// Find the vendor's own multiplication line: `<litres> x <rate> =
/// <amount>`, accepting `×`, `x`, `X` or `*` as the glyph, with an
/// optional `+ <extra>` addend trailing on the same line. Only the
/// first match in document order is used.
fn extract_explicit_total(text: &str) -> Option<ExplicitTotal> {
    let re = Regex::new(r"(\d{1,4}(?:\.\d{1,2})?)\s*[×xX*]\s*(\d{1,5})\s*=\s*(\d{1,7})").ok()?;
    let cap = re.captures(text)?;
    let whole = cap.get(0)?;
    let litres: f64 = cap[1].parse().ok()?;
    let rate: f64 = cap[2].parse().ok()?;
    let amount: f64 = cap[3].parse().ok()?;

    let line_rest = text[whole.end()..].split('\n').next().unwrap_or("");
    let extra = Regex::new(r"^\s*\+\s*(\d{1,7})")
        .ok()?
        .captures(line_rest)
        .and_then(|c| c[1].parse::<f64>().ok())
        .unwrap_or(0.0);

    Some(ExplicitTotal {
        litres,
        rate,
        amount,
        extra,
    })
}

/// A line carrying the vendor's arithmetic: an equals glyph, or a
/// multiplication glyph sitting between digits. A bare "x" mark (no
/// delivery) is not arithmetic.
fn is_arithmetic_line(line: &str) -> bool {
    if line.contains('=') {
        return true;
    }
    Regex::new(r"\d\s*[×xX*]\s*\d")
        .map(|re| re.is_match(line))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Per-line mark extraction
// ---------------------------------------------------------------------------

/// Peel a leading date-like prefix ("01/08", "1-8") off the line.
/// Returns the label and the remainder to scan for marks, so the date
/// digits are never themselves read as tokens.
fn split_date_label(line: &str) -> (Option<&str>, &str) {
    let re = match Regex::new(r"^\s*(\d{1,2}[/-]\d{1,2})") {
        Ok(re) => re,
        Err(_) => return (None, line),
    };
    match re.captures(line).and_then(|c| c.get(1)) {
        Some(m) => (Some(m.as_str()), &line[m.end()..]),
        None => (None, line),
    }
}

/// Resolve every candidate token on one register row. Each candidate
/// goes through a strict priority chain: vocabulary lookup, then the
/// numeric-litre-count patterns, then silently dropped. OCR noise is
/// expected and must never abort processing.
fn resolve_line(rest: &str, date: Option<&str>, vocab: &Vocabulary, ledger: &mut Ledger) {
    let token_re = match Regex::new(r"[0-9A-Za-z|]+") {
        Ok(re) => re,
        Err(_) => return,
    };
    let tokens: Vec<&str> = token_re.find_iter(rest).map(|m| m.as_str()).collect();

    let mut i = 0;
    while i < tokens.len() {
        let normalized = normalize_token(tokens[i]);
        let mut consumed = 1;

        let resolved = if let Some(litres) = vocab.lookup(&normalized) {
            Some((litres, Method::VocabularyMatch))
        } else if let Some(litres) = litre_suffix_count(&normalized) {
            Some((litres, Method::HeuristicCount))
        } else if let Some(litres) = split_litre_count(&normalized, tokens.get(i + 1)) {
            // "1 L" arrives as two tokens; consume the unit as well.
            consumed = 2;
            Some((litres, Method::HeuristicCount))
        } else {
            None
        };

        if let Some((litres, method)) = resolved {
            let label = date
                .map(str::to_string)
                .unwrap_or_else(|| (ledger.len() + 1).to_string());
            ledger.push(RecognizedEntry {
                label,
                litres,
                method,
            });
        }
        i += consumed;
    }
}

/// "5ltr" / "2l" as a single token: an explicit litre count.
fn litre_suffix_count(normalized: &str) -> Option<f64> {
    let re = Regex::new(r"^(\d+(?:\.\d+)?)(?:ltr|l)$").ok()?;
    re.captures(normalized).and_then(|c| c[1].parse().ok())
}

/// "1 L" split across two tokens: a bare number followed by the unit.
fn split_litre_count(normalized: &str, next: Option<&&str>) -> Option<f64> {
    if normalized.is_empty() || !normalized.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let unit = normalize_token(next?);
    if unit == "l" || unit == "ltr" {
        normalized.parse().ok()
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Last-resort fallback
// ---------------------------------------------------------------------------

/// Count raw '1' digits on non-arithmetic lines. The crudest estimate
/// the engine ever emits; the entry is labeled so a reviewer can
/// discount it.
fn count_one_marks(text: &str) -> u32 {
    text.lines()
        .filter(|line| !is_arithmetic_line(line))
        .map(|line| line.chars().filter(|&c| c == '1').count() as u32)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vocab() -> Vocabulary {
        Vocabulary::from_config(&HashMap::new()).unwrap()
    }

    #[test]
    fn dated_single_litre_mark() {
        let reading = read("01/08 9\n", &vocab());
        let entries = reading.ledger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "01/08");
        assert_eq!(entries[0].litres, 1.0);
        assert_eq!(entries[0].method, Method::VocabularyMatch);
    }

    #[test]
    fn misread_marks_resolve_to_one_and_a_half() {
        for line in ["911", " 9Il ", "9ii", "9|1"] {
            let reading = read(line, &vocab());
            let entries = reading.ledger.entries();
            assert_eq!(entries.len(), 1, "line {line:?}");
            assert_eq!(entries[0].litres, 1.5, "line {line:?}");
        }
    }

    #[test]
    fn x_mark_records_a_no_delivery_day() {
        let reading = read("02/08 x\n", &vocab());
        let entries = reading.ledger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].litres, 0.0);
        assert_eq!(reading.ledger.total_litres(), 0.0);
    }

    #[test]
    fn undated_entries_get_sequential_index_labels() {
        let reading = read("9\n911\n", &vocab());
        let entries = reading.ledger.entries();
        assert_eq!(entries[0].label, "1");
        assert_eq!(entries[1].label, "2");
    }

    #[test]
    fn explicit_total_is_found_and_excluded_from_marks() {
        let reading = read("01/08 9\n39 x 70 = 2730\n", &vocab());
        let total = reading.explicit_total.unwrap();
        assert_eq!(total.litres, 39.0);
        assert_eq!(total.rate, 70.0);
        assert_eq!(total.amount, 2730.0);
        assert_eq!(total.extra, 0.0);
        // The arithmetic line contributed no ledger entries.
        assert_eq!(reading.ledger.len(), 1);
    }

    #[test]
    fn explicit_total_with_trailing_extra() {
        let reading = read("39 x 70 = 2730 + 150\n", &vocab());
        let total = reading.explicit_total.unwrap();
        assert_eq!(total.extra, 150.0);
    }

    #[test]
    fn first_explicit_total_in_document_order_wins() {
        let reading = read("10 x 70 = 700\n39 x 70 = 2730\n", &vocab());
        assert_eq!(reading.explicit_total.unwrap().litres, 10.0);
    }

    #[test]
    fn fractional_litres_in_explicit_total() {
        // The register photographed for this tool read "34.5 x 70 = 2415".
        let reading = read("34.5 x 70 = 2415\n", &vocab());
        assert_eq!(reading.explicit_total.unwrap().litres, 34.5);
    }

    #[test]
    fn litre_suffix_counts_resolve_heuristically() {
        let reading = read("03/08 2ltr\n04/08 1 L\n", &vocab());
        let entries = reading.ledger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].litres, 2.0);
        assert_eq!(entries[0].method, Method::HeuristicCount);
        assert_eq!(entries[1].litres, 1.0);
        assert_eq!(reading.ledger.total_litres(), 3.0);
    }

    #[test]
    fn noise_tokens_are_dropped_silently() {
        let reading = read("01/08 9 smudge 70\n", &vocab());
        assert_eq!(reading.ledger.len(), 1);
        assert_eq!(reading.ledger.total_litres(), 1.0);
    }

    #[test]
    fn fallback_counts_one_digits_on_non_arithmetic_lines() {
        let reading = read("line1\nx1x\n", &vocab());
        assert!(reading.fallback);
        let entries = reading.ledger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].litres, 2.0);
        assert_eq!(entries[0].method, Method::HeuristicCount);
    }

    #[test]
    fn fallback_skips_arithmetic_lines() {
        // Would count three '1's, but one line is the vendor's total.
        let reading = read("fuzz1\n1 x 70 = 70\n", &vocab());
        assert!(!reading.fallback);
        assert!(reading.explicit_total.is_some());
    }

    #[test]
    fn empty_text_reads_as_empty_ledger() {
        let reading = read("", &vocab());
        assert!(reading.ledger.is_empty());
        assert!(reading.explicit_total.is_none());
        assert!(!reading.fallback);
    }

    #[test]
    fn resolution_is_deterministic() {
        let text = "01/08 9\n02/08 911\n03/08 x\n";
        let a = read(text, &vocab());
        let b = read(text, &vocab());
        assert_eq!(a.ledger.entries(), b.ledger.entries());
        assert_eq!(a.ledger.total_litres(), b.ledger.total_litres());
    }
}
