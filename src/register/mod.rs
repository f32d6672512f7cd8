// src/register/mod.rs

mod parse;

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a quantity was recovered from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// The token matched the fixed symbol vocabulary.
    VocabularyMatch,
    /// The vendor's own arithmetic line was parsed and taken as truth.
    ExplicitTotal,
    /// Estimated without a vocabulary match; discount accordingly.
    HeuristicCount,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Method::VocabularyMatch => "vocabulary_match",
            Method::ExplicitTotal => "explicit_total",
            Method::HeuristicCount => "heuristic_count",
        };
        f.write_str(tag)
    }
}

/// One resolved delivery record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedEntry {
    /// Date label from the register row ("01/08") or the 1-based entry
    /// index when no date was parseable.
    pub label: String,
    pub litres: f64,
    pub method: Method,
}

/// The vendor's own multiplication line, e.g. "39 x 70 = 2730 + 150".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplicitTotal {
    pub litres: f64,
    pub rate: f64,
    /// The amount as the vendor wrote it. May legitimately disagree
    /// with litres * rate; the written figure wins.
    pub amount: f64,
    pub extra: f64,
}

/// Ordered, summed collection of resolved entries for one document.
/// Append-only: the running sum is maintained on push and is never
/// recomputed or edited in place.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Ledger {
    entries: Vec<RecognizedEntry>,
    total_litres: f64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: RecognizedEntry) {
        self.total_litres += entry.litres;
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RecognizedEntry] {
        &self.entries
    }

    pub fn total_litres(&self) -> f64 {
        self.total_litres
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything one resolution pass recovered from the OCR text.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterReading {
    pub explicit_total: Option<ExplicitTotal>,
    pub ledger: Ledger,
    /// True when the ledger holds only the last-resort count of raw '1'
    /// marks. Callers should surface this so a reviewer discounts it.
    pub fallback: bool,
}

impl RegisterReading {
    /// The dominant resolution method, for the report summary. An
    /// explicit total outranks per-mark resolution; otherwise the most
    /// frequent method among the entries wins.
    pub fn dominant_method(&self) -> Option<Method> {
        if self.explicit_total.is_some() {
            return Some(Method::ExplicitTotal);
        }
        let (mut vocab, mut heuristic) = (0usize, 0usize);
        for entry in self.ledger.entries() {
            match entry.method {
                Method::VocabularyMatch => vocab += 1,
                Method::HeuristicCount => heuristic += 1,
                Method::ExplicitTotal => {}
            }
        }
        match (vocab, heuristic) {
            (0, 0) => None,
            (v, h) if v >= h => Some(Method::VocabularyMatch),
            _ => Some(Method::HeuristicCount),
        }
    }
}

/// Run both extraction strategies over the full OCR text.
pub fn read(text: &str, vocab: &crate::vocabulary::Vocabulary) -> RegisterReading {
    parse::read(text, vocab)
}
