// src/billing.rs

use crate::register::{self, ExplicitTotal, Method, RecognizedEntry};
use crate::vocabulary::Vocabulary;
use serde::Serialize;

/// Caller-supplied billing parameters for one report.
#[derive(Debug, Clone, Copy)]
pub struct BillingInput {
    pub rate_per_litre: f64,
    pub extra_charges: f64,
    /// Replaces the detected quantity without touching the ledger.
    pub manual_litres: Option<f64>,
}

/// Which of the three quantity pathways produced the billed total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantitySource {
    ManualOverride,
    ExplicitTotal,
    LedgerSum,
}

/// The finished bill. Derived, read-only; recomputing from the same
/// text and input always yields the same Bill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bill {
    pub entries: Vec<RecognizedEntry>,
    /// The three candidate quantities, side by side, so a caller can
    /// show provenance.
    pub ledger_litres: f64,
    pub explicit_total: Option<ExplicitTotal>,
    pub manual_litres: Option<f64>,
    pub quantity_source: QuantitySource,
    pub total_litres: f64,
    pub rate_per_litre: f64,
    pub extra_charges: f64,
    pub total_amount: f64,
    /// Dominant resolution method, for the summary line.
    pub method: Method,
    /// Ledger-only quantity estimated by the last-resort '1'-mark count.
    pub fallback_count: bool,
    /// Nothing was recognized at all. A reportable state, not an error:
    /// the user should retry with a clearer image or enter litres
    /// manually.
    pub no_entries_recognized: bool,
}

/// Build the full report for one observation. Pure: no state survives
/// the call, and the same inputs always produce the same Bill.
///
/// Quantity precedence: a manual override beats everything; otherwise
/// the vendor's explicit total is authoritative; otherwise the ledger
/// sum. In explicit-total mode the vendor's written amount (plus any
/// written extra) is emitted as-is rather than recomputed; the stated
/// arithmetic may legitimately disagree with rate times quantity.
pub fn build_report(text: &str, vocab: &Vocabulary, input: &BillingInput) -> Bill {
    let reading = register::read(text, vocab);
    let ledger_litres = reading.ledger.total_litres();
    let no_entries_recognized = reading.ledger.is_empty() && reading.explicit_total.is_none();

    let (quantity_source, total_litres, rate_per_litre, extra_charges, total_amount) =
        if let Some(litres) = input.manual_litres {
            (
                QuantitySource::ManualOverride,
                litres,
                input.rate_per_litre,
                input.extra_charges,
                litres * input.rate_per_litre + input.extra_charges,
            )
        } else if let Some(total) = reading.explicit_total {
            (
                QuantitySource::ExplicitTotal,
                total.litres,
                total.rate,
                total.extra,
                total.amount + total.extra,
            )
        } else {
            (
                QuantitySource::LedgerSum,
                ledger_litres,
                input.rate_per_litre,
                input.extra_charges,
                ledger_litres * input.rate_per_litre + input.extra_charges,
            )
        };

    let method = reading
        .dominant_method()
        .unwrap_or(Method::HeuristicCount);

    Bill {
        entries: reading.ledger.entries().to_vec(),
        ledger_litres,
        explicit_total: reading.explicit_total,
        manual_litres: input.manual_litres,
        quantity_source,
        total_litres,
        rate_per_litre,
        extra_charges,
        total_amount,
        method,
        fallback_count: reading.fallback,
        no_entries_recognized,
    }
}
