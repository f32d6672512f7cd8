// src/export.rs

use crate::billing::Bill;
use crate::config::SupplierSection;
use time::OffsetDateTime;

/// Body rows per page of the bill document.
const ROWS_PER_PAGE: usize = 40;

/// Row-oriented export of the ledger: one row per entry, then a TOTAL
/// row (billed litres) and a GRAND TOTAL row (billed amount).
pub fn ledger_csv(bill: &Bill) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut data = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut data);
        writer.write_record(["date", "milk_ltr"])?;
        for entry in &bill.entries {
            writer.write_record([entry.label.as_str(), fmt_number(entry.litres).as_str()])?;
        }
        writer.write_record(["TOTAL", fmt_number(bill.total_litres).as_str()])?;
        writer.write_record(["GRAND TOTAL", fmt_number(bill.total_amount).as_str()])?;
        writer.flush()?;
    }
    Ok(data)
}

/// Paginated plain-text bill: fixed header block, a date/quantity body
/// table, and a summary block with the resolution-method footnote.
pub fn bill_document(bill: &Bill, supplier: &SupplierSection) -> Vec<u8> {
    let mut out = String::new();

    out.push_str(&format!("{}, {}\n\n", supplier.name, supplier.location));
    out.push_str(&format!("Customer: {}\n", supplier.customer));
    out.push_str(&format!("Month: {}\n", supplier.month));
    out.push_str(&format!(
        "Generated: {}\n\n",
        OffsetDateTime::now_utc().date()
    ));

    out.push_str(&format!("{:<12}{}\n", "Date", "Milk (Ltr)"));
    for (i, entry) in bill.entries.iter().enumerate() {
        if i > 0 && i % ROWS_PER_PAGE == 0 {
            // Form feed between pages; the table header repeats.
            out.push_str(&format!("\x0c{:<12}{}\n", "Date", "Milk (Ltr)"));
        }
        out.push_str(&format!("{:<12}{}\n", entry.label, fmt_number(entry.litres)));
    }

    out.push('\n');
    out.push_str(&format!(
        "Total Milk: {} litres\n",
        fmt_number(bill.total_litres)
    ));
    out.push_str(&format!(
        "Rate: ₹{} per litre\n",
        fmt_number(bill.rate_per_litre)
    ));
    out.push_str(&format!("Extras: ₹{}\n", fmt_number(bill.extra_charges)));
    out.push_str(&format!(
        "GRAND TOTAL: ₹{}\n\n",
        fmt_number(bill.total_amount)
    ));

    out.push_str(&format!("Extraction method used: {}\n", bill.method));
    if bill.fallback_count {
        out.push_str("Quantity was estimated by counting raw '1' marks — verify against the photo.\n");
    }
    if bill.no_entries_recognized {
        out.push_str("No delivery marks were recognized. Retry with a clearer photo or enter litres manually.\n");
    }
    out.push_str("NOTE: This is an automated best-effort extraction. Verify amounts before collection.\n");

    out.into_bytes()
}

/// Print whole litres and rupees without a trailing ".0".
fn fmt_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
