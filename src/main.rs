mod billing;
mod config;
mod export;
mod normalize;
mod ocr;
mod register;
mod vocabulary;

use billing::BillingInput;
use config::Config;
use ocr::Observation;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use vocabulary::Vocabulary;

const CONFIG_PATH: &str = "milk_register.toml";

const USAGE: &str = "usage:
  milk-register <image-or-text-file> [--text] [--litres N] [--rate N] [--extra N]
  milk-register learn <mark> <litres>";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter("info")
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("learn") => learn_variant(&args[1..]),
        Some(_) => run_bill(&args),
        None => {
            eprintln!("{USAGE}");
            Ok(())
        }
    }
}

/// Record a newly confirmed misread spelling in the config file, so
/// the next run resolves it without a code change.
fn learn_variant(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let [token, litres] = args else {
        return Err(USAGE.into());
    };
    let litres: f64 = litres
        .parse()
        .map_err(|_| format!("'{litres}' is not a quantity in litres"))?;

    Config::add_vocabulary_variant(CONFIG_PATH, token, litres)?;
    info!(token = %token, litres = litres, path = CONFIG_PATH, "Vocabulary variant recorded");

    // Reload and self-check so a bad entry is caught now, not at the
    // next billing run.
    let cfg = Config::load(CONFIG_PATH)?;
    Vocabulary::from_config(&cfg.vocabulary.marks)?;
    Ok(())
}

fn run_bill(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let opts = CliOptions::parse(args)?;
    let cfg = Config::load_or_default(CONFIG_PATH)?;

    // A colliding vocabulary is a configuration defect; fail here,
    // before any image work.
    let vocab = Vocabulary::from_config(&cfg.vocabulary.marks)?;

    let input_path = Path::new(&opts.input);
    let text = if opts.text_mode || opts.input.ends_with(".txt") {
        fs::read_to_string(input_path)?
    } else {
        ocr::recover_text(input_path, &cfg.ocr.languages)
    };
    let observation = Observation::new(&opts.input, text);

    let span = tracing::info_span!("register", source = %observation.source);
    let _guard = span.enter();
    info!(uid = %observation.uid, chars = observation.text.len(), "Observation ready");

    let billing_input = BillingInput {
        rate_per_litre: opts.rate.unwrap_or(cfg.billing.rate_per_litre),
        extra_charges: opts.extra.unwrap_or(cfg.billing.extra_charges),
        manual_litres: opts.litres,
    };
    let bill = billing::build_report(&observation.text, &vocab, &billing_input);

    info!(
        entries = bill.entries.len(),
        ledger_litres = bill.ledger_litres,
        total_litres = bill.total_litres,
        rate = bill.rate_per_litre,
        extra = bill.extra_charges,
        amount = bill.total_amount,
        method = %bill.method,
        source = ?bill.quantity_source,
        "Bill computed"
    );
    if bill.no_entries_recognized {
        warn!("No entries recognized — retry with a clearer photo or pass --litres manually");
    } else if bill.fallback_count {
        warn!("Quantity comes from the raw '1'-mark count — verify against the photo");
    }

    println!("{}", serde_json::to_string_pretty(&bill)?);

    let stem = format!(
        "{}_bill_{}",
        cfg.supplier.customer.replace(' ', "_"),
        cfg.supplier.month.replace(' ', "_")
    );
    let csv_path = format!("{stem}.csv");
    fs::write(&csv_path, export::ledger_csv(&bill)?)?;
    let doc_path = format!("{stem}.txt");
    fs::write(&doc_path, export::bill_document(&bill, &cfg.supplier))?;
    info!(csv = %csv_path, document = %doc_path, "Exports written");

    Ok(())
}

struct CliOptions {
    input: String,
    text_mode: bool,
    litres: Option<f64>,
    rate: Option<f64>,
    extra: Option<f64>,
}

impl CliOptions {
    fn parse(args: &[String]) -> Result<Self, Box<dyn std::error::Error>> {
        let mut opts = CliOptions {
            input: String::new(),
            text_mode: false,
            litres: None,
            rate: None,
            extra: None,
        };
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--text" => opts.text_mode = true,
                "--litres" => opts.litres = Some(Self::number(iter.next(), "--litres")?),
                "--rate" => opts.rate = Some(Self::number(iter.next(), "--rate")?),
                "--extra" => opts.extra = Some(Self::number(iter.next(), "--extra")?),
                _ if !arg.starts_with("--") && opts.input.is_empty() => {
                    opts.input = arg.clone()
                }
                other => return Err(format!("unexpected argument '{other}'\n{USAGE}").into()),
            }
        }
        if opts.input.is_empty() {
            return Err(USAGE.into());
        }
        Ok(opts)
    }

    fn number(
        value: Option<&String>,
        flag: &str,
    ) -> Result<f64, Box<dyn std::error::Error>> {
        let value = value.ok_or_else(|| format!("{flag} needs a value"))?;
        value
            .parse()
            .map_err(|_| format!("{flag}: '{value}' is not a number").into())
    }
}
