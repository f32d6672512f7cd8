use serde::Deserialize;
use std::collections::HashMap;
use std::{fs, path::Path};
use toml_edit::{DocumentMut, value};
use tracing::info;

#[derive(Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub billing: BillingSection,
    #[serde(default)]
    pub supplier: SupplierSection,
    #[serde(default)]
    pub ocr: OcrSection,
    #[serde(default)]
    pub vocabulary: VocabularySection,
}

#[derive(Deserialize)]
pub struct BillingSection {
    #[serde(default = "default_rate")]
    pub rate_per_litre: f64,
    #[serde(default)]
    pub extra_charges: f64,
}

fn default_rate() -> f64 {
    70.0
}

impl Default for BillingSection {
    fn default() -> Self {
        Self {
            rate_per_litre: default_rate(),
            extra_charges: 0.0,
        }
    }
}

/// Header block for the exported bill document.
#[derive(Deserialize)]
pub struct SupplierSection {
    #[serde(default = "default_supplier_name")]
    pub name: String,
    #[serde(default = "default_supplier_location")]
    pub location: String,
    #[serde(default = "default_customer")]
    pub customer: String,
    #[serde(default = "default_month")]
    pub month: String,
}

fn default_supplier_name() -> String {
    "Bacchas Milk Supplier".to_string()
}

fn default_supplier_location() -> String {
    "Sector 168, Noida".to_string()
}

fn default_customer() -> String {
    "Sharma Ji".to_string()
}

fn default_month() -> String {
    "July 2025".to_string()
}

impl Default for SupplierSection {
    fn default() -> Self {
        Self {
            name: default_supplier_name(),
            location: default_supplier_location(),
            customer: default_customer(),
            month: default_month(),
        }
    }
}

#[derive(Deserialize)]
pub struct OcrSection {
    /// Tesseract language pack(s); register pages mix Devanagari and
    /// Latin digits.
    #[serde(default = "default_languages")]
    pub languages: String,
}

fn default_languages() -> String {
    "eng+hin".to_string()
}

impl Default for OcrSection {
    fn default() -> Self {
        Self {
            languages: default_languages(),
        }
    }
}

/// Extra mark spellings merged over the built-in symbol table. The
/// misread coverage is empirical and always incomplete; new spellings
/// land here, not in code.
#[derive(Deserialize, Default)]
pub struct VocabularySection {
    #[serde(default)]
    pub marks: HashMap<String, f64>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// A missing config file is fine — the built-in vocabulary and
    /// billing defaults still make a working engine.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "No config file — using defaults");
            Ok(Self::default())
        }
    }

    /// Append a newly confirmed misread spelling to the config file in
    /// place, preserving the file's formatting.
    pub fn add_vocabulary_variant(
        path: impl AsRef<Path>,
        token: &str,
        litres: f64,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = if path.as_ref().exists() {
            fs::read_to_string(&path)?
        } else {
            String::new()
        };
        let mut doc = content.parse::<DocumentMut>()?;

        doc["vocabulary"]["marks"][token] = value(litres);

        fs::write(&path, doc.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_yields_working_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.billing.rate_per_litre, 70.0);
        assert_eq!(cfg.billing.extra_charges, 0.0);
        assert_eq!(cfg.ocr.languages, "eng+hin");
        assert!(cfg.vocabulary.marks.is_empty());
    }

    #[test]
    fn sections_parse() {
        let cfg: Config = toml::from_str(
            r#"
            [billing]
            rate_per_litre = 65.0
            extra_charges = 150.0

            [supplier]
            customer = "Verma Ji"

            [vocabulary]
            marks = { "9lll" = 1.5, "91ll" = 1.5 }
            "#,
        )
        .unwrap();
        assert_eq!(cfg.billing.rate_per_litre, 65.0);
        assert_eq!(cfg.billing.extra_charges, 150.0);
        assert_eq!(cfg.supplier.customer, "Verma Ji");
        // Untouched fields keep their defaults.
        assert_eq!(cfg.supplier.name, "Bacchas Milk Supplier");
        assert_eq!(cfg.vocabulary.marks.get("9lll"), Some(&1.5));
    }

    #[test]
    fn add_variant_writes_through_to_the_file() {
        let path = std::env::temp_dir().join("milk_register_add_variant_test.toml");
        fs::write(&path, "[billing]\nrate_per_litre = 70.0\n").unwrap();

        Config::add_vocabulary_variant(&path, "91li", 1.5).unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.vocabulary.marks.get("91li"), Some(&1.5));
        // Existing sections survive the edit.
        assert_eq!(cfg.billing.rate_per_litre, 70.0);

        fs::remove_file(&path).ok();
    }
}
