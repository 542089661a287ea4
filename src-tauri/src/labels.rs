use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::QuoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Sw,
}

impl Language {
    /// Accepts locale-style codes ("en", "en-US", "sw_TZ").
    pub fn from_code(code: &str) -> Option<Self> {
        let lower = code.trim().to_ascii_lowercase();
        if lower.starts_with("en") {
            Some(Language::En)
        } else if lower.starts_with("sw") {
            Some(Language::Sw)
        } else {
            None
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Sw => "sw",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfLabels {
    pub doc_title: String,
    pub quotation_title: String,
    pub bill_to: String,
    pub quotation_details: String,
    pub service_details: String,

    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub tax_id: String,
    pub registration_number: String,
    pub bank_account: String,

    pub quotation_number: String,
    pub issue_date: String,
    pub due_date: String,
    pub currency: String,

    pub service_type: String,
    pub cargo: String,
    pub category: String,
    pub origin: String,
    pub destination: String,
    pub distance: String,
    pub weight: String,
    pub volume: String,
    pub quantity: String,
    pub options: String,

    pub col_index: String,
    pub col_description: String,
    pub col_qty: String,
    pub col_unit_price: String,
    pub col_amount: String,

    pub base_cost: String,
    pub additional_fees: String,
    pub manual_base: String,
    pub manual_additional: String,

    pub subtotal: String,
    pub vat: String,
    pub total: String,

    pub notes: String,
    pub terms: String,
    pub page: String,
    pub of: String,
    pub footer_generated: String,

    #[serde(default)]
    names: HashMap<String, String>,
}

impl PdfLabels {
    /// Localized display name for a keyed value ("service.freight",
    /// "insurance.basic", ...), or `fallback` when the locale has none.
    pub fn name<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.names.get(key).map(String::as_str).unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PdfLabelsFile {
    en: PdfLabels,
    sw: PdfLabels,
}

static PDF_LABELS: OnceLock<Result<PdfLabelsFile, String>> = OnceLock::new();

pub fn pdf_labels(lang: Language) -> Result<&'static PdfLabels, QuoteError> {
    let file = PDF_LABELS.get_or_init(|| {
        let json = include_str!("../assets/pdfLabels.json");
        serde_json::from_str::<PdfLabelsFile>(json)
            .map_err(|e| format!("Failed to parse embedded assets/pdfLabels.json: {e}"))
    });

    let file = file.as_ref().map_err(|e| QuoteError::Render(e.clone()))?;
    Ok(match lang {
        Language::En => &file.en,
        Language::Sw => &file.sw,
    })
}

#[derive(Debug, Clone, Deserialize)]
struct TermsLocale {
    lines: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TermsTemplates {
    en: TermsLocale,
    sw: TermsLocale,
}

static TERMS_TEMPLATES: OnceLock<TermsTemplates> = OnceLock::new();

fn terms_templates() -> &'static TermsTemplates {
    TERMS_TEMPLATES.get_or_init(|| {
        let json = include_str!("../assets/quoteTerms.json");
        serde_json::from_str::<TermsTemplates>(json).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "embedded quoteTerms.json unavailable");
            TermsTemplates {
                en: TermsLocale { lines: vec![] },
                sw: TermsLocale { lines: vec![] },
            }
        })
    })
}

/// Values substituted into the terms template placeholders.
#[derive(Debug, Clone)]
pub struct TermsContext<'a> {
    pub company_name: &'a str,
    pub currency: &'a str,
    pub validity_days: u16,
}

/// Default terms text loaded by the "load template" action. The terms field
/// itself stays empty until the user asks for this.
pub fn terms_template(lang: Language, ctx: &TermsContext<'_>) -> String {
    let templates = terms_templates();
    let lines = match lang {
        Language::En => &templates.en.lines,
        Language::Sw => &templates.sw.lines,
    };

    let company = if ctx.company_name.trim().is_empty() {
        "The company"
    } else {
        ctx.company_name.trim()
    };

    lines
        .iter()
        .map(|line| {
            line.replace("{VALIDITY_DAYS}", &ctx.validity_days.to_string())
                .replace("{CURRENCY}", ctx.currency)
                .replace("{COMPANY_NAME}", company)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Called once at startup; logs instead of failing if embedded labels are broken.
pub fn sanity_check_embedded_labels() {
    for lang in [Language::En, Language::Sw] {
        if let Err(e) = pdf_labels(lang) {
            tracing::error!(lang = lang.code(), error = %e, "pdfLabels.json unavailable");
        }
    }
}
