use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::error::{PricingError, QuoteError};
use crate::format::format_date;
use crate::labels::{pdf_labels, Language, PdfLabels};
use crate::pricing::{
    apply_vat, base_cost, itemized_subtotal, manual_subtotal, round_amount, CargoSpec,
    PricingOptions, ServiceType, Surcharges, TaxBreakdown, MOVING_CATALOG,
};

use super::client::ClientRef;
use super::state::QuoteFormState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PricingMode {
    Automatic,
    Manual,
    Itemized,
}

impl PricingMode {
    /// Moving quotations are always itemized; the manual toggle only applies
    /// to the other services.
    pub fn for_state(state: &QuoteFormState) -> Self {
        if state.service_type == ServiceType::Moving {
            PricingMode::Itemized
        } else if state.manual_pricing {
            PricingMode::Manual
        } else {
            PricingMode::Automatic
        }
    }
}

/// Derived totals shown live in the form while the user edits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTotals {
    pub mode: PricingMode,
    pub base_cost: f64,
    pub surcharges: Surcharges,
    pub additional_fees: f64,
    #[serde(flatten)]
    pub tax: TaxBreakdown,
}

pub fn compute_totals(state: &QuoteFormState) -> Result<QuoteTotals, PricingError> {
    let mode = PricingMode::for_state(state);
    let surcharges = Surcharges::from_options(&state.options);

    let (base, fees, subtotal) = match mode {
        PricingMode::Automatic => {
            let base = base_cost(state.service_type.template(), &state.cargo)?;
            let fees = surcharges.total();
            (base, fees, base + fees)
        }
        PricingMode::Manual => {
            let base = round_amount(state.manual_base_price.max(0.0));
            let fees = round_amount(state.manual_additional_charges.max(0.0));
            (base, fees, manual_subtotal(base, fees))
        }
        PricingMode::Itemized => {
            let subtotal = itemized_subtotal(&state.moving_lines);
            (subtotal, 0.0, subtotal)
        }
    };

    Ok(QuoteTotals {
        mode,
        base_cost: base,
        surcharges,
        additional_fees: fees,
        tax: apply_vat(subtotal, &state.tax),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    #[serde(default)]
    pub unit: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
}

impl LineItem {
    fn single(description: String, amount: f64) -> Self {
        Self {
            description,
            unit: None,
            quantity: 1.0,
            unit_price: amount,
            amount: round_amount(amount),
        }
    }
}

fn line_items(state: &QuoteFormState, totals: &QuoteTotals, labels: &PdfLabels) -> Vec<LineItem> {
    match totals.mode {
        PricingMode::Automatic => {
            let service = service_name(state.service_type, labels);
            let mut fees_desc = labels.additional_fees.clone();
            let selected = selected_option_names(&state.options, labels);
            if !selected.is_empty() {
                fees_desc = format!("{}: {}", fees_desc, selected.join(", "));
            }
            vec![
                LineItem::single(format!("{} ({})", labels.base_cost, service), totals.base_cost),
                LineItem::single(fees_desc, totals.additional_fees),
            ]
        }
        PricingMode::Manual => [
            (labels.manual_base.clone(), totals.base_cost),
            (labels.manual_additional.clone(), totals.additional_fees),
        ]
        .into_iter()
        .filter(|(_, amount)| *amount > 0.0)
        .map(|(desc, amount)| LineItem::single(desc, amount))
        .collect(),
        PricingMode::Itemized => MOVING_CATALOG
            .iter()
            .filter_map(|entry| {
                let line = state
                    .moving_lines
                    .iter()
                    .find(|l| l.key == entry.key)
                    .filter(|l| l.is_billable())?;
                Some(LineItem {
                    description: labels
                        .name(&format!("moving.{}", entry.key), entry.name)
                        .to_string(),
                    unit: Some(entry.unit.to_string()),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    amount: line.line_total(),
                })
            })
            .collect(),
    }
}

pub fn service_name(service: ServiceType, labels: &PdfLabels) -> String {
    let fallback = service.key();
    labels
        .name(&format!("service.{}", service.key()), fallback)
        .to_string()
}

/// Localized names of the options that carry a surcharge, in category order.
pub fn selected_option_names(options: &PricingOptions, labels: &PdfLabels) -> Vec<String> {
    let mut out = Vec::new();
    if options.special_handling.surcharge() > 0.0 {
        let key = options.special_handling.key();
        out.push(labels.name(&format!("handling.{key}"), key).to_string());
    }
    if options.insurance.surcharge() > 0.0 {
        let key = options.insurance.key();
        out.push(labels.name(&format!("insurance.{key}"), key).to_string());
    }
    if options.urgency.surcharge() > 0.0 {
        let key = options.urgency.key();
        out.push(labels.name(&format!("urgency.{key}"), key).to_string());
    }
    out
}

/// Numbering and locale data that comes from outside the form.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteMeta {
    pub number: String,
    pub issue_date: Date,
    pub validity_days: u16,
    pub currency: String,
    pub language: Language,
}

impl QuoteMeta {
    pub fn due_date(&self) -> Date {
        self.issue_date
            .checked_add(Duration::days(i64::from(self.validity_days)))
            .unwrap_or(self.issue_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub number: String,
    pub client: ClientRef,
    pub service_type: ServiceType,
    pub pricing_mode: PricingMode,
    pub cargo: CargoSpec,
    pub options: PricingOptions,
    pub line_items: Vec<LineItem>,
    pub subtotal: f64,
    pub include_vat: bool,
    pub vat_percentage: f64,
    pub vat_amount: f64,
    pub final_total: f64,
    pub currency: String,
    pub language: Language,
    pub notes: String,
    pub terms_text: String,
    pub issue_date: String,
    pub due_date: String,
}

/// Pure projection of the form into a quotation. Called on every change and
/// once more right before rendering.
pub fn compute_invoice(state: &QuoteFormState, meta: &QuoteMeta) -> Result<Quotation, QuoteError> {
    let client = state.client.clone().ok_or(QuoteError::MissingClient)?;
    let labels = pdf_labels(meta.language)?;
    let totals = compute_totals(state)?;
    let items = line_items(state, &totals, labels);

    let subtotal = match totals.mode {
        PricingMode::Automatic => totals.base_cost + totals.additional_fees,
        PricingMode::Manual | PricingMode::Itemized => items.iter().map(|i| i.amount).sum(),
    };
    let tax = apply_vat(subtotal, &state.tax);

    Ok(Quotation {
        number: meta.number.clone(),
        client,
        service_type: state.service_type,
        pricing_mode: totals.mode,
        cargo: state.cargo,
        options: state.options,
        line_items: items,
        subtotal: tax.subtotal,
        include_vat: state.tax.include_vat,
        vat_percentage: tax.vat_percentage,
        vat_amount: tax.vat_amount,
        final_total: tax.final_total,
        currency: meta.currency.clone(),
        language: meta.language,
        notes: state.notes.trim().to_string(),
        terms_text: state.terms.trim().to_string(),
        issue_date: format_date(meta.issue_date),
        due_date: format_date(meta.due_date()),
    })
}
