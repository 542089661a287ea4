//! Ordered, fully formatted content of a quotation PDF. Everything here is
//! strings; the layout pass only measures and positions them.

use serde::Serialize;

use crate::format::{format_money, format_quantity};
use crate::labels::PdfLabels;
use crate::quote::client::non_empty;
use crate::quote::invoice::{selected_option_names, service_name};
use crate::quote::{PricingMode, Quotation};
use crate::settings::CompanyProfile;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledRow {
    /// Unlabeled rows (addresses) render the value alone.
    pub label: Option<String>,
    pub value: String,
}

impl LabeledRow {
    fn new(label: &str, value: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            value: value.trim().to_string(),
        }
    }

    fn plain(value: &str) -> Self {
        Self {
            label: None,
            value: value.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderBlock {
    pub name: String,
    pub rows: Vec<LabeledRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoBlock {
    pub title: String,
    pub rows: Vec<LabeledRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub index: String,
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsRow {
    pub label: String,
    pub value: String,
    pub emphasized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSection {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDocument {
    pub doc_title: String,
    pub title: String,
    pub company: HeaderBlock,
    pub logo_source: Option<String>,
    pub bill_to: InfoBlock,
    pub bill_to_name: String,
    pub details: InfoBlock,
    pub service: InfoBlock,
    pub table_header: [String; 5],
    pub table_rows: Vec<TableRow>,
    pub totals: Vec<TotalsRow>,
    pub notes: Option<TextSection>,
    pub terms: Option<TextSection>,
    pub footer: String,
    pub page_label: String,
    pub page_of_label: String,
}

fn push_row(rows: &mut Vec<LabeledRow>, label: &str, value: &str) {
    if let Some(v) = non_empty(Some(value)) {
        rows.push(LabeledRow::new(label, v));
    }
}

fn company_block(company: &CompanyProfile, labels: &PdfLabels) -> HeaderBlock {
    let mut rows = Vec::new();

    let postal_and_city = [company.postal_code.trim(), company.city.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let address = [company.address_line.trim(), postal_and_city.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if !address.is_empty() {
        rows.push(LabeledRow::plain(&address));
    }

    push_row(&mut rows, &labels.tax_id, &company.tax_id);
    push_row(&mut rows, &labels.registration_number, &company.registration_number);
    push_row(&mut rows, &labels.email, &company.email);
    push_row(&mut rows, &labels.phone, &company.phone);
    push_row(&mut rows, &labels.website, &company.website);
    push_row(&mut rows, &labels.bank_account, &company.bank_account);

    HeaderBlock {
        name: company.company_name.trim().to_string(),
        rows,
    }
}

fn measured(value: Option<f64>, unit: &str) -> Option<String> {
    let v = value.filter(|v| v.is_finite() && *v > 0.0)?;
    if unit.is_empty() {
        Some(format_quantity(v))
    } else {
        Some(format!("{} {}", format_quantity(v), unit))
    }
}

fn service_block(q: &Quotation, labels: &PdfLabels) -> InfoBlock {
    let details = &q.client.cargo_details;
    let mut rows = vec![LabeledRow::new(&labels.service_type, &service_name(q.service_type, labels))];

    push_row(&mut rows, &labels.cargo, &details.description);
    push_row(&mut rows, &labels.category, details.category.as_deref().unwrap_or(""));
    push_row(&mut rows, &labels.origin, details.origin.as_deref().unwrap_or(""));
    push_row(&mut rows, &labels.destination, details.destination.as_deref().unwrap_or(""));

    let measures = [
        (&labels.distance, measured(q.cargo.distance_km, "km")),
        (&labels.weight, measured(q.cargo.weight_kg, "kg")),
        (&labels.volume, measured(q.cargo.volume_m3, "m³")),
        (&labels.quantity, measured(q.cargo.quantity, "")),
    ];
    for (label, value) in measures {
        if let Some(v) = value {
            rows.push(LabeledRow::new(label, &v));
        }
    }

    if q.pricing_mode == PricingMode::Automatic {
        let selected = selected_option_names(&q.options, labels);
        if !selected.is_empty() {
            rows.push(LabeledRow::new(&labels.options, &selected.join(", ")));
        }
    }

    InfoBlock {
        title: labels.service_details.clone(),
        rows,
    }
}

fn text_section(title: &str, body: &str) -> Option<TextSection> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    Some(TextSection {
        title: title.to_string(),
        body: body.to_string(),
    })
}

pub fn build_document(q: &Quotation, company: &CompanyProfile, labels: &PdfLabels) -> QuoteDocument {
    let client = &q.client;

    let mut bill_rows = Vec::new();
    if non_empty(client.business_name.as_deref()).is_some() {
        push_row(&mut bill_rows, &labels.contact_person, &client.contact_person);
    }
    push_row(&mut bill_rows, &labels.email, &client.email);
    push_row(&mut bill_rows, &labels.phone, &client.phone);

    let details = InfoBlock {
        title: labels.quotation_details.clone(),
        rows: vec![
            LabeledRow::new(&labels.quotation_number, &q.number),
            LabeledRow::new(&labels.issue_date, &q.issue_date),
            LabeledRow::new(&labels.due_date, &q.due_date),
            LabeledRow::new(&labels.currency, &q.currency),
        ],
    };

    let table_rows = q
        .line_items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let description = match item.unit.as_deref() {
                Some(unit) if !unit.is_empty() => format!("{} ({})", item.description, unit),
                _ => item.description.clone(),
            };
            TableRow {
                index: (idx + 1).to_string(),
                description,
                quantity: format_quantity(item.quantity),
                unit_price: format_money(item.unit_price),
                amount: format_money(item.amount),
            }
        })
        .collect();

    let vat_shown = if q.include_vat { q.vat_percentage } else { 0.0 };
    let totals = vec![
        TotalsRow {
            label: format!("{} ({})", labels.subtotal, q.currency),
            value: format_money(q.subtotal),
            emphasized: false,
        },
        TotalsRow {
            label: format!("{} ({}%)", labels.vat, format_quantity(vat_shown)),
            value: format_money(q.vat_amount),
            emphasized: false,
        },
        TotalsRow {
            label: format!("{} ({})", labels.total, q.currency),
            value: format_money(q.final_total),
            emphasized: true,
        },
    ];

    let logo_source = non_empty(Some(company.logo_url.as_str())).map(str::to_string);

    QuoteDocument {
        doc_title: format!("{} {}", labels.doc_title, q.number),
        title: format!("{} {}", labels.quotation_title, q.number),
        company: company_block(company, labels),
        logo_source,
        bill_to: InfoBlock {
            title: labels.bill_to.clone(),
            rows: bill_rows,
        },
        bill_to_name: client.display_name().to_string(),
        details,
        service: service_block(q, labels),
        table_header: [
            labels.col_index.clone(),
            labels.col_description.clone(),
            labels.col_qty.clone(),
            labels.col_unit_price.clone(),
            labels.col_amount.clone(),
        ],
        table_rows,
        totals,
        notes: text_section(&labels.notes, &q.notes),
        terms: text_section(&labels.terms, &q.terms_text),
        footer: labels.footer_generated.clone(),
        page_label: labels.page.clone(),
        page_of_label: labels.of.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{pdf_labels, Language};
    use crate::pricing::{CargoField, Insurance};
    use crate::quote::{compute_invoice, reduce, CargoDetails, ClientRef, QuoteAction, QuoteFormState, QuoteMeta};
    use time::{Date, Month};

    fn quotation(state: QuoteFormState) -> Quotation {
        let meta = QuoteMeta {
            number: "QT-0042".into(),
            issue_date: Date::from_calendar_date(2026, Month::May, 4).unwrap(),
            validity_days: 30,
            currency: "TZS".into(),
            language: Language::En,
        };
        compute_invoice(&state, &meta).unwrap()
    }

    fn client() -> ClientRef {
        ClientRef {
            contact_person: "Halima Omari".into(),
            email: "halima@example.com".into(),
            phone: "+255 754 000 000".into(),
            business_name: Some("Pwani Fresh Ltd".into()),
            cargo_details: CargoDetails {
                description: "Chilled fish".into(),
                weight: Some(800.0),
                volume: None,
                quantity: None,
                category: None,
                origin: Some("Tanga".into()),
                destination: Some("Moshi".into()),
            },
        }
    }

    fn company() -> CompanyProfile {
        CompanyProfile {
            company_name: "Bahari Logistics".into(),
            address_line: "Plot 12, Nyerere Road".into(),
            city: "Dar es Salaam".into(),
            tax_id: "123-456-789".into(),
            ..CompanyProfile::default()
        }
    }

    #[test]
    fn document_sections_follow_quotation() {
        let mut state = reduce(&QuoteFormState::default(), QuoteAction::SelectClient { client: client() });
        state = reduce(
            &state,
            QuoteAction::SetCargoField {
                field: CargoField::DistanceKm,
                value: "350".into(),
            },
        );
        state = reduce(&state, QuoteAction::SetInsurance { value: Insurance::Basic });
        let q = quotation(state);
        let labels = pdf_labels(Language::En).unwrap();
        let doc = build_document(&q, &company(), labels);

        assert_eq!(doc.title, "QUOTATION QT-0042");
        assert_eq!(doc.bill_to_name, "Pwani Fresh Ltd");
        assert_eq!(doc.bill_to.rows[0].value, "Halima Omari");
        assert_eq!(doc.company.rows[0].label, None);
        assert_eq!(doc.company.rows[0].value, "Plot 12, Nyerere Road, Dar es Salaam");
        assert!(doc.logo_source.is_none());

        let service: Vec<_> = doc.service.rows.iter().map(|r| r.value.as_str()).collect();
        assert!(service.contains(&"Chilled fish"));
        assert!(service.contains(&"350 km"));
        assert!(service.contains(&"800 kg"));
        assert!(service.contains(&"Basic insurance"));

        assert_eq!(doc.table_rows.len(), 2);
        assert_eq!(doc.table_rows[1].amount, "25,000.00");
        assert_eq!(doc.totals.len(), 3);
        assert!(doc.totals[1].label.contains("18%"));
        assert!(doc.totals[2].emphasized);
        assert!(doc.notes.is_none());
        assert!(doc.terms.is_none());
    }

    #[test]
    fn terms_and_notes_appear_when_filled() {
        let mut state = reduce(&QuoteFormState::default(), QuoteAction::SelectClient { client: client() });
        state = reduce(&state, QuoteAction::SetNotes { value: "  Gate pass needed ".into() });
        state = reduce(&state, QuoteAction::SetTerms { value: "1. Valid 30 days".into() });
        state = reduce(&state, QuoteAction::SetIncludeVat { enabled: false });
        let q = quotation(state);
        let doc = build_document(&q, &company(), pdf_labels(Language::En).unwrap());

        assert_eq!(doc.notes.unwrap().body, "Gate pass needed");
        assert_eq!(doc.terms.unwrap().title, "Terms and conditions");
        assert!(doc.totals[1].label.contains("(0%)"));
    }
}
