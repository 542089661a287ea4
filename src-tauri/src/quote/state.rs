//! Immutable quotation form state and the reducer that produces the next
//! state from a user action. Numeric input is coerced here, once, so every
//! state the reducer hands out is valid for the calculator.

use serde::{Deserialize, Serialize};

use crate::pricing::{
    clamp_non_negative, clamp_percentage, empty_moving_lines, parse_amount, CargoField, CargoSpec,
    Insurance, MovingLineInput, PricingOptions, ServiceType, SpecialHandling, TaxSettings, Urgency,
    MOVING_CATALOG,
};

use super::client::ClientRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteFormState {
    #[serde(default)]
    pub client: Option<ClientRef>,
    #[serde(default)]
    pub service_type: ServiceType,
    #[serde(default)]
    pub cargo: CargoSpec,
    #[serde(default)]
    pub options: PricingOptions,
    #[serde(default)]
    pub manual_pricing: bool,
    #[serde(default)]
    pub manual_base_price: f64,
    #[serde(default)]
    pub manual_additional_charges: f64,
    #[serde(default = "empty_moving_lines")]
    pub moving_lines: Vec<MovingLineInput>,
    #[serde(default)]
    pub tax: TaxSettings,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub terms: String,
}

impl Default for QuoteFormState {
    fn default() -> Self {
        Self {
            client: None,
            service_type: ServiceType::default(),
            cargo: CargoSpec::default(),
            options: PricingOptions::default(),
            manual_pricing: false,
            manual_base_price: 0.0,
            manual_additional_charges: 0.0,
            moving_lines: empty_moving_lines(),
            tax: TaxSettings::default(),
            notes: String::new(),
            terms: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum QuoteAction {
    SelectClient { client: ClientRef },
    ClearClient,
    SetServiceType { service_type: ServiceType },
    SetCargoField { field: CargoField, value: String },
    SetSpecialHandling { value: SpecialHandling },
    SetInsurance { value: Insurance },
    SetUrgency { value: Urgency },
    SetManualPricing { enabled: bool },
    SetManualBasePrice { value: String },
    SetManualAdditionalCharges { value: String },
    SetMovingQuantity { key: String, value: String },
    SetMovingUnitPrice { key: String, value: String },
    SetIncludeVat { enabled: bool },
    SetVatPercentage { value: String },
    SetNotes { value: String },
    SetTerms { value: String },
}

/// Returns the state that follows `action`. The input state is left untouched.
pub fn reduce(state: &QuoteFormState, action: QuoteAction) -> QuoteFormState {
    let mut next = state.clone();

    match action {
        QuoteAction::SelectClient { client } => {
            next.cargo = cargo_from_client(&client, &next.cargo);
            next.client = Some(client);
        }
        QuoteAction::ClearClient => {
            next.client = None;
        }
        QuoteAction::SetServiceType { service_type } => {
            next.service_type = service_type;
        }
        QuoteAction::SetCargoField { field, value } => {
            let parsed = if value.trim().is_empty() {
                None
            } else {
                Some(parse_amount(&value))
            };
            next.cargo = next.cargo.with(field, parsed);
        }
        QuoteAction::SetSpecialHandling { value } => {
            next.options.special_handling = value;
        }
        QuoteAction::SetInsurance { value } => {
            next.options.insurance = value;
        }
        QuoteAction::SetUrgency { value } => {
            next.options.urgency = value;
        }
        QuoteAction::SetManualPricing { enabled } => {
            next.manual_pricing = enabled;
        }
        QuoteAction::SetManualBasePrice { value } => {
            next.manual_base_price = parse_amount(&value);
        }
        QuoteAction::SetManualAdditionalCharges { value } => {
            next.manual_additional_charges = parse_amount(&value);
        }
        QuoteAction::SetMovingQuantity { key, value } => {
            match moving_line_mut(&mut next, &key) {
                Some(line) => line.quantity = parse_amount(&value),
                None => tracing::warn!(key = %key, "ignoring quantity for unknown moving line"),
            }
        }
        QuoteAction::SetMovingUnitPrice { key, value } => {
            match moving_line_mut(&mut next, &key) {
                Some(line) => line.unit_price = parse_amount(&value),
                None => tracing::warn!(key = %key, "ignoring unit price for unknown moving line"),
            }
        }
        QuoteAction::SetIncludeVat { enabled } => {
            next.tax.include_vat = enabled;
        }
        QuoteAction::SetVatPercentage { value } => {
            next.tax.vat_percentage = clamp_percentage(parse_amount(&value));
        }
        QuoteAction::SetNotes { value } => {
            next.notes = value;
        }
        QuoteAction::SetTerms { value } => {
            next.terms = value;
        }
    }

    next
}

fn moving_line_mut<'a>(state: &'a mut QuoteFormState, key: &str) -> Option<&'a mut MovingLineInput> {
    if !MOVING_CATALOG.iter().any(|e| e.key == key) {
        return None;
    }
    if let Some(idx) = state.moving_lines.iter().position(|l| l.key == key) {
        return state.moving_lines.get_mut(idx);
    }
    state.moving_lines.push(MovingLineInput {
        key: key.to_string(),
        quantity: 0.0,
        unit_price: 0.0,
    });
    state.moving_lines.last_mut()
}

/// Prefills weight/volume/quantity from the quote request; fields the request
/// leaves empty keep whatever the form already had.
fn cargo_from_client(client: &ClientRef, current: &CargoSpec) -> CargoSpec {
    let details = &client.cargo_details;
    let mut cargo = *current;
    if let Some(w) = details.weight {
        cargo = cargo.with(CargoField::WeightKg, Some(clamp_non_negative(w)));
    }
    if let Some(v) = details.volume {
        cargo = cargo.with(CargoField::VolumeM3, Some(clamp_non_negative(v)));
    }
    if let Some(q) = details.quantity {
        cargo = cargo.with(CargoField::Quantity, Some(clamp_non_negative(q)));
    }
    cargo
}

impl QuoteFormState {
    /// Applies the form-boundary coercion to a state that did not come through
    /// the reducer (e.g. deserialized from a file).
    pub fn sanitized(mut self) -> Self {
        for field in [
            CargoField::DistanceKm,
            CargoField::WeightKg,
            CargoField::VolumeM3,
            CargoField::Quantity,
        ] {
            let value = self.cargo.get(field).map(clamp_non_negative);
            self.cargo = self.cargo.with(field, value);
        }
        self.manual_base_price = clamp_non_negative(self.manual_base_price);
        self.manual_additional_charges = clamp_non_negative(self.manual_additional_charges);
        self.tax.vat_percentage = clamp_percentage(self.tax.vat_percentage);

        let mut lines = empty_moving_lines();
        for input in &self.moving_lines {
            match lines.iter_mut().find(|l| l.key == input.key) {
                Some(line) => {
                    line.quantity = clamp_non_negative(input.quantity);
                    line.unit_price = clamp_non_negative(input.unit_price);
                }
                None => tracing::warn!(key = %input.key, "dropping unknown moving line"),
            }
        }
        self.moving_lines = lines;
        self
    }

    pub fn with_tax(mut self, tax: TaxSettings) -> Self {
        self.tax = TaxSettings {
            include_vat: tax.include_vat,
            vat_percentage: clamp_percentage(tax.vat_percentage),
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::client::CargoDetails;

    fn client() -> ClientRef {
        ClientRef {
            contact_person: "Amina Mwakyusa".into(),
            email: "amina@example.com".into(),
            phone: "+255 700 000 111".into(),
            business_name: Some("Kilimo Traders".into()),
            cargo_details: CargoDetails {
                description: "Bagged maize".into(),
                weight: Some(1200.0),
                volume: Some(-3.0),
                quantity: None,
                category: Some("Agricultural".into()),
                origin: Some("Arusha".into()),
                destination: Some("Dar es Salaam".into()),
            },
        }
    }

    #[test]
    fn select_client_prefills_cargo() {
        let s = reduce(&QuoteFormState::default(), QuoteAction::SelectClient { client: client() });
        assert!(s.client.is_some());
        assert_eq!(s.cargo.weight_kg, Some(1200.0));
        assert_eq!(s.cargo.volume_m3, Some(0.0));
        assert_eq!(s.cargo.quantity, None);
    }

    #[test]
    fn reducer_does_not_mutate_input() {
        let before = QuoteFormState::default();
        let after = reduce(
            &before,
            QuoteAction::SetNotes {
                value: "Call before arrival".into(),
            },
        );
        assert_eq!(before.notes, "");
        assert_eq!(after.notes, "Call before arrival");
    }

    #[test]
    fn invalid_numbers_are_stored_as_zero() {
        let s = QuoteFormState::default();
        let s = reduce(
            &s,
            QuoteAction::SetCargoField {
                field: CargoField::WeightKg,
                value: "-40".into(),
            },
        );
        assert_eq!(s.cargo.weight_kg, Some(0.0));

        let s = reduce(
            &s,
            QuoteAction::SetCargoField {
                field: CargoField::DistanceKm,
                value: "far".into(),
            },
        );
        assert_eq!(s.cargo.distance_km, Some(0.0));

        let s = reduce(
            &s,
            QuoteAction::SetCargoField {
                field: CargoField::DistanceKm,
                value: "".into(),
            },
        );
        assert_eq!(s.cargo.distance_km, None);

        let s = reduce(&s, QuoteAction::SetManualBasePrice { value: "-1".into() });
        assert_eq!(s.manual_base_price, 0.0);
    }

    #[test]
    fn vat_percentage_is_clamped() {
        let s = reduce(
            &QuoteFormState::default(),
            QuoteAction::SetVatPercentage { value: "180".into() },
        );
        assert_eq!(s.tax.vat_percentage, 100.0);
        let s = reduce(&s, QuoteAction::SetVatPercentage { value: "x".into() });
        assert_eq!(s.tax.vat_percentage, 0.0);
    }

    #[test]
    fn moving_lines_are_keyed_by_catalog() {
        let s = reduce(
            &QuoteFormState::default(),
            QuoteAction::SetMovingQuantity {
                key: "boxes_small".into(),
                value: "5".into(),
            },
        );
        let s = reduce(
            &s,
            QuoteAction::SetMovingUnitPrice {
                key: "boxes_small".into(),
                value: "2000".into(),
            },
        );
        let line = s.moving_lines.iter().find(|l| l.key == "boxes_small").unwrap();
        assert_eq!(line.line_total(), 10_000.0);

        let unchanged = reduce(
            &s,
            QuoteAction::SetMovingQuantity {
                key: "piano".into(),
                value: "1".into(),
            },
        );
        assert_eq!(unchanged, s);
    }

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let json = r#"{"type":"setCargoField","field":"weightKg","value":"10"}"#;
        let action: QuoteAction = serde_json::from_str(json).unwrap();
        assert_eq!(
            action,
            QuoteAction::SetCargoField {
                field: CargoField::WeightKg,
                value: "10".into()
            }
        );

        let json = r#"{"type":"setSpecialHandling","value":"same_day"}"#;
        assert!(serde_json::from_str::<QuoteAction>(json).is_err());

        let json = r#"{"type":"setUrgency","value":"same_day"}"#;
        let action: QuoteAction = serde_json::from_str(json).unwrap();
        assert_eq!(action, QuoteAction::SetUrgency { value: Urgency::SameDay });
    }

    #[test]
    fn sanitized_clamps_deserialized_state() {
        let json = r#"{
            "cargo": { "weightKg": -5, "distanceKm": 12 },
            "manualBasePrice": -100,
            "tax": { "includeVat": true, "vatPercentage": 400 },
            "movingLines": [
                { "key": "transport", "quantity": 2, "unitPrice": -1 },
                { "key": "piano", "quantity": 1, "unitPrice": 1 }
            ]
        }"#;
        let state: QuoteFormState = serde_json::from_str(json).unwrap();
        let state = state.sanitized();
        assert_eq!(state.cargo.weight_kg, Some(0.0));
        assert_eq!(state.cargo.distance_km, Some(12.0));
        assert_eq!(state.manual_base_price, 0.0);
        assert_eq!(state.tax.vat_percentage, 100.0);
        assert_eq!(state.moving_lines.len(), MOVING_CATALOG.len());
        let transport = state.moving_lines.iter().find(|l| l.key == "transport").unwrap();
        assert_eq!(transport.quantity, 2.0);
        assert_eq!(transport.unit_price, 0.0);
    }
}
