use serde::{Deserialize, Serialize};

use crate::error::PricingError;

use super::input::round_amount;
use super::rules::{
    Insurance, ServiceTemplate, SpecialHandling, Urgency, MOVING_CATALOG, QUANTITY_RATE_PER_UNIT,
    VOLUME_RATE_PER_M3, WEIGHT_RATE_PER_KG,
};

/// Physical cargo parameters. Absent fields count as 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CargoSpec {
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub volume_m3: Option<f64>,
    #[serde(default)]
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CargoField {
    DistanceKm,
    WeightKg,
    VolumeM3,
    Quantity,
}

impl CargoField {
    pub fn name(self) -> &'static str {
        match self {
            CargoField::DistanceKm => "distanceKm",
            CargoField::WeightKg => "weightKg",
            CargoField::VolumeM3 => "volumeM3",
            CargoField::Quantity => "quantity",
        }
    }
}

impl CargoSpec {
    pub fn get(&self, field: CargoField) -> Option<f64> {
        match field {
            CargoField::DistanceKm => self.distance_km,
            CargoField::WeightKg => self.weight_kg,
            CargoField::VolumeM3 => self.volume_m3,
            CargoField::Quantity => self.quantity,
        }
    }

    pub fn with(mut self, field: CargoField, value: Option<f64>) -> Self {
        let slot = match field {
            CargoField::DistanceKm => &mut self.distance_km,
            CargoField::WeightKg => &mut self.weight_kg,
            CargoField::VolumeM3 => &mut self.volume_m3,
            CargoField::Quantity => &mut self.quantity,
        };
        *slot = value;
        self
    }

    fn checked(&self, field: CargoField) -> Result<f64, PricingError> {
        match self.get(field) {
            None => Ok(0.0),
            Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
            Some(v) => Err(PricingError::InvalidInput {
                field: field.name(),
                value: v,
            }),
        }
    }
}

/// `round((distance*base_rate + weight*200 + volume*150 + quantity*1000) * multiplier)`.
pub fn base_cost(template: &ServiceTemplate, cargo: &CargoSpec) -> Result<f64, PricingError> {
    let distance = cargo.checked(CargoField::DistanceKm)?;
    let weight = cargo.checked(CargoField::WeightKg)?;
    let volume = cargo.checked(CargoField::VolumeM3)?;
    let quantity = cargo.checked(CargoField::Quantity)?;

    let mut raw = 0.0;
    if distance > 0.0 {
        raw += distance * template.base_rate;
    }
    if weight > 0.0 {
        raw += weight * WEIGHT_RATE_PER_KG;
    }
    if volume > 0.0 {
        raw += volume * VOLUME_RATE_PER_M3;
    }
    if quantity > 0.0 {
        raw += quantity * QUANTITY_RATE_PER_UNIT;
    }

    Ok(round_amount(raw * template.multiplier))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingOptions {
    #[serde(default)]
    pub special_handling: SpecialHandling,
    #[serde(default)]
    pub insurance: Insurance,
    #[serde(default)]
    pub urgency: Urgency,
}

/// Surcharge contribution per category. Each category holds exactly one value,
/// so re-selecting within a category replaces its amount; the fee total is
/// only ever derived by summing the three slots.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Surcharges {
    pub special_handling: f64,
    pub insurance: f64,
    pub urgency: f64,
}

impl Surcharges {
    pub fn from_options(options: &PricingOptions) -> Self {
        Self {
            special_handling: options.special_handling.surcharge(),
            insurance: options.insurance.surcharge(),
            urgency: options.urgency.surcharge(),
        }
    }

    pub fn total(&self) -> f64 {
        self.special_handling + self.insurance + self.urgency
    }
}

/// One row of the itemized moving quotation as entered by the user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovingLineInput {
    pub key: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: f64,
}

impl MovingLineInput {
    /// `quantity * unit_price`, no rounding; invalid inputs contribute 0.
    pub fn line_total(&self) -> f64 {
        let q = finite_or_zero(self.quantity);
        let p = finite_or_zero(self.unit_price);
        if q <= 0.0 || p <= 0.0 {
            return 0.0;
        }
        q * p
    }

    pub fn is_billable(&self) -> bool {
        self.line_total() > 0.0
    }
}

pub fn empty_moving_lines() -> Vec<MovingLineInput> {
    MOVING_CATALOG
        .iter()
        .map(|entry| MovingLineInput {
            key: entry.key.to_string(),
            quantity: 0.0,
            unit_price: 0.0,
        })
        .collect()
}

pub fn itemized_subtotal(lines: &[MovingLineInput]) -> f64 {
    lines.iter().map(MovingLineInput::line_total).sum()
}

pub fn manual_subtotal(base_price: f64, additional_charges: f64) -> f64 {
    finite_or_zero(base_price).max(0.0) + finite_or_zero(additional_charges).max(0.0)
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::rules::ServiceType;

    #[test]
    fn empty_cargo_costs_nothing_for_every_service() {
        for service in ServiceType::ALL {
            let cost = base_cost(service.template(), &CargoSpec::default()).unwrap();
            assert_eq!(cost, 0.0, "{:?}", service);

            let zeros = CargoSpec {
                distance_km: Some(0.0),
                weight_kg: Some(0.0),
                volume_m3: Some(0.0),
                quantity: Some(0.0),
            };
            assert_eq!(base_cost(service.template(), &zeros).unwrap(), 0.0);
        }
    }

    #[test]
    fn freight_weight_and_volume() {
        let cargo = CargoSpec {
            weight_kg: Some(10.0),
            volume_m3: Some(2.0),
            ..CargoSpec::default()
        };
        let cost = base_cost(ServiceType::Freight.template(), &cargo).unwrap();
        assert_eq!(cost, 2760.0);
    }

    #[test]
    fn all_terms_are_summed_before_multiplier() {
        let cargo = CargoSpec {
            distance_km: Some(100.0),
            weight_kg: Some(500.0),
            volume_m3: Some(4.0),
            quantity: Some(3.0),
        };
        // (100*1500 + 500*200 + 4*150 + 3*1000) * 1.5
        let cost = base_cost(ServiceType::Moving.template(), &cargo).unwrap();
        assert_eq!(cost, ((150_000.0_f64 + 100_000.0 + 600.0 + 3_000.0) * 1.5).round());

        let courier = base_cost(ServiceType::Courier.template(), &cargo).unwrap();
        assert_eq!(courier, 80_000.0 + 100_000.0 + 600.0 + 3_000.0);
    }

    #[test]
    fn fractional_results_are_rounded() {
        let cargo = CargoSpec {
            volume_m3: Some(0.33),
            ..CargoSpec::default()
        };
        // 0.33 * 150 * 1.2 = 59.4
        assert_eq!(base_cost(ServiceType::Freight.template(), &cargo).unwrap(), 59.0);
    }

    #[test]
    fn negative_input_is_rejected() {
        let cargo = CargoSpec {
            weight_kg: Some(-1.0),
            ..CargoSpec::default()
        };
        let err = base_cost(ServiceType::Freight.template(), &cargo).unwrap_err();
        assert_eq!(
            err,
            PricingError::InvalidInput {
                field: "weightKg",
                value: -1.0
            }
        );

        let nan = CargoSpec {
            distance_km: Some(f64::NAN),
            ..CargoSpec::default()
        };
        assert!(base_cost(ServiceType::Freight.template(), &nan).is_err());
    }

    #[test]
    fn surcharges_replace_within_category() {
        let mut options = PricingOptions {
            special_handling: SpecialHandling::Fragile,
            ..PricingOptions::default()
        };
        assert_eq!(Surcharges::from_options(&options).total(), 50_000.0);

        options.special_handling = SpecialHandling::Express;
        let fees = Surcharges::from_options(&options);
        assert_eq!(fees.special_handling, 100_000.0);
        assert_eq!(fees.total(), 100_000.0);
    }

    #[test]
    fn surcharges_accumulate_across_categories() {
        let options = PricingOptions {
            special_handling: SpecialHandling::Oversized,
            insurance: Insurance::Premium,
            urgency: Urgency::SameDay,
        };
        assert_eq!(Surcharges::from_options(&options).total(), 125_000.0 + 50_000.0 + 150_000.0);
    }

    #[test]
    fn moving_line_totals() {
        let line = MovingLineInput {
            key: "boxes_small".into(),
            quantity: 5.0,
            unit_price: 2000.0,
        };
        assert_eq!(line.line_total(), 10_000.0);

        let zero_qty = MovingLineInput {
            key: "bubble_wrap".into(),
            quantity: 0.0,
            unit_price: 15_000.0,
        };
        assert_eq!(zero_qty.line_total(), 0.0);
        assert!(!zero_qty.is_billable());

        let fractional = MovingLineInput {
            key: "fuel".into(),
            quantity: 12.5,
            unit_price: 3199.9,
        };
        assert_eq!(fractional.line_total(), 12.5 * 3199.9);

        assert_eq!(itemized_subtotal(&[line, zero_qty]), 10_000.0);
    }

    #[test]
    fn empty_moving_lines_follow_catalog() {
        let lines = empty_moving_lines();
        assert_eq!(lines.len(), MOVING_CATALOG.len());
        assert_eq!(lines[0].key, MOVING_CATALOG[0].key);
        assert_eq!(itemized_subtotal(&lines), 0.0);
    }

    #[test]
    fn manual_subtotal_sums_both_fields() {
        assert_eq!(manual_subtotal(500_000.0, 75_000.0), 575_000.0);
        assert_eq!(manual_subtotal(-10.0, 75_000.0), 75_000.0);
    }
}
