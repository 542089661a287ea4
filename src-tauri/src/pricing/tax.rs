use serde::{Deserialize, Serialize};

use super::input::{clamp_percentage, round_amount};

pub const DEFAULT_VAT_PERCENTAGE: f64 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSettings {
    pub include_vat: bool,
    pub vat_percentage: f64,
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            include_vat: true,
            vat_percentage: DEFAULT_VAT_PERCENTAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub subtotal: f64,
    pub vat_percentage: f64,
    pub vat_amount: f64,
    pub final_total: f64,
}

pub fn apply_vat(subtotal: f64, tax: &TaxSettings) -> TaxBreakdown {
    let vat_percentage = clamp_percentage(tax.vat_percentage);
    let vat_amount = if tax.include_vat {
        round_amount(subtotal * vat_percentage / 100.0)
    } else {
        0.0
    };

    TaxBreakdown {
        subtotal,
        vat_percentage,
        vat_amount,
        final_total: subtotal + vat_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eighteen_percent_of_hundred_thousand() {
        let t = apply_vat(100_000.0, &TaxSettings::default());
        assert_eq!(t.vat_amount, 18_000.0);
        assert_eq!(t.final_total, 118_000.0);
    }

    #[test]
    fn vat_disabled_adds_nothing() {
        let tax = TaxSettings {
            include_vat: false,
            vat_percentage: 18.0,
        };
        let t = apply_vat(575_000.0, &tax);
        assert_eq!(t.vat_amount, 0.0);
        assert_eq!(t.final_total, 575_000.0);
    }

    #[test]
    fn vat_amount_is_rounded() {
        let t = apply_vat(2_760.0, &TaxSettings::default());
        // 2760 * 0.18 = 496.8
        assert_eq!(t.vat_amount, 497.0);
        assert_eq!(t.final_total, t.subtotal + t.vat_amount);
    }

    #[test]
    fn out_of_range_percentage_is_clamped() {
        let tax = TaxSettings {
            include_vat: true,
            vat_percentage: 250.0,
        };
        let t = apply_vat(1_000.0, &tax);
        assert_eq!(t.vat_percentage, 100.0);
        assert_eq!(t.vat_amount, 1_000.0);
    }

    #[test]
    fn repeated_application_is_stable() {
        let tax = TaxSettings::default();
        assert_eq!(apply_vat(123_456.0, &tax), apply_vat(123_456.0, &tax));
    }
}
