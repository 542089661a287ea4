//! Quotation pricing rules: cost calculator, surcharge table and VAT.

pub mod calculator;
pub mod input;
pub mod rules;
pub mod tax;

pub use calculator::{
    base_cost, empty_moving_lines, itemized_subtotal, manual_subtotal, CargoField, CargoSpec,
    MovingLineInput, PricingOptions, Surcharges,
};
pub use input::{clamp_non_negative, clamp_percentage, parse_amount, round_amount};
pub use rules::{
    Insurance, MovingCatalogEntry, ServiceTemplate, ServiceType, SpecialHandling, Urgency,
    MOVING_CATALOG, SERVICE_TEMPLATES,
};
pub use tax::{apply_vat, TaxBreakdown, TaxSettings, DEFAULT_VAT_PERCENTAGE};
