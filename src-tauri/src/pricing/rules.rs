//! Static pricing configuration: service templates, surcharge table and the
//! moving-service catalog.

use serde::{Deserialize, Serialize};

pub const WEIGHT_RATE_PER_KG: f64 = 200.0;
pub const VOLUME_RATE_PER_M3: f64 = 150.0;
pub const QUANTITY_RATE_PER_UNIT: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    #[default]
    Freight,
    Moving,
    Courier,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTemplate {
    pub id: ServiceType,
    /// Price per kilometre of distance.
    pub base_rate: f64,
    pub multiplier: f64,
}

pub const SERVICE_TEMPLATES: [ServiceTemplate; 3] = [
    ServiceTemplate {
        id: ServiceType::Freight,
        base_rate: 1200.0,
        multiplier: 1.2,
    },
    ServiceTemplate {
        id: ServiceType::Moving,
        base_rate: 1500.0,
        multiplier: 1.5,
    },
    ServiceTemplate {
        id: ServiceType::Courier,
        base_rate: 800.0,
        multiplier: 1.0,
    },
];

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [ServiceType::Freight, ServiceType::Moving, ServiceType::Courier];

    pub fn template(self) -> &'static ServiceTemplate {
        match self {
            ServiceType::Freight => &SERVICE_TEMPLATES[0],
            ServiceType::Moving => &SERVICE_TEMPLATES[1],
            ServiceType::Courier => &SERVICE_TEMPLATES[2],
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ServiceType::Freight => "freight",
            ServiceType::Moving => "moving",
            ServiceType::Courier => "courier",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "freight" => Some(ServiceType::Freight),
            "moving" => Some(ServiceType::Moving),
            "courier" => Some(ServiceType::Courier),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpecialHandling {
    #[default]
    None,
    Fragile,
    Refrigerated,
    Express,
    Oversized,
}

impl SpecialHandling {
    pub fn surcharge(self) -> f64 {
        match self {
            SpecialHandling::None => 0.0,
            SpecialHandling::Fragile => 50_000.0,
            SpecialHandling::Refrigerated => 75_000.0,
            SpecialHandling::Express => 100_000.0,
            SpecialHandling::Oversized => 125_000.0,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            SpecialHandling::None => "none",
            SpecialHandling::Fragile => "fragile",
            SpecialHandling::Refrigerated => "refrigerated",
            SpecialHandling::Express => "express",
            SpecialHandling::Oversized => "oversized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Insurance {
    #[default]
    None,
    Basic,
    Premium,
    Full,
}

impl Insurance {
    pub fn surcharge(self) -> f64 {
        match self {
            Insurance::None => 0.0,
            Insurance::Basic => 25_000.0,
            Insurance::Premium => 50_000.0,
            Insurance::Full => 100_000.0,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Insurance::None => "none",
            Insurance::Basic => "basic",
            Insurance::Premium => "premium",
            Insurance::Full => "full",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Normal,
    Urgent,
    SameDay,
}

impl Urgency {
    pub fn surcharge(self) -> f64 {
        match self {
            Urgency::Normal => 0.0,
            Urgency::Urgent => 75_000.0,
            Urgency::SameDay => 150_000.0,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Urgency::Normal => "normal",
            Urgency::Urgent => "urgent",
            Urgency::SameDay => "same_day",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovingCatalogEntry {
    pub key: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
}

/// Line categories offered for the itemized moving quotation, in display order.
pub const MOVING_CATALOG: [MovingCatalogEntry; 13] = [
    MovingCatalogEntry { key: "boxes_small", name: "Packing boxes (small)", unit: "pcs" },
    MovingCatalogEntry { key: "boxes_medium", name: "Packing boxes (medium)", unit: "pcs" },
    MovingCatalogEntry { key: "boxes_large", name: "Packing boxes (large)", unit: "pcs" },
    MovingCatalogEntry { key: "wardrobe_boxes", name: "Wardrobe boxes", unit: "pcs" },
    MovingCatalogEntry { key: "bubble_wrap", name: "Bubble wrap", unit: "roll" },
    MovingCatalogEntry { key: "stretch_wrap", name: "Stretch wrap", unit: "roll" },
    MovingCatalogEntry { key: "packing_tape", name: "Packing tape", unit: "roll" },
    MovingCatalogEntry { key: "packing_labor", name: "Packing labor", unit: "worker" },
    MovingCatalogEntry { key: "loading_labor", name: "Loading and unloading labor", unit: "worker" },
    MovingCatalogEntry { key: "furniture_assembly", name: "Furniture dismantling and assembly", unit: "item" },
    MovingCatalogEntry { key: "transport", name: "Transport (truck trips)", unit: "trip" },
    MovingCatalogEntry { key: "fuel", name: "Fuel", unit: "litre" },
    MovingCatalogEntry { key: "storage", name: "Storage", unit: "day" },
];

pub fn moving_catalog_index(key: &str) -> Option<usize> {
    MOVING_CATALOG.iter().position(|e| e.key == key)
}
