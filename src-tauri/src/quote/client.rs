use serde::{Deserialize, Serialize};

/// Read-only view of a quote request/lead owned by the quotes list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRef {
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub cargo_details: CargoDetails,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CargoDetails {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
}

impl ClientRef {
    /// Business name when present, otherwise the contact person.
    pub fn display_name(&self) -> &str {
        self.business_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.contact_person.trim())
    }
}

pub(crate) fn non_empty(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}
