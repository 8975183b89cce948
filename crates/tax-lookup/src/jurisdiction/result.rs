use super::overlay::CategoryRates;
use serde::{Serialize, Serializer};

/// Confidence signal attached to every result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disclaimer {
    /// ZIP prefix not in the index.
    Unrecognized,
    /// Local figure came from a per-ZIP record.
    DataBased,
    /// Local figure is a statistical default or the state levies none.
    Estimated,
}

impl Disclaimer {
    pub const fn message(self) -> &'static str {
        match self {
            Self::Unrecognized => {
                "ZIP code not recognized. Please verify and set tax rate manually."
            }
            Self::DataBased => {
                "Tax rate based on state and local data. Verify with your tax authority."
            }
            Self::Estimated => {
                "Local tax estimated. Please verify with your local tax authority for exact rate."
            }
        }
    }
}

impl Serialize for Disclaimer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

/// Layered rate suggestion for one ZIP. Optional fields are present only when the value
/// took part in the resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRateResult {
    pub zip: String,
    pub state: String,
    pub state_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    pub state_tax_rate: f64,
    pub local_tax_rate: f64,
    #[serde(rename = "villageTax", skip_serializing_if = "Option::is_none")]
    pub municipality_tax: Option<f64>,
    #[serde(rename = "rtaTax", skip_serializing_if = "Option::is_none")]
    pub transit_tax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county_tax: Option<f64>,
    pub combined_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_rates: Option<CategoryRates>,
    pub disclaimer: Disclaimer,
}

impl TaxRateResult {
    pub(crate) fn unrecognized(zip: &str) -> Self {
        Self {
            zip: zip.to_string(),
            state: "Unknown".to_string(),
            state_code: String::new(),
            city: None,
            county: None,
            state_tax_rate: 0.0,
            local_tax_rate: 0.0,
            municipality_tax: None,
            transit_tax: None,
            county_tax: None,
            combined_rate: 0.0,
            category_rates: None,
            disclaimer: Disclaimer::Unrecognized,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.disclaimer != Disclaimer::Unrecognized
    }

    /// Sum of the three composite components, when the ZIP used a breakdown.
    pub fn breakdown_total(&self) -> Option<f64> {
        Some(self.municipality_tax? + self.transit_tax? + self.county_tax?)
    }
}
