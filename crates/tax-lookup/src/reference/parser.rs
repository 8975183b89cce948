use crate::jurisdiction::domain::{JurisdictionLayer, LiquorCategory, StateCode};
use crate::jurisdiction::suggestion::DepositTier;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use super::ReferenceDataError;

pub(crate) fn parse_rows<T: DeserializeOwned>(
    table: &'static str,
    text: &str,
) -> Result<Vec<T>, ReferenceDataError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();

    for record in csv_reader.deserialize::<T>() {
        rows.push(record.map_err(|source| ReferenceDataError::Csv { table, source })?);
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
pub(crate) struct StateRow {
    pub(crate) code: StateCode,
    pub(crate) name: String,
    pub(crate) rate: f64,
    pub(crate) has_local_tax: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PrefixRow {
    pub(crate) prefix: String,
    pub(crate) state_code: StateCode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverrideRow {
    pub(crate) zip: String,
    pub(crate) city: String,
    pub(crate) local_rate: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BreakdownRow {
    pub(crate) zip: String,
    pub(crate) state_code: StateCode,
    pub(crate) municipality: String,
    pub(crate) municipality_rate: f64,
    pub(crate) transit_rate: f64,
    pub(crate) county: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CountyRow {
    pub(crate) state_code: StateCode,
    pub(crate) county: String,
    pub(crate) rate: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DefaultRow {
    pub(crate) state_code: StateCode,
    pub(crate) rate: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleRow {
    pub(crate) state_code: StateCode,
    pub(crate) grocery_rate: f64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) designated_county: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) designated_city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverlayRow {
    pub(crate) state_code: StateCode,
    pub(crate) category: LiquorCategory,
    pub(crate) layer: JurisdictionLayer,
    pub(crate) retail_percent: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DepositRow {
    pub(crate) state_code: StateCode,
    pub(crate) tier: DepositTier,
    pub(crate) label: String,
    pub(crate) amount: f64,
    pub(crate) containers: String,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
