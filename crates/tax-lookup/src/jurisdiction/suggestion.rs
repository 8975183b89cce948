//! Mapping from a resolver result onto the editable tax settings form.
//!
//! Everything here is a suggestion: the operator reviews, edits and saves it through the
//! settings service, which owns persistence.

use super::domain::{round_rate, StateCode};
use super::result::TaxRateResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_SMALL_DEPOSIT: f64 = 0.05;
pub const DEFAULT_LARGE_DEPOSIT: f64 = 0.10;

/// Container size class a deposit amount applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositTier {
    Small,
    Large,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleDeposit {
    pub tier: DepositTier,
    pub label: String,
    pub amount: f64,
    pub containers: String,
}

/// Container-deposit schedules for states with bottle bills.
#[derive(Debug, Clone, Default)]
pub struct BottleDepositTable {
    by_state: HashMap<StateCode, Vec<BottleDeposit>>,
}

impl BottleDepositTable {
    pub(crate) fn new(by_state: HashMap<StateCode, Vec<BottleDeposit>>) -> Self {
        Self { by_state }
    }

    pub fn for_state(&self, state: &StateCode) -> &[BottleDeposit] {
        self.by_state.get(state).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn states(&self) -> impl Iterator<Item = &StateCode> {
        self.by_state.keys()
    }

    /// An `all` row answers for either size when the state has no row for that tier.
    fn amount(&self, state: &StateCode, tier: DepositTier) -> Option<f64> {
        let deposits = self.for_state(state);
        deposits
            .iter()
            .find(|deposit| deposit.tier == tier)
            .or_else(|| deposits.iter().find(|deposit| deposit.tier == DepositTier::All))
            .map(|deposit| deposit.amount)
    }
}

/// Pre-filled values for the tax settings form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSuggestion {
    pub zip_code: String,
    pub state_code: String,
    pub city: String,
    pub county: String,
    pub state_tax_rate: f64,
    pub county_tax_rate: f64,
    pub city_tax_rate: f64,
    pub special_district_rate: f64,
    pub bottle_deposit_enabled: bool,
    pub bottle_deposit_small: f64,
    pub bottle_deposit_large: f64,
    pub alcohol_tax_rate: f64,
    pub tobacco_tax_rate: f64,
    pub grocery_tax_rate: f64,
    pub prepared_food_tax_rate: f64,
    pub disclaimer: String,
}

impl SettingsSuggestion {
    pub fn from_result(result: &TaxRateResult, deposits: &BottleDepositTable) -> Self {
        // Without a breakdown the whole local figure goes in the city slot so the form's
        // component sum still equals the combined rate.
        let (county_tax_rate, city_tax_rate, special_district_rate) =
            match (result.county_tax, result.municipality_tax, result.transit_tax) {
                (Some(county), Some(municipality), Some(transit)) => {
                    (county, municipality, transit)
                }
                _ => (0.0, result.local_tax_rate, 0.0),
            };

        let state = StateCode::new(&result.state_code);
        let small = deposits.amount(&state, DepositTier::Small);
        let large = deposits.amount(&state, DepositTier::Large);
        let categories = result.category_rates.as_ref();

        Self {
            zip_code: result.zip.clone(),
            state_code: result.state_code.clone(),
            city: result.city.clone().unwrap_or_default(),
            county: result.county.clone().unwrap_or_default(),
            state_tax_rate: result.state_tax_rate,
            county_tax_rate,
            city_tax_rate,
            special_district_rate,
            bottle_deposit_enabled: !deposits.for_state(&state).is_empty(),
            bottle_deposit_small: small.unwrap_or(DEFAULT_SMALL_DEPOSIT),
            bottle_deposit_large: large.unwrap_or(DEFAULT_LARGE_DEPOSIT),
            alcohol_tax_rate: categories
                .map(|rates| rates.liquor_spirits)
                .unwrap_or(result.combined_rate),
            tobacco_tax_rate: categories
                .map(|rates| rates.tobacco)
                .unwrap_or(result.combined_rate),
            grocery_tax_rate: categories.map(|rates| rates.grocery).unwrap_or(0.0),
            prepared_food_tax_rate: result.combined_rate,
            disclaimer: result.disclaimer.message().to_string(),
        }
    }

    /// Combined rate as the form displays it: the sum of the four components.
    pub fn combined_rate(&self) -> f64 {
        round_rate(
            self.state_tax_rate
                + self.county_tax_rate
                + self.city_tax_rate
                + self.special_district_rate,
            3,
        )
    }
}
