//! Immutable lookup tables. Built once by [`crate::reference`] and only read afterwards.

use super::domain::{StateCode, ZipCode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// ZIP prefix to state mapping.
#[derive(Debug, Clone, Default)]
pub struct JurisdictionIndex {
    prefixes: HashMap<String, StateCode>,
}

impl JurisdictionIndex {
    pub(crate) fn new(prefixes: HashMap<String, StateCode>) -> Self {
        Self { prefixes }
    }

    /// `None` is an expected answer for territories, military codes and unused prefixes.
    pub fn resolve_state(&self, zip: &ZipCode) -> Option<&StateCode> {
        self.prefixes.get(zip.prefix())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &StateCode)> {
        self.prefixes
            .iter()
            .map(|(prefix, state)| (prefix.as_str(), state))
    }

    pub fn states(&self) -> BTreeSet<&StateCode> {
        self.prefixes.values().collect()
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// General sales-tax profile for one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTaxProfile {
    pub code: StateCode,
    pub name: String,
    pub rate: f64,
    pub has_local_tax: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StateProfileTable {
    profiles: HashMap<StateCode, StateTaxProfile>,
}

impl StateProfileTable {
    pub(crate) fn new(profiles: HashMap<StateCode, StateTaxProfile>) -> Self {
        Self { profiles }
    }

    pub fn get(&self, code: &StateCode) -> Option<&StateTaxProfile> {
        self.profiles.get(code)
    }

    pub fn contains(&self, code: &StateCode) -> bool {
        self.profiles.contains_key(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateTaxProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Known flat local rate for a single ZIP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalOverride {
    pub zip: String,
    pub city: String,
    pub local_rate: f64,
}

#[derive(Debug, Clone, Default)]
pub struct LocalOverrideTable {
    overrides: HashMap<String, LocalOverride>,
}

impl LocalOverrideTable {
    pub(crate) fn new(overrides: HashMap<String, LocalOverride>) -> Self {
        Self { overrides }
    }

    pub fn get(&self, zip: &ZipCode) -> Option<&LocalOverride> {
        self.overrides.get(zip.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocalOverride> {
        self.overrides.values()
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// Local tax for a ZIP whose state composes it from municipality, transit district and
/// county layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalBreakdown {
    pub zip: String,
    pub state_code: StateCode,
    pub municipality: String,
    pub municipality_rate: f64,
    pub transit_rate: f64,
    pub county: String,
}

/// Composite-jurisdiction data: per-ZIP breakdowns plus the county rates they refer to
/// by name.
#[derive(Debug, Clone, Default)]
pub struct RegionalRuleSet {
    breakdowns: HashMap<String, RegionalBreakdown>,
    county_rates: HashMap<(StateCode, String), f64>,
}

impl RegionalRuleSet {
    pub(crate) fn new(
        breakdowns: HashMap<String, RegionalBreakdown>,
        county_rates: HashMap<(StateCode, String), f64>,
    ) -> Self {
        Self {
            breakdowns,
            county_rates,
        }
    }

    pub fn breakdown(&self, zip: &ZipCode) -> Option<&RegionalBreakdown> {
        self.breakdowns.get(zip.as_str())
    }

    /// County names are matched case-insensitively within the state.
    pub fn county_rate(&self, state: &StateCode, county: &str) -> Option<f64> {
        self.county_rates
            .get(&(state.clone(), county.to_string()))
            .copied()
            .or_else(|| {
                self.county_rates
                    .iter()
                    .find(|((code, name), _)| code == state && name.eq_ignore_ascii_case(county))
                    .map(|(_, rate)| *rate)
            })
    }

    /// States with at least one breakdown; these get the composite strategy.
    pub fn composite_states(&self) -> BTreeSet<&StateCode> {
        self.breakdowns
            .values()
            .map(|breakdown| &breakdown.state_code)
            .collect()
    }

    pub fn breakdowns(&self) -> impl Iterator<Item = &RegionalBreakdown> {
        self.breakdowns.values()
    }

    pub fn county_rates(&self) -> impl Iterator<Item = (&StateCode, &str, f64)> {
        self.county_rates
            .iter()
            .map(|((state, county), rate)| (state, county.as_str(), *rate))
    }
}

/// Applied when a state levies local tax but nothing more specific is known for a ZIP.
pub const GLOBAL_LOCAL_DEFAULT: f64 = 1.50;

/// Published average local rates used for estimates.
#[derive(Debug, Clone)]
pub struct LocalRateDefaults {
    per_state: HashMap<StateCode, f64>,
    global: f64,
}

impl Default for LocalRateDefaults {
    fn default() -> Self {
        Self {
            per_state: HashMap::new(),
            global: GLOBAL_LOCAL_DEFAULT,
        }
    }
}

impl LocalRateDefaults {
    pub(crate) fn new(per_state: HashMap<StateCode, f64>) -> Self {
        Self {
            per_state,
            global: GLOBAL_LOCAL_DEFAULT,
        }
    }

    pub fn for_state(&self, state: &StateCode) -> f64 {
        self.per_state.get(state).copied().unwrap_or(self.global)
    }

    pub fn configured(&self) -> impl Iterator<Item = (&StateCode, f64)> {
        self.per_state.iter().map(|(state, rate)| (state, *rate))
    }
}
