use super::domain::{round_rate, JurisdictionLayer, LiquorCategory, StateCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which local jurisdictions in a state have their own alcohol overlays, and the reduced
/// statutory rate that replaces the state base rate for qualifying groceries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySchedule {
    pub state_code: StateCode,
    pub grocery_rate: f64,
    pub designated_county: Option<String>,
    pub designated_city: Option<String>,
}

impl OverlaySchedule {
    fn county_matches(&self, county: &str) -> bool {
        self.designated_county
            .as_deref()
            .is_some_and(|designated| designated.eq_ignore_ascii_case(county))
    }

    fn city_matches(&self, city: &str) -> bool {
        self.designated_city
            .as_deref()
            .is_some_and(|designated| designated.eq_ignore_ascii_case(city))
    }
}

/// Retail-percentage excise overlays keyed by state, category and layer.
#[derive(Debug, Clone, Default)]
pub struct ExciseOverlayTable {
    schedules: HashMap<StateCode, OverlaySchedule>,
    overlays: HashMap<(StateCode, LiquorCategory, JurisdictionLayer), f64>,
}

impl ExciseOverlayTable {
    pub(crate) fn new(
        schedules: HashMap<StateCode, OverlaySchedule>,
        overlays: HashMap<(StateCode, LiquorCategory, JurisdictionLayer), f64>,
    ) -> Self {
        Self {
            schedules,
            overlays,
        }
    }

    pub fn schedule(&self, state: &StateCode) -> Option<&OverlaySchedule> {
        self.schedules.get(state)
    }

    pub fn schedules(&self) -> impl Iterator<Item = &OverlaySchedule> {
        self.schedules.values()
    }

    /// Missing rows mean "no overlay at this layer".
    pub fn overlay(
        &self,
        state: &StateCode,
        category: LiquorCategory,
        layer: JurisdictionLayer,
    ) -> f64 {
        self.overlays
            .get(&(state.clone(), category, layer))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn entries(
        &self,
    ) -> impl Iterator<Item = (&StateCode, LiquorCategory, JurisdictionLayer, f64)> {
        self.overlays
            .iter()
            .map(|((state, category, layer), rate)| (state, *category, *layer, *rate))
    }
}

/// Effective rates per product category. Serialized with the field names the settings
/// form reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRates {
    pub general: f64,
    pub grocery: f64,
    pub liquor_spirits: f64,
    pub liquor_wine: f64,
    pub liquor_beer: f64,
    pub tobacco: f64,
}

impl CategoryRates {
    pub fn liquor(&self, category: LiquorCategory) -> f64 {
        match category {
            LiquorCategory::Spirits => self.liquor_spirits,
            LiquorCategory::Wine => self.liquor_wine,
            LiquorCategory::Beer => self.liquor_beer,
        }
    }
}

/// Municipality and county of the composite breakdown, when one was used.
pub(crate) struct LocalJurisdiction<'a> {
    pub(crate) municipality: &'a str,
    pub(crate) county: &'a str,
}

/// Layers the overlays onto unrounded general figures and rounds each category once.
pub(crate) fn category_rates(
    table: &ExciseOverlayTable,
    schedule: &OverlaySchedule,
    combined: f64,
    local: f64,
    jurisdiction: Option<&LocalJurisdiction<'_>>,
) -> CategoryRates {
    let in_county = jurisdiction.is_some_and(|local| schedule.county_matches(local.county));
    let in_city = jurisdiction.is_some_and(|local| schedule.city_matches(local.municipality));

    let liquor = |category: LiquorCategory| {
        let mut rate =
            combined + table.overlay(&schedule.state_code, category, JurisdictionLayer::State);
        if in_county {
            rate += table.overlay(&schedule.state_code, category, JurisdictionLayer::County);
        }
        if in_city {
            rate += table.overlay(&schedule.state_code, category, JurisdictionLayer::City);
        }
        round_rate(rate, 2)
    };

    CategoryRates {
        general: round_rate(combined, 2),
        grocery: round_rate(schedule.grocery_rate + local, 2),
        liquor_spirits: liquor(LiquorCategory::Spirits),
        liquor_wine: liquor(LiquorCategory::Wine),
        liquor_beer: liquor(LiquorCategory::Beer),
        // Tobacco excise is already in the wholesale price.
        tobacco: round_rate(combined, 2),
    }
}
