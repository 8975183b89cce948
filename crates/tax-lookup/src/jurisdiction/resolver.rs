use super::composition::{LocalComposition, LocalSources, StrategyRegistry};
use super::domain::{round_rate, ZipCode};
use super::overlay::{category_rates, LocalJurisdiction};
use super::result::{Disclaimer, TaxRateResult};
use super::suggestion::SettingsSuggestion;
use crate::reference::{ReferenceData, ReferenceDataError};
use tracing::{debug, error};

/// Turns a ZIP into a layered rate suggestion. Holds only immutable data, so one instance
/// is shared by every caller.
#[derive(Debug, Clone)]
pub struct RateResolver {
    data: ReferenceData,
    strategies: StrategyRegistry,
}

impl RateResolver {
    pub fn new(data: ReferenceData) -> Self {
        let strategies = StrategyRegistry::derive(data.profiles().iter(), data.regional());
        Self { data, strategies }
    }

    pub fn with_strategies(data: ReferenceData, strategies: StrategyRegistry) -> Self {
        Self { data, strategies }
    }

    /// Resolver over the tables compiled into the crate.
    pub fn embedded() -> Result<Self, ReferenceDataError> {
        ReferenceData::embedded().map(Self::new)
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.data
    }

    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    pub fn resolve(&self, zip: &ZipCode) -> TaxRateResult {
        let Some(state_code) = self.data.index().resolve_state(zip) else {
            debug!(%zip, "zip prefix not indexed");
            return TaxRateResult::unrecognized(zip.as_str());
        };

        let Some(profile) = self.data.profiles().get(state_code) else {
            // Load-time validation rejects this; reaching it means the tables were
            // assembled without going through `ReferenceData`.
            error!(%zip, state = %state_code, "indexed state has no tax profile");
            return TaxRateResult::unrecognized(zip.as_str());
        };

        let sources = LocalSources {
            regional: self.data.regional(),
            overrides: self.data.overrides(),
            defaults: self.data.defaults(),
        };
        let composition = self
            .strategies
            .chain(state_code)
            .iter()
            .find_map(|strategy| strategy.compose(zip, state_code, &sources))
            .unwrap_or(LocalComposition::NoLocalTax);

        let local = composition.rate();
        let combined = profile.rate + local;

        let jurisdiction = match &composition {
            LocalComposition::Composite {
                municipality,
                county,
                ..
            } => Some(LocalJurisdiction {
                municipality: municipality.as_str(),
                county: county.as_str(),
            }),
            _ => None,
        };
        let categories = self.data.overlays().schedule(state_code).map(|schedule| {
            category_rates(
                self.data.overlays(),
                schedule,
                combined,
                local,
                jurisdiction.as_ref(),
            )
        });

        let disclaimer = if composition.is_exact() {
            Disclaimer::DataBased
        } else {
            Disclaimer::Estimated
        };

        debug!(
            %zip,
            state = %state_code,
            tier = composition.label(),
            local,
            combined,
            "resolved tax rate"
        );

        let mut result = TaxRateResult {
            zip: zip.as_str().to_string(),
            state: profile.name.clone(),
            state_code: state_code.as_str().to_string(),
            city: None,
            county: None,
            state_tax_rate: round_rate(profile.rate, 3),
            local_tax_rate: round_rate(local, 2),
            municipality_tax: None,
            transit_tax: None,
            county_tax: None,
            combined_rate: round_rate(combined, 2),
            category_rates: categories,
            disclaimer,
        };

        match composition {
            LocalComposition::Composite {
                municipality,
                municipality_rate,
                transit_rate,
                county,
                county_rate,
            } => {
                result.city = Some(municipality);
                result.county = Some(county);
                result.municipality_tax = Some(round_rate(municipality_rate, 2));
                result.transit_tax = Some(round_rate(transit_rate, 2));
                result.county_tax = Some(round_rate(county_rate, 2));
            }
            LocalComposition::Flat { city, .. } => result.city = Some(city),
            LocalComposition::Estimated { .. } | LocalComposition::NoLocalTax => {}
        }

        result
    }

    /// Resolves and maps the result onto the settings form's fields.
    pub fn suggest(&self, zip: &ZipCode) -> SettingsSuggestion {
        let result = self.resolve(zip);
        SettingsSuggestion::from_result(&result, self.data.deposits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jurisdiction::composition::LocalTaxStrategy;
    use crate::jurisdiction::domain::StateCode;
    use crate::reference::TableSources;

    const STATES: &str = "code,name,rate,has_local_tax\n\
        IL,Illinois,6.25,true\n\
        DE,Delaware,0,false\n\
        MN,Minnesota,6.875,true\n";
    const PREFIXES: &str = "prefix,state_code\n600,IL\n606,IL\n197,DE\n198,DE\n199,DE\n554,MN\n";
    const OVERRIDES: &str = "zip,city,local_rate\n60601,Chicago,4.50\n19801,Wilmington,0.50\n";
    const BREAKDOWNS: &str =
        "zip,state_code,municipality,municipality_rate,transit_rate,county\n\
        60601,IL,Chicago,1.25,1.00,Cook\n\
        60060,IL,Mundelein,0.50,1.00,Lake\n";
    const COUNTIES: &str = "state_code,county,rate\nIL,Cook,1.75\n";
    const DEFAULTS: &str = "state_code,rate\nIL,2.50\n";
    const SCHEDULES: &str =
        "state_code,grocery_rate,designated_county,designated_city\nIL,1.00,Cook,Chicago\n";
    const OVERLAYS: &str = "state_code,category,layer,retail_percent\n\
        IL,spirits,state,18.00\nIL,wine,state,5.00\nIL,beer,state,1.50\n\
        IL,spirits,county,5.50\nIL,wine,county,1.00\nIL,beer,county,0.50\n\
        IL,spirits,city,6.00\nIL,wine,city,1.25\nIL,beer,city,2.00\n";
    const DEPOSITS: &str = "state_code,tier,label,amount,containers\n";

    fn fixture_sources() -> TableSources<'static> {
        TableSources {
            states: STATES,
            zip_prefixes: PREFIXES,
            local_overrides: OVERRIDES,
            regional_breakdowns: BREAKDOWNS,
            county_rates: COUNTIES,
            local_defaults: DEFAULTS,
            overlay_schedules: SCHEDULES,
            excise_overlays: OVERLAYS,
            bottle_deposits: DEPOSITS,
        }
    }

    fn resolver() -> RateResolver {
        RateResolver::new(ReferenceData::from_sources(&fixture_sources()).expect("fixture loads"))
    }

    fn zip(value: &str) -> ZipCode {
        ZipCode::parse(value).expect("valid zip")
    }

    #[test]
    fn breakdown_wins_over_flat_override() {
        let result = resolver().resolve(&zip("60601"));

        assert_eq!(result.local_tax_rate, 4.0);
        assert_eq!(result.municipality_tax, Some(1.25));
        assert_eq!(result.transit_tax, Some(1.0));
        assert_eq!(result.county_tax, Some(1.75));
        assert_eq!(result.combined_rate, 10.25);
        assert_eq!(result.disclaimer, Disclaimer::DataBased);
    }

    #[test]
    fn unknown_county_in_breakdown_degrades_to_zero() {
        let result = resolver().resolve(&zip("60060"));

        assert_eq!(result.county.as_deref(), Some("Lake"));
        assert_eq!(result.county_tax, Some(0.0));
        assert_eq!(result.local_tax_rate, 1.5);
        assert_eq!(result.disclaimer, Disclaimer::DataBased);
    }

    #[test]
    fn override_applies_even_without_local_tax_flag() {
        let result = resolver().resolve(&zip("19801"));

        assert_eq!(result.state_code, "DE");
        assert_eq!(result.local_tax_rate, 0.5);
        assert_eq!(result.city.as_deref(), Some("Wilmington"));
        assert_eq!(result.county, None);
        assert_eq!(result.disclaimer, Disclaimer::DataBased);
    }

    #[test]
    fn no_local_tax_state_without_override_is_exactly_zero() {
        let result = resolver().resolve(&zip("19901"));

        assert_eq!(result.local_tax_rate, 0.0);
        assert_eq!(result.combined_rate, 0.0);
        assert_eq!(result.city, None);
        assert_eq!(result.disclaimer, Disclaimer::Estimated);
    }

    #[test]
    fn state_rate_keeps_three_decimals() {
        let result = resolver().resolve(&zip("55401"));

        assert_eq!(result.state_tax_rate, 6.875);
        assert_eq!(result.local_tax_rate, 1.5);
        assert_eq!(result.combined_rate, 8.38);
        assert!(result.category_rates.is_none());
    }

    #[test]
    fn overlay_state_without_breakdown_gets_state_overlays_only() {
        let result = resolver().resolve(&zip("60612"));

        assert_eq!(result.local_tax_rate, 2.5);
        assert_eq!(result.combined_rate, 8.75);
        let rates = result.category_rates.expect("illinois gets category rates");
        assert_eq!(rates.liquor_spirits, 26.75);
        assert_eq!(rates.liquor_wine, 13.75);
        assert_eq!(rates.liquor_beer, 10.25);
        assert_eq!(rates.grocery, 3.5);
        assert_eq!(rates.tobacco, 8.75);
    }

    #[test]
    fn registered_chain_replaces_derived_one() {
        let data = ReferenceData::from_sources(&fixture_sources()).expect("fixture loads");
        let mut strategies = StrategyRegistry::derive(data.profiles().iter(), data.regional());
        strategies.register(StateCode::new("IL"), vec![LocalTaxStrategy::NoLocalTax]);
        let resolver = RateResolver::with_strategies(data, strategies);

        let result = resolver.resolve(&zip("60601"));
        assert_eq!(result.local_tax_rate, 0.0);
        assert_eq!(result.combined_rate, 6.25);
        assert_eq!(result.municipality_tax, None);
        assert_eq!(result.disclaimer, Disclaimer::Estimated);
    }
}
