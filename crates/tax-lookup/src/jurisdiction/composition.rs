//! Local-tax composition strategies.
//!
//! Every state gets an ordered chain of strategies and the first one that produces a
//! figure wins. The chain is derived from the reference data, so adding a state whose
//! local tax is a sum of sub-layers only needs breakdown rows and county rates.

use super::domain::{StateCode, ZipCode};
use super::tables::{LocalOverrideTable, LocalRateDefaults, RegionalRuleSet, StateTaxProfile};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalTaxStrategy {
    /// Municipality + transit district + county from a per-ZIP breakdown.
    CompositeBreakdown,
    /// Flat per-ZIP override.
    FlatOverride,
    /// Per-state published average, or the global default.
    StatisticalDefault,
    /// State does not levy local tax.
    NoLocalTax,
}

impl LocalTaxStrategy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::CompositeBreakdown => "composite_breakdown",
            Self::FlatOverride => "flat_override",
            Self::StatisticalDefault => "statistical_default",
            Self::NoLocalTax => "no_local_tax",
        }
    }

    pub(crate) fn compose(
        self,
        zip: &ZipCode,
        state: &StateCode,
        sources: &LocalSources<'_>,
    ) -> Option<LocalComposition> {
        match self {
            Self::CompositeBreakdown => {
                let breakdown = sources
                    .regional
                    .breakdown(zip)
                    .filter(|breakdown| &breakdown.state_code == state)?;
                // An unknown county contributes nothing rather than failing the lookup.
                let county_rate = sources
                    .regional
                    .county_rate(state, &breakdown.county)
                    .unwrap_or(0.0);

                Some(LocalComposition::Composite {
                    municipality: breakdown.municipality.clone(),
                    municipality_rate: breakdown.municipality_rate,
                    transit_rate: breakdown.transit_rate,
                    county: breakdown.county.clone(),
                    county_rate,
                })
            }
            Self::FlatOverride => sources.overrides.get(zip).map(|entry| LocalComposition::Flat {
                city: entry.city.clone(),
                rate: entry.local_rate,
            }),
            Self::StatisticalDefault => Some(LocalComposition::Estimated {
                rate: sources.defaults.for_state(state),
            }),
            Self::NoLocalTax => Some(LocalComposition::NoLocalTax),
        }
    }
}

/// Borrowed view of the tables the strategies read.
pub(crate) struct LocalSources<'a> {
    pub(crate) regional: &'a RegionalRuleSet,
    pub(crate) overrides: &'a LocalOverrideTable,
    pub(crate) defaults: &'a LocalRateDefaults,
}

/// Outcome of the local tier, kept unrounded until the result is assembled.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LocalComposition {
    Composite {
        municipality: String,
        municipality_rate: f64,
        transit_rate: f64,
        county: String,
        county_rate: f64,
    },
    Flat {
        city: String,
        rate: f64,
    },
    Estimated {
        rate: f64,
    },
    NoLocalTax,
}

impl LocalComposition {
    pub(crate) fn rate(&self) -> f64 {
        match self {
            Self::Composite {
                municipality_rate,
                transit_rate,
                county_rate,
                ..
            } => municipality_rate + transit_rate + county_rate,
            Self::Flat { rate, .. } | Self::Estimated { rate } => *rate,
            Self::NoLocalTax => 0.0,
        }
    }

    /// True when the figure came from a per-ZIP record rather than an average.
    pub(crate) fn is_exact(&self) -> bool {
        matches!(self, Self::Composite { .. } | Self::Flat { .. })
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Composite { .. } => LocalTaxStrategy::CompositeBreakdown.label(),
            Self::Flat { .. } => LocalTaxStrategy::FlatOverride.label(),
            Self::Estimated { .. } => LocalTaxStrategy::StatisticalDefault.label(),
            Self::NoLocalTax => LocalTaxStrategy::NoLocalTax.label(),
        }
    }
}

/// Strategy chain per state.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    chains: HashMap<StateCode, Vec<LocalTaxStrategy>>,
}

impl StrategyRegistry {
    /// Builds the default chains: composite first for states that have breakdown data,
    /// then the flat override, then the estimate (or nothing when the state has no local
    /// tax).
    pub fn derive<'a>(
        profiles: impl IntoIterator<Item = &'a StateTaxProfile>,
        regional: &RegionalRuleSet,
    ) -> Self {
        let composite_states = regional.composite_states();
        let mut chains = HashMap::new();

        for profile in profiles {
            let mut chain = Vec::with_capacity(3);
            if composite_states.contains(&profile.code) {
                chain.push(LocalTaxStrategy::CompositeBreakdown);
            }
            chain.push(LocalTaxStrategy::FlatOverride);
            chain.push(if profile.has_local_tax {
                LocalTaxStrategy::StatisticalDefault
            } else {
                LocalTaxStrategy::NoLocalTax
            });
            chains.insert(profile.code.clone(), chain);
        }

        Self { chains }
    }

    /// Replaces the chain for one state.
    pub fn register(&mut self, state: StateCode, chain: Vec<LocalTaxStrategy>) {
        self.chains.insert(state, chain);
    }

    pub fn chain(&self, state: &StateCode) -> &[LocalTaxStrategy] {
        self.chains.get(state).map(Vec::as_slice).unwrap_or(&[])
    }
}
