//! ZIP-code driven sales-tax rate resolution.
//!
//! A ZIP resolves to a state through its three-digit prefix, the state's base rate is
//! layered with a local component chosen by the state's composition strategies, and
//! states with excise schedules also get per-category rates for regulated products.

pub mod composition;
pub mod domain;
pub mod overlay;
pub mod resolver;
pub mod result;
pub mod router;
pub mod suggestion;
pub mod tables;

pub use composition::{LocalTaxStrategy, StrategyRegistry};
pub use domain::{round_rate, JurisdictionLayer, LiquorCategory, StateCode, ZipCode, ZipCodeError};
pub use overlay::{CategoryRates, ExciseOverlayTable, OverlaySchedule};
pub use resolver::RateResolver;
pub use result::{Disclaimer, TaxRateResult};
pub use router::lookup_router;
pub use suggestion::{BottleDeposit, BottleDepositTable, DepositTier, SettingsSuggestion};
pub use tables::{
    JurisdictionIndex, LocalOverride, LocalOverrideTable, LocalRateDefaults, RegionalBreakdown,
    RegionalRuleSet, StateProfileTable, StateTaxProfile, GLOBAL_LOCAL_DEFAULT,
};
