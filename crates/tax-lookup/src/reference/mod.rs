//! Loading and validation of the rate tables.
//!
//! The tables ship as CSV files under `data/` and are compiled into the crate; a
//! directory with the same file names can replace them at startup. Either way the data is
//! checked for referential completeness once, before any lookup runs.

mod parser;
mod validation;

pub use validation::IntegrityFault;

use crate::config::ReferenceConfig;
use crate::jurisdiction::domain::{JurisdictionLayer, LiquorCategory, StateCode};
use crate::jurisdiction::overlay::{ExciseOverlayTable, OverlaySchedule};
use crate::jurisdiction::suggestion::{BottleDeposit, BottleDepositTable};
use crate::jurisdiction::tables::{
    JurisdictionIndex, LocalOverride, LocalOverrideTable, LocalRateDefaults, RegionalBreakdown,
    RegionalRuleSet, StateProfileTable, StateTaxProfile,
};
use parser::{
    parse_rows, BreakdownRow, CountyRow, DefaultRow, DepositRow, OverlayRow, OverrideRow,
    PrefixRow, ScheduleRow, StateRow,
};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("failed to read rate table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid rows in rate table '{table}': {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Integrity(#[from] IntegrityFault),
}

/// Raw CSV text for every table.
#[derive(Debug, Clone, Copy)]
pub struct TableSources<'a> {
    pub states: &'a str,
    pub zip_prefixes: &'a str,
    pub local_overrides: &'a str,
    pub regional_breakdowns: &'a str,
    pub county_rates: &'a str,
    pub local_defaults: &'a str,
    pub overlay_schedules: &'a str,
    pub excise_overlays: &'a str,
    pub bottle_deposits: &'a str,
}

/// File names looked up when loading from a directory.
pub const TABLE_FILES: [&str; 9] = [
    "states.csv",
    "zip_prefixes.csv",
    "local_overrides.csv",
    "regional_breakdowns.csv",
    "county_rates.csv",
    "local_defaults.csv",
    "overlay_schedules.csv",
    "excise_overlays.csv",
    "bottle_deposits.csv",
];

impl TableSources<'static> {
    pub fn embedded() -> Self {
        Self {
            states: include_str!("../../data/states.csv"),
            zip_prefixes: include_str!("../../data/zip_prefixes.csv"),
            local_overrides: include_str!("../../data/local_overrides.csv"),
            regional_breakdowns: include_str!("../../data/regional_breakdowns.csv"),
            county_rates: include_str!("../../data/county_rates.csv"),
            local_defaults: include_str!("../../data/local_defaults.csv"),
            overlay_schedules: include_str!("../../data/overlay_schedules.csv"),
            excise_overlays: include_str!("../../data/excise_overlays.csv"),
            bottle_deposits: include_str!("../../data/bottle_deposits.csv"),
        }
    }
}

/// Every table the resolver reads.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    index: JurisdictionIndex,
    profiles: StateProfileTable,
    overrides: LocalOverrideTable,
    regional: RegionalRuleSet,
    defaults: LocalRateDefaults,
    overlays: ExciseOverlayTable,
    deposits: BottleDepositTable,
}

impl ReferenceData {
    pub fn embedded() -> Result<Self, ReferenceDataError> {
        Self::from_sources(&TableSources::embedded())
    }

    pub fn load(config: &ReferenceConfig) -> Result<Self, ReferenceDataError> {
        match &config.data_dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::embedded(),
        }
    }

    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ReferenceDataError> {
        let dir = dir.as_ref();
        let mut texts = Vec::with_capacity(TABLE_FILES.len());
        for file in TABLE_FILES {
            let path = dir.join(file);
            let text = std::fs::read_to_string(&path)
                .map_err(|source| ReferenceDataError::Io { path, source })?;
            texts.push(text);
        }

        info!(dir = %dir.display(), "loading rate tables from directory");
        Self::from_sources(&TableSources {
            states: &texts[0],
            zip_prefixes: &texts[1],
            local_overrides: &texts[2],
            regional_breakdowns: &texts[3],
            county_rates: &texts[4],
            local_defaults: &texts[5],
            overlay_schedules: &texts[6],
            excise_overlays: &texts[7],
            bottle_deposits: &texts[8],
        })
    }

    pub fn from_sources(sources: &TableSources<'_>) -> Result<Self, ReferenceDataError> {
        let mut profiles = HashMap::new();
        for row in parse_rows::<StateRow>("states", sources.states)? {
            let profile = StateTaxProfile {
                code: row.code.clone(),
                name: row.name,
                rate: row.rate,
                has_local_tax: row.has_local_tax,
            };
            insert_unique(&mut profiles, "states", row.code, profile)?;
        }

        let mut prefixes = HashMap::new();
        for row in parse_rows::<PrefixRow>("zip_prefixes", sources.zip_prefixes)? {
            insert_unique(&mut prefixes, "zip_prefixes", row.prefix, row.state_code)?;
        }

        let mut overrides = HashMap::new();
        for row in parse_rows::<OverrideRow>("local_overrides", sources.local_overrides)? {
            let entry = LocalOverride {
                zip: row.zip.clone(),
                city: row.city,
                local_rate: row.local_rate,
            };
            insert_unique(&mut overrides, "local_overrides", row.zip, entry)?;
        }

        let mut breakdowns = HashMap::new();
        for row in parse_rows::<BreakdownRow>("regional_breakdowns", sources.regional_breakdowns)?
        {
            let entry = RegionalBreakdown {
                zip: row.zip.clone(),
                state_code: row.state_code,
                municipality: row.municipality,
                municipality_rate: row.municipality_rate,
                transit_rate: row.transit_rate,
                county: row.county,
            };
            insert_unique(&mut breakdowns, "regional_breakdowns", row.zip, entry)?;
        }

        let mut county_rates = HashMap::new();
        for row in parse_rows::<CountyRow>("county_rates", sources.county_rates)? {
            insert_unique(
                &mut county_rates,
                "county_rates",
                (row.state_code, row.county),
                row.rate,
            )?;
        }

        let mut defaults = HashMap::new();
        for row in parse_rows::<DefaultRow>("local_defaults", sources.local_defaults)? {
            insert_unique(&mut defaults, "local_defaults", row.state_code, row.rate)?;
        }

        let mut schedules = HashMap::new();
        for row in parse_rows::<ScheduleRow>("overlay_schedules", sources.overlay_schedules)? {
            let schedule = OverlaySchedule {
                state_code: row.state_code.clone(),
                grocery_rate: row.grocery_rate,
                designated_county: row.designated_county,
                designated_city: row.designated_city,
            };
            insert_unique(&mut schedules, "overlay_schedules", row.state_code, schedule)?;
        }

        let mut overlays: HashMap<(StateCode, LiquorCategory, JurisdictionLayer), f64> =
            HashMap::new();
        for row in parse_rows::<OverlayRow>("excise_overlays", sources.excise_overlays)? {
            insert_unique(
                &mut overlays,
                "excise_overlays",
                (row.state_code, row.category, row.layer),
                row.retail_percent,
            )?;
        }

        let mut deposits: HashMap<StateCode, Vec<BottleDeposit>> = HashMap::new();
        for row in parse_rows::<DepositRow>("bottle_deposits", sources.bottle_deposits)? {
            deposits.entry(row.state_code).or_default().push(BottleDeposit {
                tier: row.tier,
                label: row.label,
                amount: row.amount,
                containers: row.containers,
            });
        }

        let data = Self {
            index: JurisdictionIndex::new(prefixes),
            profiles: StateProfileTable::new(profiles),
            overrides: LocalOverrideTable::new(overrides),
            regional: RegionalRuleSet::new(breakdowns, county_rates),
            defaults: LocalRateDefaults::new(defaults),
            overlays: ExciseOverlayTable::new(schedules, overlays),
            deposits: BottleDepositTable::new(deposits),
        };

        validation::check(&data)?;

        info!(
            states = data.profiles.len(),
            prefixes = data.index.len(),
            overrides = data.overrides.len(),
            composite_states = data.regional.composite_states().len(),
            "rate tables loaded"
        );

        Ok(data)
    }

    pub fn index(&self) -> &JurisdictionIndex {
        &self.index
    }

    pub fn profiles(&self) -> &StateProfileTable {
        &self.profiles
    }

    pub fn overrides(&self) -> &LocalOverrideTable {
        &self.overrides
    }

    pub fn regional(&self) -> &RegionalRuleSet {
        &self.regional
    }

    pub fn defaults(&self) -> &LocalRateDefaults {
        &self.defaults
    }

    pub fn overlays(&self) -> &ExciseOverlayTable {
        &self.overlays
    }

    pub fn deposits(&self) -> &BottleDepositTable {
        &self.deposits
    }
}

fn insert_unique<K, V>(
    map: &mut HashMap<K, V>,
    table: &'static str,
    key: K,
    value: V,
) -> Result<(), IntegrityFault>
where
    K: Eq + Hash + std::fmt::Debug,
{
    match map.entry(key) {
        Entry::Occupied(entry) => Err(IntegrityFault::DuplicateKey {
            table,
            key: format!("{:?}", entry.key()),
        }),
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
    }
}
