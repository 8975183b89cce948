use super::ReferenceData;
use crate::jurisdiction::domain::{StateCode, ZipCode};
use tracing::warn;

/// Inconsistencies between the rate tables. Any of these makes the data unusable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrityFault {
    #[error("prefix {prefix} maps to state {state_code}, which has no tax profile")]
    MissingStateProfile { prefix: String, state_code: String },
    #[error("table '{table}' references unknown state {state_code}")]
    UnknownState {
        table: &'static str,
        state_code: String,
    },
    #[error("table '{table}' entry {key} has rate {rate} outside 0..=100")]
    RateOutOfRange {
        table: &'static str,
        key: String,
        rate: f64,
    },
    #[error("table '{table}' key '{key}' is not {expected}")]
    MalformedKey {
        table: &'static str,
        key: String,
        expected: &'static str,
    },
    #[error("table '{table}' contains duplicate key {key}")]
    DuplicateKey { table: &'static str, key: String },
    #[error("table '{table}' declares ZIP {zip} in {declared}, but its prefix maps to {indexed}")]
    StateMismatch {
        table: &'static str,
        zip: String,
        declared: String,
        indexed: String,
    },
    #[error("table '{table}' lists ZIP {zip} whose prefix is not indexed")]
    UnindexedZip { table: &'static str, zip: String },
}

pub(crate) fn check(data: &ReferenceData) -> Result<(), IntegrityFault> {
    check_state_codes(data)?;
    check_prefixes(data)?;
    check_rates(data)?;
    check_zip_tables(data)?;
    warn_unknown_counties(data);
    Ok(())
}

fn check_state_codes(data: &ReferenceData) -> Result<(), IntegrityFault> {
    for profile in data.profiles().iter() {
        state_code_shape("states", &profile.code)?;
    }

    let referenced = data
        .regional()
        .county_rates()
        .map(|(state, _, _)| ("county_rates", state))
        .chain(
            data.defaults()
                .configured()
                .map(|(state, _)| ("local_defaults", state)),
        )
        .chain(
            data.overlays()
                .schedules()
                .map(|schedule| ("overlay_schedules", &schedule.state_code)),
        )
        .chain(
            data.overlays()
                .entries()
                .map(|(state, _, _, _)| ("excise_overlays", state)),
        )
        .chain(
            data.deposits()
                .states()
                .map(|state| ("bottle_deposits", state)),
        );

    for (table, state) in referenced {
        if !data.profiles().contains(state) {
            return Err(IntegrityFault::UnknownState {
                table,
                state_code: state.to_string(),
            });
        }
    }

    Ok(())
}

fn check_prefixes(data: &ReferenceData) -> Result<(), IntegrityFault> {
    for (prefix, state) in data.index().entries() {
        digits_key("zip_prefixes", prefix, 3, "a 3-digit prefix")?;
        if !data.profiles().contains(state) {
            return Err(IntegrityFault::MissingStateProfile {
                prefix: prefix.to_string(),
                state_code: state.to_string(),
            });
        }
    }
    Ok(())
}

fn check_rates(data: &ReferenceData) -> Result<(), IntegrityFault> {
    for profile in data.profiles().iter() {
        percent("states", profile.code.as_str(), profile.rate)?;
    }
    for entry in data.overrides().iter() {
        percent("local_overrides", &entry.zip, entry.local_rate)?;
    }
    for breakdown in data.regional().breakdowns() {
        percent(
            "regional_breakdowns",
            &breakdown.zip,
            breakdown.municipality_rate,
        )?;
        percent("regional_breakdowns", &breakdown.zip, breakdown.transit_rate)?;
    }
    for (state, county, rate) in data.regional().county_rates() {
        percent("county_rates", &format!("{state}/{county}"), rate)?;
    }
    for (state, rate) in data.defaults().configured() {
        percent("local_defaults", state.as_str(), rate)?;
    }
    for schedule in data.overlays().schedules() {
        percent(
            "overlay_schedules",
            schedule.state_code.as_str(),
            schedule.grocery_rate,
        )?;
    }
    for (state, category, layer, rate) in data.overlays().entries() {
        percent(
            "excise_overlays",
            &format!("{state}/{}/{layer:?}", category.label()),
            rate,
        )?;
    }
    for state in data.deposits().states() {
        for deposit in data.deposits().for_state(state) {
            if !deposit.amount.is_finite() || deposit.amount < 0.0 {
                return Err(IntegrityFault::RateOutOfRange {
                    table: "bottle_deposits",
                    key: format!("{state}/{}", deposit.label),
                    rate: deposit.amount,
                });
            }
        }
    }
    Ok(())
}

fn check_zip_tables(data: &ReferenceData) -> Result<(), IntegrityFault> {
    for entry in data.overrides().iter() {
        digits_key("local_overrides", &entry.zip, 5, "a 5-digit ZIP code")?;
        indexed_state("local_overrides", &entry.zip, data)?;
    }

    for breakdown in data.regional().breakdowns() {
        digits_key("regional_breakdowns", &breakdown.zip, 5, "a 5-digit ZIP code")?;
        let indexed = indexed_state("regional_breakdowns", &breakdown.zip, data)?;
        if *indexed != breakdown.state_code {
            return Err(IntegrityFault::StateMismatch {
                table: "regional_breakdowns",
                zip: breakdown.zip.clone(),
                declared: breakdown.state_code.to_string(),
                indexed: indexed.to_string(),
            });
        }
    }

    Ok(())
}

fn warn_unknown_counties(data: &ReferenceData) {
    for breakdown in data.regional().breakdowns() {
        if data
            .regional()
            .county_rate(&breakdown.state_code, &breakdown.county)
            .is_none()
        {
            warn!(
                zip = %breakdown.zip,
                county = %breakdown.county,
                "breakdown county has no rate; county component will be zero"
            );
        }
    }
}

fn indexed_state<'a>(
    table: &'static str,
    zip: &str,
    data: &'a ReferenceData,
) -> Result<&'a StateCode, IntegrityFault> {
    ZipCode::parse(zip)
        .ok()
        .and_then(|zip| data.index().resolve_state(&zip))
        .ok_or_else(|| IntegrityFault::UnindexedZip {
            table,
            zip: zip.to_string(),
        })
}

fn state_code_shape(table: &'static str, code: &StateCode) -> Result<(), IntegrityFault> {
    let valid = code.as_str().len() == 2 && code.as_str().bytes().all(|b| b.is_ascii_uppercase());
    if valid {
        Ok(())
    } else {
        Err(IntegrityFault::MalformedKey {
            table,
            key: code.to_string(),
            expected: "a 2-letter state code",
        })
    }
}

fn digits_key(
    table: &'static str,
    key: &str,
    len: usize,
    expected: &'static str,
) -> Result<(), IntegrityFault> {
    if key.len() == len && key.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(IntegrityFault::MalformedKey {
            table,
            key: key.to_string(),
            expected,
        })
    }
}

fn percent(table: &'static str, key: &str, rate: f64) -> Result<(), IntegrityFault> {
    if rate.is_finite() && (0.0..=100.0).contains(&rate) {
        Ok(())
    } else {
        Err(IntegrityFault::RateOutOfRange {
            table,
            key: key.to_string(),
            rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::reference::{ReferenceData, ReferenceDataError, TableSources};

    use super::IntegrityFault;

    const STATES: &str = "code,name,rate,has_local_tax\nIL,Illinois,6.25,true\nDE,Delaware,0,false\n";
    const PREFIXES: &str = "prefix,state_code\n606,IL\n197,DE\n";
    const EMPTY_OVERRIDES: &str = "zip,city,local_rate\n";
    const EMPTY_BREAKDOWNS: &str =
        "zip,state_code,municipality,municipality_rate,transit_rate,county\n";
    const COUNTIES: &str = "state_code,county,rate\nIL,Cook,1.75\n";
    const DEFAULTS: &str = "state_code,rate\nIL,2.50\n";
    const SCHEDULES: &str = "state_code,grocery_rate,designated_county,designated_city\n";
    const OVERLAYS: &str = "state_code,category,layer,retail_percent\n";
    const DEPOSITS: &str = "state_code,tier,label,amount,containers\n";

    fn sources() -> TableSources<'static> {
        TableSources {
            states: STATES,
            zip_prefixes: PREFIXES,
            local_overrides: EMPTY_OVERRIDES,
            regional_breakdowns: EMPTY_BREAKDOWNS,
            county_rates: COUNTIES,
            local_defaults: DEFAULTS,
            overlay_schedules: SCHEDULES,
            excise_overlays: OVERLAYS,
            bottle_deposits: DEPOSITS,
        }
    }

    fn fault(sources: TableSources<'_>) -> IntegrityFault {
        match ReferenceData::from_sources(&sources) {
            Err(ReferenceDataError::Integrity(fault)) => fault,
            other => panic!("expected integrity fault, got {other:?}"),
        }
    }

    #[test]
    fn minimal_tables_pass() {
        let data = ReferenceData::from_sources(&sources()).expect("valid tables");
        assert_eq!(data.index().len(), 2);
    }

    #[test]
    fn prefix_for_unknown_state_is_rejected() {
        let mut tables = sources();
        tables.zip_prefixes = "prefix,state_code\n606,IL\n100,NY\n";

        assert_eq!(
            fault(tables),
            IntegrityFault::MissingStateProfile {
                prefix: "100".to_string(),
                state_code: "NY".to_string(),
            }
        );
    }

    #[test]
    fn short_prefix_is_malformed() {
        let mut tables = sources();
        tables.zip_prefixes = "prefix,state_code\n60,IL\n";

        assert!(matches!(
            fault(tables),
            IntegrityFault::MalformedKey { table: "zip_prefixes", .. }
        ));
    }

    #[test]
    fn negative_rate_is_out_of_range() {
        let mut tables = sources();
        tables.local_defaults = "state_code,rate\nIL,-1.0\n";

        assert!(matches!(
            fault(tables),
            IntegrityFault::RateOutOfRange { table: "local_defaults", .. }
        ));
    }

    #[test]
    fn default_for_unknown_state_is_rejected() {
        let mut tables = sources();
        tables.local_defaults = "state_code,rate\nWA,2.50\n";

        assert_eq!(
            fault(tables),
            IntegrityFault::UnknownState {
                table: "local_defaults",
                state_code: "WA".to_string(),
            }
        );
    }

    #[test]
    fn override_outside_index_is_rejected() {
        let mut tables = sources();
        tables.local_overrides = "zip,city,local_rate\n10001,New York,4.50\n";

        assert_eq!(
            fault(tables),
            IntegrityFault::UnindexedZip {
                table: "local_overrides",
                zip: "10001".to_string(),
            }
        );
    }

    #[test]
    fn breakdown_state_must_match_index() {
        let mut tables = sources();
        tables.regional_breakdowns = "zip,state_code,municipality,municipality_rate,transit_rate,county\n19701,IL,Bear,1.00,0.50,Cook\n";

        assert!(matches!(
            fault(tables),
            IntegrityFault::StateMismatch { table: "regional_breakdowns", .. }
        ));
    }

    #[test]
    fn unknown_breakdown_county_only_warns() {
        let mut tables = sources();
        tables.regional_breakdowns = "zip,state_code,municipality,municipality_rate,transit_rate,county\n60601,IL,Chicago,1.25,1.00,Kane\n";

        assert!(ReferenceData::from_sources(&tables).is_ok());
    }

    #[test]
    fn negative_deposit_is_rejected() {
        let mut tables = sources();
        tables.bottle_deposits =
            "state_code,tier,label,amount,containers\nDE,all,all,-0.05,Beverages\n";

        assert!(matches!(
            fault(tables),
            IntegrityFault::RateOutOfRange { table: "bottle_deposits", .. }
        ));
    }
}
