use crate::infra::reference_config;
use clap::Args;
use std::path::PathBuf;
use tax_lookup::config::AppConfig;
use tax_lookup::error::AppError;
use tax_lookup::jurisdiction::{RateResolver, ZipCode};
use tax_lookup::reference::ReferenceData;
use tax_lookup::telemetry;

#[derive(Args, Debug)]
pub(crate) struct LookupArgs {
    /// ZIP code to resolve; ZIP+4 and surrounding noise are accepted
    pub(crate) zip: String,
    /// Print the settings-form suggestion instead of the raw rate breakdown
    #[arg(long)]
    pub(crate) suggest: bool,
    /// Directory of rate tables to use instead of the embedded ones
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CheckDataArgs {
    /// Directory of rate tables to validate (defaults to TAX_DATA_DIR or the embedded tables)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

pub(crate) fn run_lookup(args: LookupArgs) -> Result<(), AppError> {
    let LookupArgs {
        zip,
        suggest,
        data_dir,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init_for_cli(&config.telemetry)?;

    let zip = ZipCode::sanitize(&zip)?;
    let data = ReferenceData::load(&reference_config(&config, data_dir))?;
    let resolver = RateResolver::new(data);

    let rendered = if suggest {
        serde_json::to_string_pretty(&resolver.suggest(&zip))
    } else {
        serde_json::to_string_pretty(&resolver.resolve(&zip))
    }
    .map_err(std::io::Error::from)?;

    println!("{rendered}");
    Ok(())
}

pub(crate) fn run_check_data(args: CheckDataArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_for_cli(&config.telemetry)?;

    let reference = reference_config(&config, args.data_dir);
    let source = reference
        .data_dir
        .as_ref()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|| "embedded".to_string());
    let data = ReferenceData::load(&reference)?;

    println!("Rate tables OK ({source})");
    for line in summary_lines(&data) {
        println!("  {line}");
    }
    Ok(())
}

fn summary_lines(data: &ReferenceData) -> Vec<String> {
    let indexed_states = data.index().states();
    let composite_states: Vec<&str> = data
        .regional()
        .composite_states()
        .into_iter()
        .map(|state| state.as_str())
        .collect();
    let overlay_states: Vec<&str> = data
        .overlays()
        .schedules()
        .map(|schedule| schedule.state_code.as_str())
        .collect();

    vec![
        format!("State profiles: {}", data.profiles().len()),
        format!(
            "ZIP prefixes: {} across {} states",
            data.index().len(),
            indexed_states.len()
        ),
        format!("Local overrides: {}", data.overrides().len()),
        format!(
            "Regional breakdowns: {} ({})",
            data.regional().breakdowns().count(),
            composite_states.join(", ")
        ),
        format!("Local defaults: {}", data.defaults().configured().count()),
        format!("Overlay states: {}", overlay_states.join(", ")),
        format!("Bottle-bill states: {}", data.deposits().states().count()),
    ]
}
