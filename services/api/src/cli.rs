use crate::commands::{run_check_data, run_lookup, CheckDataArgs, LookupArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use tax_lookup::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Tax Rate Lookup",
    about = "Serve and query ZIP-code sales-tax rate suggestions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Resolve a single ZIP code and print the result as JSON
    Lookup(LookupArgs),
    /// Load and validate the rate tables, then print a summary
    CheckData(CheckDataArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Lookup(args) => run_lookup(args),
        Command::CheckData(args) => run_check_data(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["tax-lookup-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn lookup_accepts_suggest_flag() {
        let cli = Cli::try_parse_from(["tax-lookup-api", "lookup", "60601-1234", "--suggest"])
            .expect("parses");

        match cli.command {
            Some(Command::Lookup(args)) => {
                assert_eq!(args.zip, "60601-1234");
                assert!(args.suggest);
                assert!(args.data_dir.is_none());
            }
            other => panic!("expected lookup command, got {other:?}"),
        }
    }

    #[test]
    fn check_data_takes_directory() {
        let cli = Cli::try_parse_from(["tax-lookup-api", "check-data", "--data-dir", "/srv/rates"])
            .expect("parses");

        match cli.command {
            Some(Command::CheckData(args)) => {
                assert_eq!(
                    args.data_dir.as_deref(),
                    Some(std::path::Path::new("/srv/rates"))
                );
            }
            other => panic!("expected check-data command, got {other:?}"),
        }
    }

    #[test]
    fn serve_overrides_parse() {
        let cli = Cli::try_parse_from(["tax-lookup-api", "serve", "--port", "8080"])
            .expect("parses");

        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8080));
                assert!(args.host.is_none());
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }
}
