use std::{io, process::ExitCode, sync::Arc};
use clap::Parser;

use s3_purge::{get_region_client, ConsoleGate, Purger, S3Gateway, SharedGateway,
    DEFAULT_CONCURRENCY, PROFILE, REGION};


/// Interactively empty and delete S3 buckets.
#[derive(Parser, Debug)]
#[command(name = "s3-purge")]
struct Cli {
    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = REGION)]
    region: String,

    /// AWS profile name
    #[arg(long, env = "AWS_PROFILE", default_value = PROFILE)]
    profile: String,

    /// Maximal number of concurrent object deletions per bucket
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY as u16, value_parser = clap::value_parser!(u16).range(1..))]
    concurrency: u16,

    /// Only offer buckets whose name starts with this prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}


#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        // disable printing the name of the module in every log line.
        .with_target(false)
        .without_time()
        .init();

    let (_, client) = get_region_client(&cli.region, &cli.profile).await;
    let gateway: SharedGateway = Arc::new(S3Gateway::new(client));
    let gate = ConsoleGate::new(io::stdin().lock(), io::stdout());

    let mut purger = Purger::new(gateway, gate)
        .with_concurrency(usize::from(cli.concurrency))
        .with_prefix(cli.prefix);

    match purger.run().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_defaults_to_ten() {
        let cli = Cli::try_parse_from(["s3-purge"]).unwrap();
        assert_eq!(usize::from(cli.concurrency), DEFAULT_CONCURRENCY);
        assert_eq!(cli.prefix, None);
    }

    #[test]
    fn test_concurrency_must_be_positive() {
        let cli = Cli::try_parse_from(["s3-purge", "--concurrency", "25", "--prefix", "tmp-"]).unwrap();
        assert_eq!(cli.concurrency, 25);
        assert_eq!(cli.prefix.as_deref(), Some("tmp-"));

        assert!(Cli::try_parse_from(["s3-purge", "--concurrency", "0"]).is_err());
        assert!(Cli::try_parse_from(["s3-purge", "--concurrency", "-3"]).is_err());
    }
}
