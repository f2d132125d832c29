use catalog::{BranchCatalog, LookerClient, LookerConfig};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use validator::{load_tests, run, write_markdown};

/// Exit status when at least one test failed.
const EXIT_TESTS_FAILED: u8 = 3;

#[derive(Parser)]
#[command(name = "lookml-validate")]
#[command(about = "Check that LookML explore fields reference the fields their tests require")]
struct Cli {
    /// Branch to run the LookML tests on
    #[arg(short, long)]
    branch: String,
    /// Directory holding the validation file; the report is written here too
    #[arg(short, long, default_value = ".")]
    location: PathBuf,
    /// Configuration file for the Looker instance
    #[arg(short = 'c', long, default_value = "looker.toml")]
    config_file: PathBuf,
    /// Section of the configuration file to use
    #[arg(short, long, default_value = "looker")]
    section: String,
    /// Validation file with the test definitions, relative to --location
    #[arg(short = 'f', long)]
    validation_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = LookerConfig::load(&cli.config_file, &cli.section)?;
    let client = LookerClient::new(config)?;
    let provider = BranchCatalog::new(client, &cli.branch);

    let tests = load_tests(cli.location.join(&cli.validation_file))?;
    info!("Loaded {} tests", tests.len());

    let outcome = match run(&tests, &provider).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Validation aborted: {}", e);
            return Err(e.into());
        }
    };

    let report = write_markdown(&cli.location, &outcome.results, &outcome.summary)?;

    println!("LookML Validation Results: {}", outcome.summary);
    for result in outcome.results.iter().filter(|r| r.is_failed()) {
        println!("  ✗ {}: {}", result.test_name, result.error_message);
    }
    println!("Report written to {}", report.display());

    if outcome.summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_TESTS_FAILED))
    }
}
