//! # Command Line Interface
//!
//! Operator commands for probing the environment and exercising the import
//! endpoint by hand.

pub mod output;

use crate::client::ImportRequest;
use crate::config::{LoggingConfig, Resolution};
use crate::execution::Requirement;
use crate::observability::init_logging;
use crate::{Harness, HarnessConfig};
use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "import-harness")]
#[command(about = "Validation harness for the person import endpoint")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Import service base URL override
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show datastore resolution and availability
    Probe,

    /// Send one import request
    Import {
        /// personId to import
        #[arg(long, allow_negative_numbers = true)]
        id: i64,

        /// Omit the Authorization header
        #[arg(long)]
        no_auth: bool,
    },

    /// Check whether a person was persisted
    Validate {
        /// personId to look up
        #[arg(long, allow_negative_numbers = true)]
        id: i64,
    },

    /// Happy path, sad paths, then a datastore check when available
    Demo,
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging.log_level = "debug".to_string();
    }
    init_logging(&logging);

    let mut config = HarnessConfig::from_env().context("Failed to load harness configuration")?;
    if let Some(base_url) = cli.base_url {
        config.import_api.base_url = base_url;
    }
    let harness =
        Harness::new(config, Resolution::from_env()).context("Failed to build the harness")?;

    match cli.command {
        Commands::Probe => handle_probe(&harness).await,
        Commands::Import { id, no_auth } => handle_import(&harness, id, no_auth).await,
        Commands::Validate { id } => {
            output::print_outcome(&harness.validator().validate(id).await)
        }
        Commands::Demo => handle_demo(&harness).await,
    }
}

async fn handle_probe(harness: &Harness) -> anyhow::Result<()> {
    match harness.gateway().resolution() {
        Resolution::Configured(profile) => {
            println!("datastore: configured ({})", profile.display_target())
        }
        Resolution::Unconfigured(reason) => println!("datastore: unconfigured ({})", reason),
    }

    let infrastructure = harness.infrastructure().await;
    println!("availability: {}", infrastructure.datastore);
    println!("import endpoint: {}", harness.client().import_url());
    println!(
        "real api: {}",
        if infrastructure.real_api_enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

async fn handle_import(harness: &Harness, id: i64, no_auth: bool) -> anyhow::Result<()> {
    let response = if no_auth {
        harness.client().without_auth().import_person(id).await
    } else {
        harness.client().import_person(id).await
    };
    output::print_descriptor(&response)
}

async fn handle_demo(harness: &Harness) -> anyhow::Result<()> {
    let client = harness.client();
    let mut unexpected = 0;

    println!("== happy path: personId 111");
    let response = client.import_person(111).await;
    output::print_descriptor(&response)?;
    unexpected += report_expectation(response.is_success(), "200/201/202");

    println!("== sad path: personId -1");
    let response = client.import_person(-1).await;
    output::print_descriptor(&response)?;
    unexpected += report_expectation(response.has_status(400), "400");

    println!("== sad path: empty payload");
    let response = client.import_entities(&ImportRequest::empty()).await;
    output::print_descriptor(&response)?;
    unexpected += report_expectation(response.has_status(400), "400");

    println!("== datastore: personId 111");
    match harness.infrastructure().await.satisfies(Requirement::Datastore) {
        Ok(()) => output::print_outcome(&client.validate_person_in_database(111).await)?,
        Err(reason) => println!("{}", reason),
    }

    if unexpected > 0 {
        anyhow::bail!("demo finished with {} unexpected result(s)", unexpected);
    }
    Ok(())
}

fn report_expectation(met: bool, expected: &str) -> usize {
    if met {
        println!("ok: expected {}", expected);
        0
    } else {
        println!("UNEXPECTED: expected {}", expected);
        1
    }
}
