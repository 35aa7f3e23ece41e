//! One-shot breach search from the command line
//!
//! Usage:
//!   breach_lookup_cli 89991234567 --field phone
//!   breach_lookup_cli https://vk.com/ivanov123 -f vk --format json
//!   breach_lookup_cli user@example.com -f email --user alice

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use breach_lookup::{
    AggregateReport, BreachLookupConfig, SearchOrchestrator, SearchRequest, UserIdentity,
};

#[derive(Parser)]
#[command(name = "breach_lookup_cli")]
#[command(about = "Search all breach sources for one identifier")]
struct Args {
    /// Value to search for
    value: String,

    /// Field type: phone, email, inn, snils, vk, ok, username
    #[arg(short = 'f', long, default_value = "phone")]
    field: String,

    /// Configuration file
    #[arg(
        short = 'c',
        long,
        env = "BREACH_LOOKUP_CONFIG",
        default_value = "config/breach_lookup.yaml"
    )]
    config: String,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: String,

    /// User identity recorded with the search
    #[arg(short = 'u', long)]
    user: Option<String>,

    /// Print every record, not only per-source counts
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "breach_lookup=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let orchestrator = match BreachLookupConfig::load_or_default(&args.config)
        .and_then(|config| SearchOrchestrator::from_config(&config))
    {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error loading configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let request = SearchRequest::new(args.value.as_str(), args.field.as_str());
    let report = match orchestrator
        .handle_search(request, args.user.map(UserIdentity::new))
        .await
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Invalid query: {}", e);
            return ExitCode::from(2);
        }
    };
    orchestrator.flush_sinks().await;

    match args.format.as_str() {
        "json" => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        },
        _ => print_text(&report, args.verbose),
    }

    ExitCode::SUCCESS
}

fn print_text(report: &AggregateReport, verbose: bool) {
    println!(
        "{} leaks across {} sources ({} ms)",
        report.total_leaks, report.found_sources, report.elapsed_ms
    );
    println!();

    for result in &report.results {
        match &result.error {
            Some(error) => println!("  {:<10} ERROR [{}] {}", result.name, error.kind, error.message),
            None => println!("  {:<10} {} records", result.name, result.count),
        }

        if verbose {
            for record in &result.data {
                let origin = record.source_database.as_deref().unwrap_or("-");
                println!("    [{}]", origin);
                for (label, value) in &record.fields {
                    println!("      {}: {}", label, value);
                }
            }
        }
    }
}
