use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use profilematch_common::{Platform, Query, Resolution, ResolverConfig};
use profilematch_engine::{build_resolver, load_policies};

#[derive(Parser)]
#[command(name = "profilematch", about = "Find a business's own social media profiles")]
struct Cli {
    /// Business name as it appears publicly
    #[arg(long)]
    name: String,

    /// The business's website
    #[arg(long)]
    website: Option<String>,

    /// Map listing id (Google place id)
    #[arg(long = "listing-id")]
    listing_id: Option<String>,

    /// Platform to resolve; repeat for several. Defaults to all.
    #[arg(long = "platform")]
    platforms: Vec<Platform>,

    /// TOML policy overrides (takes precedence over PROFILEMATCH_POLICY)
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout stays clean for results
    let filter = match "profilematch=info".parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "profilematch failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let query = Query::new(cli.name, cli.website, cli.listing_id)?;

    let config = ResolverConfig::from_env()?;
    let policy_path = cli.policy.or_else(|| config.policy_path.clone());
    let policies = load_policies(policy_path.as_deref())?;
    let resolver = build_resolver(&config, policies)?;

    let platforms = if cli.platforms.is_empty() {
        Platform::ALL.to_vec()
    } else {
        let mut requested = cli.platforms;
        requested.sort();
        requested.dedup();
        requested
    };

    info!(business = query.business_name(), platforms = platforms.len(), "Resolving");
    let resolution = resolver.resolve_platforms(&query, &platforms).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
        print_table(&resolution);
    }
    Ok(())
}

fn print_table(resolution: &Resolution) {
    for (platform, suggestion) in resolution {
        match suggestion {
            Some(s) => println!(
                "{:<10} {:<50} {:.2}  {}",
                platform.as_str(),
                s.url,
                s.confidence,
                s.rationale
            ),
            None => println!("{:<10} -", platform.as_str()),
        }
    }
}
