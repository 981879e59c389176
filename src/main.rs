use clap::Parser;
use quotecast::cli::{Cli, Commands};
use quotecast::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    let _guard = quotecast::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting demo market-data engine");
            args.execute(&config).await?;
        }
        Commands::Status => {
            println!("quotecast status");
            println!("  Scheduler: Not running");
            println!(
                "  Configured interval: {}s ({} fallback)",
                config.snapshot.interval_secs, config.quotes.default_currency
            );
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Default currency: {}", config.quotes.default_currency);
            println!("  Max tracked quotes: {}", config.quotes.max_tracked);
            println!(
                "  Demo tick interval: {}ms",
                config.quotes.demo_tick_interval_ms
            );
            println!("  Snapshot interval: {}s", config.snapshot.interval_secs);
            println!("  Metrics port: {}", config.telemetry.metrics_port);
        }
    }

    Ok(())
}
