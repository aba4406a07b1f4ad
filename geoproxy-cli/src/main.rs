//! geoproxy CLI
//!
//! Runs the caching geocoding proxy, or resolves a single query from the shell.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use geoproxy_api::{ApiConfig, ApiServer, AppState, LookupResponse};
use geoproxy_core::constants::{DEFAULT_BIND_ADDR, DEFAULT_PORT};

/// geoproxy - caching proxy for Nominatim geocoding
#[derive(Parser)]
#[command(name = "geoproxy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Bind address
        #[arg(short, long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
        bind: String,
    },

    /// Resolve one query through the configured cache and print the result
    Lookup {
        /// Free-text query
        query: String,
        /// Print the raw `{cache, data}` JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let config = ApiConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Serve { port, bind } => cmd_serve(config, port, &bind).await,
        Commands::Lookup { query, json } => cmd_lookup(config, &query, json).await,
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        "geoproxy=debug,tower_http=debug,info"
    } else {
        "geoproxy=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Run API server
async fn cmd_serve(mut config: ApiConfig, port: u16, bind: &str) -> Result<()> {
    config.port = port;
    config.bind_addr = bind.to_string();
    let addr: SocketAddr = config.socket_addr().context("Invalid listen address")?;

    println!("{}", "🚀 Starting geoproxy...".cyan().bold());
    println!("   {} http://{}", "Listening on:".green(), addr);
    println!("   {} http://{}/api?q=Berlin", "Try:".dimmed(), addr);
    println!("\n   Press Ctrl+C to stop.\n");

    let server = ApiServer::new(config).context("Failed to initialise server")?;
    server.run(addr).await.context("Server error")?;

    Ok(())
}

/// Resolve a single query
async fn cmd_lookup(config: ApiConfig, query: &str, json: bool) -> Result<()> {
    let state = AppState::new(config).context("Failed to initialise resolver")?;
    info!(cache = state.backend.as_str(), "Resolving from the shell");

    let resolution = state
        .resolver
        .resolve(query)
        .await
        .with_context(|| format!("Failed to resolve '{}'", query))?;

    let response = LookupResponse::from(resolution);

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let source = if response.cache { "cache".yellow() } else { "upstream".green() };
    println!(
        "{} {} ({} result(s) from {})",
        "🔍".cyan(),
        query.bold(),
        response.data.len(),
        source
    );

    if response.data.is_empty() {
        println!("   {}", "No matches.".yellow());
    }
    for place in &response.data {
        println!("\n   {}", place.display_name.bold());
        println!("   {} {}, {}", "Lat/Lon:".dimmed(), place.lat, place.lon);
        println!("   {} {}/{}", "Class:".dimmed(), place.class, place.kind);
        println!("   {} {} {}", "OSM:".dimmed(), place.osm_type, place.osm_id);
        println!("   {} {:.4}", "Importance:".dimmed(), place.importance);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_lookup() {
        let cli = Cli::try_parse_from(["geoproxy", "lookup", "Berlin", "--json"]).unwrap();
        match cli.command {
            Commands::Lookup { query, json } => {
                assert_eq!(query, "Berlin");
                assert!(json);
            }
            _ => panic!("expected lookup"),
        }
    }

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::try_parse_from([
            "geoproxy", "-v", "serve", "--port", "9000", "--bind", "127.0.0.1",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Serve { port, bind } => {
                assert_eq!(port, 9000);
                assert_eq!(bind, "127.0.0.1");
            }
            _ => panic!("expected serve"),
        }
    }
}
