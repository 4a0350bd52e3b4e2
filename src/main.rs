use clap::{Parser, Subcommand};
use std::path::Path;
use tracing::{debug, error, info};

use vizcat::catalog::{CatalogConfig, CatalogRegistry};
use vizcat::client::VizqueryClient;
use vizcat::config::Config;
use vizcat::logging;
use vizcat::session::QuerySession;
use vizcat::types::Coordinate;

#[derive(Parser)]
#[command(name = "vizcat")]
#[command(about = "VizieR catalog cone-query and cleaning tool")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query every configured catalog around a coordinate
    Query {
        /// Right ascension of the target, sexagesimal (e.g. "05 02 58.72")
        #[arg(long)]
        ra: String,
        /// Declination of the target, sexagesimal (e.g. "-03 01 12.9")
        #[arg(long, allow_hyphen_values = true)]
        dec: String,
        /// Catalogs to skip (comma-separated, by name or descriptor file name)
        #[arg(long)]
        exclude: Option<String>,
        /// Path to the application config file
        #[arg(long, default_value = "config.toml")]
        config: String,
        /// Print results as a JSON object instead of the human summary
        #[arg(long)]
        json: bool,
    },
    /// List the catalogs found in the descriptor directory
    Catalogs {
        /// Path to the application config file
        #[arg(long, default_value = "config.toml")]
        config: String,
    },
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if Path::new(path).is_file() {
        Ok(Config::load_from(path)?)
    } else {
        debug!("No config file at {}, using defaults", path);
        Ok(Config::default())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Query {
            ra,
            dec,
            exclude,
            config,
            json,
        } => {
            let app = load_config(&config)?;
            let registry = CatalogRegistry::discover(&app.vizquery.catalog_dir)?;
            if registry.is_empty() {
                println!(
                    "⚠️  No catalog descriptors found in {}",
                    app.vizquery.catalog_dir
                );
                return Ok(());
            }

            let excluded: Vec<String> = exclude
                .map(|list| list.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default();

            let coordinate = Coordinate::new(ra, dec);
            info!(
                "Querying {} catalog(s) around {}",
                registry.len(),
                coordinate.target()
            );
            if !json {
                println!(
                    "🔭 Querying {} catalog(s) around {} ...",
                    registry.len(),
                    coordinate.target()
                );
            }

            let service = VizqueryClient::from_config(&app.vizquery);
            let order: Vec<String> = registry.names().iter().map(|s| s.to_string()).collect();
            let mut session = QuerySession::new(coordinate, registry, Box::new(service));

            if let Err(e) = session.query(&excluded).await {
                error!("Query session failed: {}", e);
                return Err(e.into());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(session.data())?);
            } else {
                println!("\n📊 Results:");
                for name in &order {
                    match session.data().get(name) {
                        Some(Some(row)) => {
                            let values: Vec<String> =
                                row.iter().map(|f| f.to_string()).collect();
                            println!("   {}: {}", name, values.join("; "));
                        }
                        Some(None) => println!("   {}: no usable data", name),
                        None => println!("   {}: excluded", name),
                    }
                }
            }
        }
        Commands::Catalogs { config } => {
            let app = load_config(&config)?;
            let registry = CatalogRegistry::discover(&app.vizquery.catalog_dir)?;
            println!(
                "📚 {} catalog(s) in {}:",
                registry.len(),
                app.vizquery.catalog_dir
            );
            for entry in registry.entries() {
                match CatalogConfig::load(&entry.name, &entry.path) {
                    Ok(cfg) => println!(
                        "   {}: source={} radius={} columns={}",
                        entry.name, cfg.source, cfg.radius, cfg.output
                    ),
                    Err(e) => println!("   ⚠️  {}: {}", entry.name, e),
                }
            }
        }
    }

    Ok(())
}
