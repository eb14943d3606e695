use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::{StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use route_enricher::application::SitePipeline;
use route_enricher::domain::RouteId;
use route_enricher::infrastructure::{
    AppConfig, ConfigManager, DataApiClient, HttpClient, SearchClient, init_logging_with_config,
};

#[derive(Parser)]
#[command(name = "route-enricher", about = "Climbing route lookup with first ascent and GPS enrichment")]
struct Cli {
    /// Configuration file (default: per-user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data API key, overrides the configured one
    #[arg(long, global = true, env = "ROUTE_ENRICHER_API_KEY")]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch routes by id, enrich them and print the JSON response
    Enrich {
        /// Route ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Discover route ids for a free-text query
    Search {
        query: String,
        /// Result offset to start from
        #[arg(short, long, default_value = "0")]
        offset: usize,
        /// Stop after this many ids
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Fetch and enrich the discovered routes instead of printing ids
        #[arg(long)]
        enrich: bool,
    },
}

async fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => ConfigManager::with_path(path).load_config().await,
        None => ConfigManager::new()?.initialize_on_first_run().await,
    }
}

/// Cancelled on Ctrl-C so in-flight workers stop and the batch returns
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Interrupted, cancelling remaining routes");
            trigger.cancel();
        }
    });
    token
}

async fn enrich(config: &AppConfig, client: HttpClient, ids: Vec<RouteId>) -> Result<()> {
    let key = config
        .site
        .api_key
        .clone()
        .context("A data API key is required (--api-key or site.api_key)")?;

    let api = DataApiClient::new(client.clone(), key, &config.site.data_url);
    let mut response = api.get_routes(ids).await?;

    let pipeline = SitePipeline::from_config(config, client, shutdown_token())?;
    let stats = pipeline.enrich_routes_response(&mut response).await;
    info!(
        "Routes: {} total, {} enriched, {} with GPS, {} unchanged",
        stats.total,
        stats.enriched,
        stats.with_gps,
        stats.unchanged()
    );

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config).await?;
    if cli.api_key.is_some() {
        config.site.api_key = cli.api_key;
    }
    init_logging_with_config(&config.logging)?;

    let client = HttpClient::new(config.http.clone())?;

    match cli.command {
        Commands::Enrich { ids } => {
            let ids = ids.into_iter().map(RouteId::from).collect();
            enrich(&config, client, ids).await
        }
        Commands::Search {
            query,
            offset,
            limit,
            enrich: enrich_results,
        } => {
            let search = SearchClient::new(client.clone(), &config.site.search_url, &config.site.root_url)?;
            let ids: Vec<RouteId> = search
                .route_ids(query.clone(), offset)
                .take(limit.unwrap_or(usize::MAX))
                .try_collect()
                .await?;
            info!("🔍 '{}': {} route ids", query, ids.len());

            if enrich_results {
                return enrich(&config, client, ids).await;
            }
            for id in ids {
                println!("{id}");
            }
            Ok(())
        }
    }
}
