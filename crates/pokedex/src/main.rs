//! Pokédex CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use pokedex::{
    aggregate, panel, selected, CaptureProgress, CatalogStore, FetchReport, PanelRow,
    PokeApiClient, RecordFetcher, TranslationTable,
};
use serde::Serialize;
use shared::{Config, LogConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Ids to mark as captured once the catalog is loaded (e.g. 1,4,7)
    #[arg(long, value_delimiter = ',')]
    capture: Vec<u32>,

    /// Maximum number of requests in flight (default: unbounded)
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Keep entries that have no front sprite
    #[arg(long)]
    lenient_thumbnails: bool,

    /// Print the statistics as JSON
    #[arg(long)]
    json: bool,
}

/// Everything the statistics screen shows
#[derive(Debug, Serialize)]
struct Summary {
    captured: CaptureProgress,
    captured_names: Vec<String>,
    catalog: Vec<PanelRow>,
    selected: Vec<PanelRow>,
    fetch: FetchReport,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.max_concurrent.is_some() {
        config.api.max_concurrent_requests = args.max_concurrent;
    }
    if args.lenient_thumbnails {
        config.api.require_thumbnail = false;
    }
    config.api.validate().context("Invalid API settings")?;

    // Initialize logging
    shared::logging::init(LogConfig::from_config(&config, "pokedex", args.verbose))?;

    info!("Pokédex starting");
    info!(config_file = %args.config.display(), "Loaded configuration");

    let store = CatalogStore::new();
    let client = PokeApiClient::new(&config.api).context("Failed to create PokeAPI client")?;
    let fetcher = RecordFetcher::new(Arc::new(client), store.clone())
        .with_max_concurrent(config.api.max_concurrent_requests);

    let cancel = fetcher.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding requests");
            cancel.cancel();
        }
    });

    let report = fetcher.fetch_all(config.api.catalog_ids()).await;
    if !report.is_complete() {
        warn!(
            missing = report.requested - report.fetched,
            failed_ids = ?report.failed_ids(),
            "Catalog is incomplete"
        );
    }

    for id in &args.capture {
        match store.toggle_selected(*id) {
            Ok(captured) => info!(id = id, captured = captured, "Toggled capture"),
            Err(e) => warn!(id = id, error = %e, "Cannot capture"),
        }
    }

    let table = TranslationTable::pokemon_types();
    let records = store.all();
    let captured_records = selected(&records);

    let mut captured_names: Vec<(u32, String)> = captured_records
        .iter()
        .map(|r| (r.id, r.display_name()))
        .collect();
    captured_names.sort_unstable();

    let summary = Summary {
        captured: CaptureProgress::new(&records, config.api.catalog_size()),
        captured_names: captured_names.into_iter().map(|(_, name)| name).collect(),
        catalog: panel(&aggregate(&records, table), table),
        selected: panel(&aggregate(&captured_records, table), table),
        fetch: report,
    };

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        println!("{}", json);
    } else {
        print_summary(&summary);
    }

    info!("Pokédex finished");

    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("Pokémons Pegos");
    println!("{}", summary.captured);
    if !summary.captured_names.is_empty() {
        println!("{}", summary.captured_names.join(", "));
    }

    print_panel("Total na Pokédex", &summary.catalog);
    print_panel("Tipos dos Selecionados", &summary.selected);

    if !summary.fetch.failures.is_empty() {
        println!();
        println!("Não carregados: {}", summary.fetch.failures.len());
        for failure in &summary.fetch.failures {
            println!("  #{:<3} {}", failure.id, failure.reason);
        }
    }
}

fn print_panel(title: &str, rows: &[PanelRow]) {
    println!();
    println!("{}", title);
    let width = rows
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0);
    for row in rows {
        let pad = width - row.name.chars().count();
        println!("  {}:{} {:>3}", row.name, " ".repeat(pad), row.count);
    }
}
