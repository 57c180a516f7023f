#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line driver for the resale map dashboard.
//!
//! ```text
//! resale_map_cli summary [--flat-type "5 ROOM"] [--config dashboard.toml]
//! resale_map_cli replay session.toml [--config dashboard.toml]
//! ```
//!
//! `summary` runs the initial load and prints the derived datasets.
//! `replay` feeds a TOML `[[events]]` script through a live dashboard whose
//! views print every update.

mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand};
use resale_map_aggregate::{cumulative_by_category, rank_groups, series_for_flat_type};
use resale_map_api::{HttpPriceApi, PriceApi};
use resale_map_dashboard::event::EventScript;
use resale_map_dashboard::views::{ControlsView, MapSync, TimelineView, TrendView};
use resale_map_dashboard::{Dashboard, DashboardConfig, run_session};
use resale_map_property_models::FlatType;
use tokio::sync::mpsc;

use crate::render::{PrintControls, PrintMap, PrintTimeline, PrintTrend};

#[derive(Parser)]
#[command(name = "resale_map_cli", about = "Resale price dashboard driver")]
struct Cli {
    /// Config file layered over the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the datasets and print what the dashboard would show
    Summary {
        /// Flat type to price properties with, e.g. "5 ROOM"
        #[arg(long)]
        flat_type: Option<FlatType>,
    },
    /// Replay a TOML event script against a live dashboard
    Replay {
        /// Script with one `[[events]]` table per event
        script: PathBuf,
    },
}

async fn load(config: DashboardConfig) -> Result<(Dashboard, Arc<dyn PriceApi>), Box<dyn std::error::Error>> {
    let api: Arc<dyn PriceApi> = Arc::new(HttpPriceApi::new(&config.api.base_url, config.timeout())?);
    log::info!("Loading dashboard data from {}", config.api.base_url);
    let dashboard = Dashboard::load(api.as_ref(), config, Local::now().date_naive()).await?;
    Ok((dashboard, api))
}

fn summary(dashboard: &Dashboard) {
    let state = dashboard.state();
    let data = state.data();
    let selection = state.selection();
    let range = data.full_range();

    println!(
        "{} properties in {} towns, completed {} to {}",
        data.records().len(),
        data.towns().len(),
        range.start,
        range.end
    );

    let priced = data.records().iter().filter(|r| r.price.is_available()).count();
    println!(
        "{priced} priced for {} ({} lookup rows)",
        selection.flat_type(),
        data.lookup().len(selection.flat_type())
    );

    let cumulative = cumulative_by_category(data.records());
    if let Some((_, last)) = cumulative.year_range() {
        println!("\nCompleted developments by {last}:");
        for category in &cumulative.categories {
            let total = category.points.last().map_or(0, |p| p.count);
            println!("  {:<24} {total}", category.tag.to_string());
        }
    }

    let series = series_for_flat_type(data.town_series(), selection.flat_type());
    let ranking = rank_groups(&series, state.config().trend.window_months);
    if let Some((start, end)) = ranking.window() {
        println!("\nMean {} price by town, {start} to {end}:", selection.flat_type());
        for mean in ranking.ranked() {
            let marker = if ranking.top().contains(&mean.group) {
                "+"
            } else if ranking.bottom().contains(&mean.group) {
                "-"
            } else {
                " "
            };
            println!("  {marker} {:<20} {:>12.0}", mean.group, mean.mean);
        }
    } else {
        println!("\nNo town prices for {}", selection.flat_type());
    }
}

async fn replay(
    mut dashboard: Dashboard,
    api: Arc<dyn PriceApi>,
    script: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(script)?;
    let script = EventScript::from_toml_str(&text)?;
    log::info!("Replaying {} events", script.events.len());

    dashboard.subscribe(Box::new(MapSync::new(PrintMap)));
    dashboard.subscribe(Box::new(TrendView::new(PrintTrend)));
    dashboard.subscribe(Box::new(TimelineView::new(PrintTimeline)));
    dashboard.subscribe(Box::new(ControlsView::new(PrintControls)));

    let (tx, rx) = mpsc::channel(script.events.len().max(1));
    for event in script.events {
        tx.send(event).await?;
    }
    drop(tx);

    let stats = run_session(&mut dashboard, api, rx).await;
    println!(
        "\n{} events, {} street requests ({} applied, {} discarded)",
        stats.events, stats.requests, stats.applied, stats.discarded
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let mut config = DashboardConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Summary { flat_type } => {
            if let Some(flat_type) = flat_type {
                config.defaults.flat_type = flat_type;
            }
            let (dashboard, _) = load(config).await?;
            summary(&dashboard);
        }
        Commands::Replay { script } => {
            let (dashboard, api) = load(config).await?;
            replay(dashboard, api, &script).await?;
        }
    }

    Ok(())
}
