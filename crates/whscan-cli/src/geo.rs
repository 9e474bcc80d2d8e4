//! `geo` command handlers: read-only queries against the warehouse table,
//! printed as JSON.

use std::path::Path;

use anyhow::Context;
use clap::Subcommand;
use serde::Serialize;
use whscan_geo::WarehouseTable;

/// Sub-commands available under `geo`.
#[derive(Debug, Subcommand)]
pub enum GeoCommands {
    /// Look up warehouses by number; unknown numbers are reported, not dropped
    Lookup {
        #[arg(required = true)]
        numbers: Vec<u32>,
    },
    /// Find warehouses by number or by text in name, city, or address
    Search {
        query: String,
    },
    /// List every warehouse in a state (two-letter code)
    State {
        code: String,
    },
    /// Warehouses closest to a point, nearest first
    Nearest {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Number of warehouses to return
        #[arg(short, long, default_value_t = 5)]
        k: usize,
    },
    /// Warehouses within a radius of a point, nearest first
    Within {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Radius in miles
        #[arg(long)]
        miles: f64,
    },
    /// Record count, per-state counts, and bounding box
    Stats,
}

/// Loads the table at `path` and prints the answer to `command`.
///
/// # Errors
///
/// Returns an error if the table cannot be loaded.
pub(crate) fn run_geo(path: &Path, command: &GeoCommands) -> anyhow::Result<()> {
    let table = WarehouseTable::load(path)
        .with_context(|| format!("failed to load warehouse table from {}", path.display()))?;

    match command {
        GeoCommands::Lookup { numbers } => print_json(&table.resolve(numbers)),
        GeoCommands::Search { query } => print_json(&table.search(query)),
        GeoCommands::State { code } => print_json(&table.by_state(code)),
        GeoCommands::Nearest { lat, lon, k } => print_json(&table.nearest(*lat, *lon, *k)),
        GeoCommands::Within { lat, lon, miles } => {
            print_json(&table.within_radius(*lat, *lon, *miles))
        }
        GeoCommands::Stats => print_json(&serde_json::json!({
            "stats": table.stats(),
            "bounds": table.bounds(),
        })),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
