use anyhow::{Context, Result};
use chainage::osm::{load_geojson, station_nodes};
use chainage::stations::{attach_coordinates, StationMatcher, StationTable};
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(name = "match")]
#[command(about = "Match station rows to named point features of a GeoJSON export and fill in their coordinates.", long_about = None)]
struct Cli {
    /// Path to the stations CSV
    #[arg(short, long)]
    stations: String,

    /// Path to the GeoJSON export (e.g. from Overpass Turbo)
    #[arg(short, long)]
    geojson: String,

    /// Output CSV with lat/lon columns filled in
    #[arg(short, long, default_value_t = String::from("stations_with_coords.csv"))]
    out: String,

    /// Column holding the station name
    #[arg(long, default_value_t = String::from("station_name"))]
    name_column: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut table = StationTable::from_path(&cli.stations)
        .with_context(|| format!("reading stations CSV {}", &cli.stations))?;
    let geojson =
        load_geojson(&cli.geojson).with_context(|| format!("loading GeoJSON {}", &cli.geojson))?;
    let nodes = station_nodes(&geojson)?;
    info!(
        "Loaded {} stations and {} point features",
        table.len(),
        nodes.len()
    );

    let matcher = StationMatcher::new(&nodes);
    let summary = attach_coordinates(&mut table, &matcher, &cli.name_column)?;

    table
        .to_path(&cli.out)
        .with_context(|| format!("writing CSV {}", &cli.out))?;

    println!(
        "Matched {} of {} stations",
        summary.matched,
        summary.matched + summary.unmatched.len()
    );
    if !summary.unmatched.is_empty() {
        println!("Unmatched: {}", summary.unmatched.join(", "));
    }
    println!(
        "Wrote {} - review and manually fix unmatched stations.",
        cli.out
    );

    Ok(())
}
