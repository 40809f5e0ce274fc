use anyhow::{Context, Result};
use chainage::osm::{line_geometry, load_geojson};
use chainage::stations::{attach_chainage, chainage_label, StationTable};
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(name = "chainage")]
#[command(about = "Compute each station's distance along a rail line from the line's first vertex.", long_about = None)]
struct Cli {
    /// Path to the stations CSV, with lat/lon columns
    #[arg(short, long)]
    stations: String,

    /// Path to the GeoJSON holding the line geometry
    #[arg(short, long)]
    geojson: String,

    /// Use the first line whose name contains this text (case-insensitive)
    #[arg(short, long)]
    line_name: Option<String>,

    /// Output CSV with chainage_m and offset_m columns. If omitted, prints chainages to stdout.
    #[arg(short, long)]
    out: Option<String>,

    /// Column holding the station name, used when printing to stdout
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
    let line = line_geometry(&geojson, cli.line_name.as_deref())?;
    info!(
        "Line has {} vertices, {:.1} m long",
        line.len(),
        line.length_m()
    );

    let summary = attach_chainage(&mut table, &line)?;

    if let Some(out_path) = cli.out {
        table
            .to_path(&out_path)
            .with_context(|| format!("writing CSV {}", &out_path))?;
        println!("Wrote chainages for {} stations to {}", summary.computed, out_path);
    } else {
        let name_idx = table.column(&cli.name_column).ok();
        for row in 0..table.len() {
            let name = name_idx.map_or("", |idx| table.get(row, idx));
            println!("{}, {}", name, chainage_label(&table, row)?);
        }
    }

    if summary.undetermined + summary.missing_coordinates > 0 {
        println!(
            "{} stations without coordinates, {} with undetermined chainage",
            summary.missing_coordinates, summary.undetermined
        );
    }

    Ok(())
}
