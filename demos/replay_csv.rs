use std::env;

use argoatlas::atlas_errors::AtlasError;
use argoatlas::constants::ResolutionLevel;
use argoatlas::params::AtlasParams;
use argoatlas::reports::csv_reader::read_reports_from_path;
use argoatlas::Atlas;
use tracing_subscriber::EnvFilter;

/// Replay an AIS CSV export through the whole pipeline and print what the map would show.
///
/// Usage:
///   replay_csv [PATH] [--top N]
/// Example:
///   RUST_LOG=argoatlas=debug replay_csv tests/data/ais_sample.csv --top 5
fn main() -> Result<(), AtlasError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("argoatlas=info")),
        )
        .init();

    let mut args = env::args().skip(1).collect::<Vec<_>>();
    let top = match args.iter().position(|a| a == "--top") {
        Some(pos) => {
            args.remove(pos);
            if pos < args.len() {
                args.remove(pos).parse().unwrap_or(10)
            } else {
                10
            }
        }
        None => 10,
    };
    let path = args
        .first()
        .cloned()
        .unwrap_or_else(|| "tests/data/ais_sample.csv".to_string());

    let params = AtlasParams::default();
    println!("{params:#}\n");

    let atlas = Atlas::new(params);
    let reports = read_reports_from_path(&path)?;
    let summary = atlas.ingest_all(&reports)?;
    println!("{path}: {summary}");

    atlas.aggregate_all()?;
    for stats in atlas.flow_stats(top)? {
        println!("\n{stats:#}");
    }

    let bundling = atlas.run_bundling()?;
    println!(
        "\nBundling: {} passes, {} merges, {} nodes, {:.1} km of ink saved ({:.1} -> {:.1} km)",
        bundling.passes,
        bundling.merges,
        bundling.nodes,
        bundling.ink_saved / 1000.0,
        bundling.ink_before / 1000.0,
        bundling.ink_after / 1000.0
    );
    println!("Render edges: {}", atlas.bundled_edges()?.len());

    let coarse = atlas.flows(ResolutionLevel::Coarse, 1)?;
    println!("Coarse flows on the world map: {}", coarse.len());
    Ok(())
}
