use anyhow::Context;
use chrono::{DateTime, Duration, FixedOffset};
use clap::Parser;

mod cli;
mod elevation;
mod error;
mod geo;
mod horizon;
mod search;

use cli::Args;
use elevation::{ElevationSource, HgtDirectory, TileCache};
use geo::GeodeticPoint;
use search::{SearchParams, SpaSun, find_obscuration_time};

// ===================== MAIN =====================

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start: DateTime<FixedOffset> = args.start.parse().with_context(|| {
        format!("invalid start time {:?} (expected ISO 8601 with offset)", args.start)
    })?;

    let mut elevation = TileCache::new(HgtDirectory::new(&args.tiles));

    // The observer's own elevation is looked up once and held fixed for
    // the whole search.
    let observer_elevation = elevation
        .elevation_at(args.latitude, args.longitude)
        .context("observer elevation lookup failed")?;
    let observer = GeodeticPoint::new(args.latitude, args.longitude, observer_elevation)?;

    let sun = SpaSun::for_start_date(observer, &start)?;
    let params = SearchParams {
        time_step: Duration::minutes(i64::from(args.time_step)),
        sample_step: args.sample_step,
        max_ticks: (args.max_ticks > 0).then_some(args.max_ticks),
    };

    println!(
        "Observer: {:.5}°, {:.5}° at {:.0} m",
        observer.latitude, observer.longitude, observer.elevation
    );
    println!("Searching from {start} in {}-minute steps", args.time_step);

    let found = find_obscuration_time(&observer, start, &sun, &mut elevation, &params)?;
    println!("Sun obscured by terrain at: {found}");

    Ok(())
}
