//! Command-Line Interface Module
//!
//! Handles argument parsing and validation for the shadefall binary.

use std::path::PathBuf;

use clap::Parser;

// ===================== CLI =====================

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Observer latitude in decimal degrees (-90 to 90)
    #[arg(long, allow_hyphen_values = true, value_parser = parse_latitude, env = "SHADEFALL_LATITUDE")]
    pub latitude: f64,

    /// Observer longitude in decimal degrees (-180 to 180)
    #[arg(long, allow_hyphen_values = true, value_parser = parse_longitude, env = "SHADEFALL_LONGITUDE")]
    pub longitude: f64,

    /// Start of the search, ISO 8601 with offset (e.g. 2024-08-12T18:00:00+03:00)
    #[arg(long)]
    pub start: String,

    /// Directory holding SRTM .hgt tiles (e.g. N45E006.hgt)
    #[arg(long, default_value = "tiles", env = "SHADEFALL_TILES")]
    pub tiles: PathBuf,

    /// Search cadence in minutes
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub time_step: u32,

    /// Terrain sampling interval along the scan bearing, in meters
    #[arg(long, default_value_t = 30.0, value_parser = parse_sample_step)]
    pub sample_step: f64,

    /// Give up after this many search steps (0 searches indefinitely)
    #[arg(long, default_value_t = 1440)]
    pub max_ticks: u32,
}

// ===================== CLI VALUE PARSERS =====================

fn parse_latitude(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(-90.0..=90.0).contains(&v) {
        return Err(format!("Latitude must be between -90 and 90, got {}", v));
    }
    Ok(v)
}

fn parse_longitude(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(-180.0..=180.0).contains(&v) {
        return Err(format!("Longitude must be between -180 and 180, got {}", v));
    }
    Ok(v)
}

fn parse_sample_step(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("Invalid number: {}", s))?;
    if !(v > 0.0) || !v.is_finite() {
        return Err(format!("Sample step must be positive, got {}", v));
    }
    Ok(v)
}

// ===================== TESTS =====================
