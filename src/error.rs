//! Error types for the obscuration search.

use thiserror::Error;

/// Result type alias for operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort an obscuration search.
///
/// None of these are retried or recovered from internally: the search
/// either yields a definite timestamp or one of these failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Latitude outside -90 to +90 degrees.
    #[error("invalid latitude {0}° (must be between -90° and +90°)")]
    InvalidLatitude(f64),

    /// Longitude outside -180 to +180 degrees.
    #[error("invalid longitude {0}° (must be between -180° and +180°)")]
    InvalidLongitude(f64),

    /// Target altitude angle outside -90 to +90 degrees, or not finite.
    #[error("invalid target altitude {0}° (must be between -90° and +90°)")]
    InvalidTargetAltitude(f64),

    /// Non-positive terrain sampling interval.
    #[error("invalid sample step {0} m (must be positive)")]
    InvalidSampleStep(f64),

    /// No elevation data covers the queried point. A single missing
    /// sample invalidates the whole scan, so this is terminal.
    #[error("no elevation data covers {lat:.5}°, {lon:.5}°")]
    DataUnavailable {
        /// Latitude of the unresolved query, degrees.
        lat: f64,
        /// Longitude of the unresolved query, degrees.
        lon: f64,
    },

    /// The search-bound root finder failed to converge.
    #[error(
        "search-bound solver did not converge \
         (target altitude {target_altitude}°, observer elevation {observer_elevation} m)"
    )]
    Convergence {
        /// Target altitude the bound was being solved for, degrees.
        target_altitude: f64,
        /// Observer elevation, meters.
        observer_elevation: f64,
    },

    /// Observer and target coincide; the line-of-sight angle is undefined.
    #[error("degenerate geometry: observer and target coincide")]
    DegenerateGeometry,

    /// The driver hit its iteration cap without finding an obscured instant.
    #[error("sun not obscured by terrain within {ticks} time steps")]
    SearchExhausted {
        /// Number of instants examined before giving up.
        ticks: u32,
    },

    /// An elevation tile file exists but is not a valid HGT grid.
    #[error("malformed elevation tile {name}: {reason}")]
    TileFormat {
        /// File name of the offending tile.
        name: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// Solar position computation failed.
    #[error("solar position: {0}")]
    SolarPosition(#[from] solar_positioning::Error),

    /// I/O failure while reading elevation data.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
