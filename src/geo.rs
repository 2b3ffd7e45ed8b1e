//! Ellipsoid Geometry Module
//!
//! WGS84 constants, geodetic-to-ECEF conversion, and the line-of-sight
//! altitude angle between two points on (or above) the reference ellipsoid.

use nalgebra::Vector3;

use crate::error::{Error, Result};

// ===================== CONSTANTS =====================

/// WGS84 semi-major axis (equatorial radius) in meters
pub const A_EQUATOR: f64 = 6_378_137.0;

/// WGS84 flattening
pub const FLATTENING: f64 = 1.0 / 298.257_223_563;

/// WGS84 semi-minor axis (polar radius) in meters, derived as a·(1−f)
pub const B_POLAR: f64 = A_EQUATOR * (1.0 - FLATTENING);

/// First eccentricity squared, e² = f·(2−f)
const E_SQ: f64 = FLATTENING * (2.0 - FLATTENING);

/// Two points closer than this (meters, in ECEF) have no defined
/// line-of-sight direction.
const DEGENERATE_DISTANCE: f64 = 1e-9;

// ===================== TYPES =====================

/// A point in WGS84 geodetic coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodeticPoint {
    /// Latitude in degrees, positive north
    pub latitude: f64,
    /// Longitude in degrees, positive east
    pub longitude: f64,
    /// Elevation in meters above the reference ellipsoid
    pub elevation: f64,
}

impl GeodeticPoint {
    /// Create a point, validating coordinate ranges.
    ///
    /// # Errors
    /// Returns `InvalidLatitude` or `InvalidLongitude` for out-of-range
    /// or non-finite coordinates.
    pub fn new(latitude: f64, longitude: f64, elevation: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidLatitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidLongitude(longitude));
        }
        Ok(Self { latitude, longitude, elevation })
    }
}

// ===================== GEOMETRY FUNCTIONS =====================

/// Convert a geodetic point to Earth-centered Earth-fixed coordinates.
///
/// Uses the standard prime-vertical radius N(φ) = a / √(1 − e²·sin²φ).
///
/// # Returns
/// ECEF position vector in meters
pub fn geodetic_to_ecef(p: &GeodeticPoint) -> Vector3<f64> {
    let (sin_lat, cos_lat) = p.latitude.to_radians().sin_cos();
    let (sin_lon, cos_lon) = p.longitude.to_radians().sin_cos();

    let n = A_EQUATOR / (1.0 - E_SQ * sin_lat * sin_lat).sqrt();

    Vector3::new(
        (n + p.elevation) * cos_lat * cos_lon,
        (n + p.elevation) * cos_lat * sin_lon,
        (n * (1.0 - E_SQ) + p.elevation) * sin_lat,
    )
}

/// Outward unit surface normal of the ellipsoid at an ECEF position.
///
/// This is the gradient of the implicit equation x²/a² + y²/a² + z²/b² = 1,
/// normalized to unit length. It is the correct local "up" on the oblate
/// ellipsoid; the geocentric radius vector differs from it by up to ~0.2°
/// at mid latitudes.
fn surface_normal(ecef: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(
        ecef.x / (A_EQUATOR * A_EQUATOR),
        ecef.y / (A_EQUATOR * A_EQUATOR),
        ecef.z / (B_POLAR * B_POLAR),
    )
    .normalize()
}

/// Angle of `target` above (+) or below (−) the observer's local
/// horizontal plane, in degrees.
///
/// # Errors
/// Returns `DegenerateGeometry` if the two points coincide; the angle
/// is undefined there and must not silently become NaN.
pub fn line_of_sight_altitude(observer: &GeodeticPoint, target: &GeodeticPoint) -> Result<f64> {
    let p = geodetic_to_ecef(observer);
    let s = geodetic_to_ecef(target);

    let direction = s - p;
    let length = direction.norm();
    if !(length > DEGENERATE_DISTANCE) {
        return Err(Error::DegenerateGeometry);
    }

    let up = surface_normal(&p);
    let sin_altitude = (up.dot(&direction) / length).clamp(-1.0, 1.0);
    Ok(sin_altitude.asin().to_degrees())
}

// ===================== TESTS =====================
