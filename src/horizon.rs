//! Terrain Horizon Module
//!
//! Decides whether terrain along a bearing rises above a target altitude
//! angle. The scan distance is bounded by a conservative spherical
//! envelope: beyond the solved bound, not even terrain at the highest
//! elevation on Earth could appear at or above the target altitude.

use ::geo::{Destination, Geodesic, Point};
use log::trace;

use crate::elevation::ElevationSource;
use crate::error::{Error, Result};
use crate::geo::{A_EQUATOR, GeodeticPoint, line_of_sight_altitude};

// ===================== CONSTANTS =====================

/// Radius of the sphere circumscribing the WGS84 ellipsoid.
const SPHERE_RADIUS: f64 = A_EQUATOR;

/// Highest terrain elevation on Earth plus error margin (Everest), meters.
const MAX_TERRAIN_ELEVATION: f64 = 8000.0;

/// Fractional inflation of the solved bound, absorbing the error of the
/// spherical approximation.
const BOUND_MARGIN: f64 = 0.05;

/// Initial Newton iterate for the bound equation, radians of arc.
const NEWTON_SEED: f64 = 0.1;

/// Step-size convergence tolerance, radians (~0.6 mm of arc).
const NEWTON_TOLERANCE: f64 = 1e-10;

const NEWTON_MAX_ITERATIONS: u32 = 100;

// ===================== SEARCH BOUND =====================

/// Distance in meters beyond which no terrain point, even one at
/// [`MAX_TERRAIN_ELEVATION`], could appear at or above `target_altitude`
/// as seen from an observer at `observer_elevation`.
///
/// Solves for the central angle t of the spherical triangle with leg
/// lengths (R + observer elevation) and (R + max elevation), where the
/// law of cosines links the third side to the target altitude:
///
/// sin²t · (R+h₂)² = cos²α · ((R+h₁)² + (R+h₂)² − 2(R+h₁)(R+h₂)·cos t)
///
/// The equation has no closed-form inverse; Newton's method with the
/// analytic derivative finds the root. The returned arc length R·t is
/// inflated by [`BOUND_MARGIN`].
///
/// # Errors
/// Returns `Convergence` if the iteration does not settle; the bound is
/// undefined then and must never be substituted with an arbitrary
/// distance. Out-of-range latitude or target altitude is rejected.
pub fn max_search_distance(
    observer_latitude: f64,
    observer_elevation: f64,
    target_altitude: f64,
) -> Result<f64> {
    if !(-90.0..=90.0).contains(&observer_latitude) {
        return Err(Error::InvalidLatitude(observer_latitude));
    }
    if !(-90.0..=90.0).contains(&target_altitude) {
        return Err(Error::InvalidTargetAltitude(target_altitude));
    }

    let r1 = SPHERE_RADIUS + observer_elevation;
    let r2 = SPHERE_RADIUS + MAX_TERRAIN_ELEVATION;
    let cos_sq = target_altitude.to_radians().cos().powi(2);

    let f = |t: f64| {
        t.sin().powi(2) * r2 * r2 - cos_sq * (r1 * r1 + r2 * r2 - 2.0 * r1 * r2 * t.cos())
    };
    let df = |t: f64| (2.0 * t).sin() * r2 * r2 - 2.0 * r1 * r2 * cos_sq * t.sin();

    let mut t = NEWTON_SEED;
    for _ in 0..NEWTON_MAX_ITERATIONS {
        let slope = df(t);
        if slope == 0.0 || !slope.is_finite() {
            break;
        }
        let step = f(t) / slope;
        t -= step;
        if !t.is_finite() {
            break;
        }
        // The residual is even in t; fold a sign flip back onto the
        // positive branch.
        t = t.abs();
        if step.abs() < NEWTON_TOLERANCE {
            return Ok(SPHERE_RADIUS * t * (1.0 + BOUND_MARGIN));
        }
    }

    Err(Error::Convergence { target_altitude, observer_elevation })
}

// ===================== HORIZON SCAN =====================

/// First terrain sample found to rise above the target altitude.
#[derive(Debug, Clone, Copy)]
pub struct Obstruction {
    /// Geodesic distance from the observer, meters
    pub distance: f64,
    /// The obstructing terrain sample
    pub point: GeodeticPoint,
    /// Its apparent altitude from the observer, degrees
    pub altitude: f64,
}

/// Scan terrain samples along `bearing` at fixed `step` increments and
/// return the first one whose line-of-sight altitude strictly exceeds
/// `target_altitude`, or `None` if the bounded scan completes clear.
///
/// The scan is a deliberate sampled approximation: features narrower
/// than `step` can fall between samples. The trade-off bounds the
/// elevation query count.
///
/// # Errors
/// Propagates bound-solver failures, elevation data gaps, and
/// degenerate geometry; a scan never returns a partial verdict.
pub fn first_obstruction<E: ElevationSource>(
    observer: &GeodeticPoint,
    bearing: f64,
    target_altitude: f64,
    elevation: &mut E,
    step: f64,
) -> Result<Option<Obstruction>> {
    if !(step > 0.0) || !step.is_finite() {
        return Err(Error::InvalidSampleStep(step));
    }

    let max_distance =
        max_search_distance(observer.latitude, observer.elevation, target_altitude)?;
    trace!("scanning bearing {bearing:.2}° out to {max_distance:.0} m in {step} m steps");

    // geo points are (x, y) = (lon, lat)
    let origin = Point::new(observer.longitude, observer.latitude);

    let mut distance = step;
    while distance < max_distance {
        let dest = Geodesic.destination(origin, bearing, distance);
        let sample_elevation = elevation.elevation_at(dest.y(), dest.x())?;
        let sample = GeodeticPoint::new(dest.y(), dest.x(), sample_elevation)?;

        let altitude = line_of_sight_altitude(observer, &sample)?;
        if altitude > target_altitude {
            return Ok(Some(Obstruction { distance, point: sample, altitude }));
        }

        distance += step;
    }

    Ok(None)
}

/// Whether any terrain along `bearing` rises above `target_altitude`
/// within the solved search bound.
///
/// # Errors
/// Same failure modes as [`first_obstruction`].
pub fn is_occluded<E: ElevationSource>(
    observer: &GeodeticPoint,
    bearing: f64,
    target_altitude: f64,
    elevation: &mut E,
    step: f64,
) -> Result<bool> {
    Ok(first_obstruction(observer, bearing, target_altitude, elevation, step)?.is_some())
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;

    /// Uniform elevation everywhere.
    struct Flat(f64);

    impl ElevationSource for Flat {
        fn elevation_at(&mut self, _lat: f64, _lon: f64) -> Result<f64> {
            Ok(self.0)
        }
    }

    /// Flat plain with a wall east of a longitude threshold.
    struct WallEast {
        threshold_lon: f64,
        height: f64,
    }

    impl ElevationSource for WallEast {
        fn elevation_at(&mut self, _lat: f64, lon: f64) -> Result<f64> {
            if lon > self.threshold_lon { Ok(self.height) } else { Ok(0.0) }
        }
    }

    struct NoData;

    impl ElevationSource for NoData {
        fn elevation_at(&mut self, lat: f64, lon: f64) -> Result<f64> {
            Err(Error::DataUnavailable { lat, lon })
        }
    }

    #[test]
    fn test_bound_is_finite_and_positive() {
        let d = max_search_distance(45.0, 0.0, 10.0).unwrap();
        assert!(d.is_finite());
        // Small-angle analysis of the relation puts the root near 44.4 km
        // of arc, 46.6 km with the 5% margin.
        assert!((40_000.0..60_000.0).contains(&d), "bound {d} m out of range");
    }

    #[test]
    fn test_bound_matches_independent_bisection() {
        let (observer_elevation, target_altitude): (f64, f64) = (0.0, 10.0);

        let r1 = SPHERE_RADIUS + observer_elevation;
        let r2 = SPHERE_RADIUS + MAX_TERRAIN_ELEVATION;
        let cos_sq: f64 = target_altitude.to_radians().cos().powi(2);
        let f = |t: f64| {
            t.sin().powi(2) * r2 * r2 - cos_sq * (r1 * r1 + r2 * r2 - 2.0 * r1 * r2 * t.cos())
        };

        // The residual is negative at t = 0 and positive at the seed, so
        // this bracket holds exactly one root: the first crossing.
        let (mut lo, mut hi) = (0.0_f64, NEWTON_SEED);
        assert!(f(lo) < 0.0 && f(hi) > 0.0);
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if f(mid) < 0.0 { lo = mid } else { hi = mid }
        }
        let expected = SPHERE_RADIUS * 0.5 * (lo + hi) * (1.0 + BOUND_MARGIN);

        let d = max_search_distance(45.0, observer_elevation, target_altitude).unwrap();
        assert!(
            (d - expected).abs() < 1.0,
            "Newton {d} m vs bisection {expected} m"
        );
    }

    #[test]
    fn test_bound_monotone_in_target_altitude() {
        // A lower required altitude means scanning farther.
        let mut previous = 0.0;
        for target in [60.0, 30.0, 10.0, 5.0, 1.0] {
            let d = max_search_distance(45.0, 0.0, target).unwrap();
            assert!(d > previous, "bound not monotone at {target}°: {d} m");
            previous = d;
        }
    }

    #[test]
    fn test_zenith_target_collapses_bound() {
        // Nothing can rise above the zenith; the bound degenerates to ~0.
        let d = max_search_distance(45.0, 0.0, 90.0).unwrap();
        assert!(d >= 0.0 && d < 1.0, "zenith bound {d} m");

        let d = max_search_distance(45.0, 0.0, -90.0).unwrap();
        assert!(d >= 0.0 && d < 1.0, "nadir bound {d} m");
    }

    #[test]
    fn test_bound_input_validation() {
        assert!(matches!(
            max_search_distance(95.0, 0.0, 10.0),
            Err(Error::InvalidLatitude(_))
        ));
        assert!(matches!(
            max_search_distance(45.0, 0.0, 120.0),
            Err(Error::InvalidTargetAltitude(_))
        ));
        assert!(max_search_distance(45.0, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_flat_terrain_never_occludes() {
        let observer = GeodeticPoint::new(45.0, 7.0, 0.0).unwrap();
        let occluded = is_occluded(&observer, 90.0, 1.0, &mut Flat(0.0), 200.0).unwrap();
        assert!(!occluded);
    }

    #[test]
    fn test_wall_occludes() {
        let observer = GeodeticPoint::new(45.0, 7.0, 0.0).unwrap();
        // 0.055° of longitude at 45°N is ~4.3 km; a 1000 m wall there
        // subtends ~13°, far above the 1° target.
        let mut wall = WallEast { threshold_lon: 7.055, height: 1000.0 };

        let hit = first_obstruction(&observer, 90.0, 1.0, &mut wall, 30.0)
            .unwrap()
            .expect("wall should occlude");
        assert!(
            (4_200.0..4_700.0).contains(&hit.distance),
            "hit at {} m",
            hit.distance
        );
        assert!(hit.altitude > 1.0);
        assert!(hit.point.longitude > 7.055);
    }

    #[test]
    fn test_scan_is_deterministic() {
        let observer = GeodeticPoint::new(45.0, 7.0, 0.0).unwrap();
        let mut wall = WallEast { threshold_lon: 7.055, height: 1000.0 };

        let first = first_obstruction(&observer, 90.0, 1.0, &mut wall, 30.0)
            .unwrap()
            .unwrap();
        let second = first_obstruction(&observer, 90.0, 1.0, &mut wall, 30.0)
            .unwrap()
            .unwrap();
        assert_eq!(first.distance, second.distance);
        assert_eq!(first.altitude, second.altitude);
    }

    #[test]
    fn test_data_gap_aborts_scan() {
        let observer = GeodeticPoint::new(45.0, 7.0, 0.0).unwrap();
        assert!(matches!(
            is_occluded(&observer, 90.0, 1.0, &mut NoData, 200.0),
            Err(Error::DataUnavailable { .. })
        ));
    }

    #[test]
    fn test_invalid_step_rejected() {
        let observer = GeodeticPoint::new(45.0, 7.0, 0.0).unwrap();
        assert!(matches!(
            is_occluded(&observer, 90.0, 1.0, &mut Flat(0.0), 0.0),
            Err(Error::InvalidSampleStep(_))
        ));
        assert!(is_occluded(&observer, 90.0, 1.0, &mut Flat(0.0), -30.0).is_err());
    }
}
