//! Obscuration Search Module
//!
//! The time-stepping driver: advances a timestamp at a fixed cadence,
//! asks the sun provider for the apparent solar position at each
//! instant, and stops at the first instant where the terrain horizon
//! scan reports occlusion.

use std::fmt::Display;

use chrono::{DateTime, Datelike, Duration, TimeZone};
use log::{debug, info};
use solar_positioning::{spa, time::DeltaT, types::RefractionCorrection};

use crate::elevation::ElevationSource;
use crate::error::{Error, Result};
use crate::geo::GeodeticPoint;
use crate::horizon::first_obstruction;

// ===================== SUN PROVIDER =====================

/// Apparent solar altitude and azimuth at one instant, for a fixed
/// observer.
#[derive(Debug, Clone, Copy)]
pub struct SunSample {
    /// Apparent altitude above the local horizontal plane, degrees
    pub altitude: f64,
    /// Azimuth, degrees clockwise from north
    pub azimuth: f64,
}

/// Source of apparent solar positions over time.
pub trait SunProvider<Tz: TimeZone> {
    /// Solar position at instant `t`.
    ///
    /// # Errors
    /// Implementation-defined; the driver treats any failure as fatal.
    fn position(&self, t: &DateTime<Tz>) -> Result<SunSample>;
}

/// SPA-backed sun provider (NREL Solar Position Algorithm) with
/// standard atmospheric refraction, so reported altitudes are apparent,
/// not geometric.
pub struct SpaSun {
    observer: GeodeticPoint,
    delta_t: f64,
    refraction: Option<RefractionCorrection>,
}

impl SpaSun {
    /// Provider for `observer` with an explicit ΔT value.
    pub fn new(observer: GeodeticPoint, delta_t: f64) -> Self {
        Self { observer, delta_t, refraction: Some(RefractionCorrection::standard()) }
    }

    /// Provider with ΔT estimated from the search's start date. The
    /// estimate drifts by well under a second over any plausible search
    /// horizon, so one value serves the whole search.
    ///
    /// # Errors
    /// Returns an error if the date is outside the ΔT model's validity.
    pub fn for_start_date<Tz: TimeZone>(
        observer: GeodeticPoint,
        start: &DateTime<Tz>,
    ) -> Result<Self> {
        let delta_t = DeltaT::estimate_from_date(start.year(), start.month())?;
        Ok(Self::new(observer, delta_t))
    }
}

impl<Tz: TimeZone> SunProvider<Tz> for SpaSun {
    fn position(&self, t: &DateTime<Tz>) -> Result<SunSample> {
        let position = spa::solar_position(
            t.clone(),
            self.observer.latitude,
            self.observer.longitude,
            self.observer.elevation,
            self.delta_t,
            self.refraction,
        )?;
        Ok(SunSample {
            altitude: position.elevation_angle(),
            azimuth: position.azimuth(),
        })
    }
}

// ===================== DRIVER =====================

/// Tuning knobs of the time-stepping search.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    /// Interval between examined instants
    pub time_step: Duration,
    /// Terrain sampling interval along the scan bearing, meters
    pub sample_step: f64,
    /// Cap on examined instants; `None` searches indefinitely
    pub max_ticks: Option<u32>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            time_step: Duration::minutes(1),
            sample_step: 30.0,
            max_ticks: Some(1440), // 24 hours of 1-minute ticks
        }
    }
}

/// Find the first instant at or after `start` at which terrain occludes
/// direct sunlight at `observer`.
///
/// The observer's elevation is taken from the point itself and held
/// fixed for the whole search. Blocks until found or failed; there is
/// no cancellation.
///
/// # Errors
/// Propagates sun-provider, bound-solver, and elevation failures, and
/// returns `SearchExhausted` if `max_ticks` instants pass without
/// occlusion. No partial result is ever returned.
pub fn find_obscuration_time<Tz, S, E>(
    observer: &GeodeticPoint,
    start: DateTime<Tz>,
    sun: &S,
    elevation: &mut E,
    params: &SearchParams,
) -> Result<DateTime<Tz>>
where
    Tz: TimeZone,
    Tz::Offset: Display,
    S: SunProvider<Tz>,
    E: ElevationSource,
{
    let mut t = start;
    let mut ticks = 0u32;

    loop {
        if let Some(cap) = params.max_ticks
            && ticks >= cap
        {
            return Err(Error::SearchExhausted { ticks });
        }

        let sun_position = sun.position(&t)?;
        debug!(
            "checking {t}: sun altitude {:.3}°, azimuth {:.3}°",
            sun_position.altitude, sun_position.azimuth
        );

        if let Some(hit) = first_obstruction(
            observer,
            sun_position.azimuth,
            sun_position.altitude,
            elevation,
            params.sample_step,
        )? {
            info!(
                "terrain {:.0} m away rises to {:.3}°, above the sun at {:.3}°",
                hit.distance, hit.altitude, sun_position.altitude
            );
            return Ok(t);
        }

        t = t + params.time_step;
        ticks += 1;
    }
}

// ===================== TESTS =====================
