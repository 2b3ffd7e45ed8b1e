//! Elevation Data Module
//!
//! Terrain elevation lookups backed by SRTM `.hgt` tiles, memoized per
//! integer-degree tile for the lifetime of a search session. Tile
//! acquisition (download, authentication) is out of scope; a
//! [`TileLoader`] only has to produce raw tile bytes from somewhere.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use log::info;

use crate::error::{Error, Result};

/// SRTM sentinel for cells with no valid measurement.
const HGT_VOID: i16 = -32768;

/// Grid edge lengths of 1-arc-second and 3-arc-second SRTM tiles.
const HGT_SIZES: [usize; 2] = [3601, 1201];

// ===================== SOURCE CONTRACT =====================

/// Terrain elevation at a geodetic coordinate, meters above the
/// reference ellipsoid.
///
/// Lookups may mutate internal caches; a source is owned by a single
/// search session.
pub trait ElevationSource {
    /// Elevation at the given point.
    ///
    /// # Errors
    /// Returns `DataUnavailable` when no data covers the point.
    fn elevation_at(&mut self, lat: f64, lon: f64) -> Result<f64>;
}

// ===================== TILE KEYING =====================

/// Cache key of a one-degree elevation tile: the floor of latitude and
/// longitude, matching the SRTM file naming convention (a tile is named
/// after its south-west corner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    /// Southern edge latitude, degrees
    pub lat: i32,
    /// Western edge longitude, degrees
    pub lon: i32,
}

impl TileKey {
    /// Key of the tile covering a point.
    pub fn for_point(lat: f64, lon: f64) -> Self {
        Self { lat: lat.floor() as i32, lon: lon.floor() as i32 }
    }

    /// Conventional file name, e.g. `N45E006.hgt` or `S34W071.hgt`.
    pub fn file_name(&self) -> String {
        let ns = if self.lat < 0 { 'S' } else { 'N' };
        let ew = if self.lon < 0 { 'W' } else { 'E' };
        format!("{}{:02}{}{:03}.hgt", ns, self.lat.abs(), ew, self.lon.abs())
    }
}

// ===================== HGT TILES =====================

/// One decoded SRTM tile: a square grid of big-endian signed 16-bit
/// elevations, row 0 at the northern edge.
pub struct HgtTile {
    size: usize,
    samples: Vec<i16>,
}

impl HgtTile {
    /// Decode a raw `.hgt` byte buffer.
    ///
    /// # Errors
    /// Returns `TileFormat` if the length is not a 1201² or 3601² grid
    /// of 16-bit samples.
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        let size = HGT_SIZES
            .iter()
            .copied()
            .find(|n| n * n * 2 == bytes.len())
            .ok_or_else(|| Error::TileFormat {
                name: name.to_string(),
                reason: "length is not a 1201x1201 or 3601x3601 grid of 16-bit samples",
            })?;

        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
            .collect();

        Ok(Self { size, samples })
    }

    /// Nearest-neighbor sample at a point inside this tile's degree cell.
    fn sample(&self, key: TileKey, lat: f64, lon: f64) -> Result<f64> {
        let cells = (self.size - 1) as f64;
        let row = ((f64::from(key.lat) + 1.0 - lat) * cells).round().clamp(0.0, cells) as usize;
        let col = ((lon - f64::from(key.lon)) * cells).round().clamp(0.0, cells) as usize;

        let value = self.samples[row * self.size + col];
        if value == HGT_VOID {
            return Err(Error::DataUnavailable { lat, lon });
        }
        Ok(f64::from(value))
    }
}

// ===================== LOADING & CACHING =====================

/// Produces tiles on cache misses.
pub trait TileLoader {
    /// Load the tile for `key`.
    ///
    /// # Errors
    /// Returns `DataUnavailable` when no tile exists for the key.
    fn load(&mut self, key: TileKey) -> Result<HgtTile>;
}

/// Loads tiles from a local directory of conventionally named `.hgt`
/// files.
pub struct HgtDirectory {
    root: PathBuf,
}

impl HgtDirectory {
    /// A loader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TileLoader for HgtDirectory {
    fn load(&mut self, key: TileKey) -> Result<HgtTile> {
        let name = key.file_name();
        let path = self.root.join(&name);
        if !path.is_file() {
            return Err(Error::DataUnavailable {
                lat: f64::from(key.lat),
                lon: f64::from(key.lon),
            });
        }
        let bytes = fs::read(&path)?;
        HgtTile::from_bytes(&name, &bytes)
    }
}

/// Tile-keyed memoization in front of a [`TileLoader`].
///
/// Each tile is loaded at most once per session and kept for the
/// session's lifetime; there is no eviction.
pub struct TileCache<L> {
    loader: L,
    tiles: HashMap<TileKey, HgtTile>,
}

impl<L: TileLoader> TileCache<L> {
    /// An empty cache over `loader`.
    pub fn new(loader: L) -> Self {
        Self { loader, tiles: HashMap::new() }
    }

    /// Number of tiles resident in the cache.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }
}

impl<L: TileLoader> ElevationSource for TileCache<L> {
    fn elevation_at(&mut self, lat: f64, lon: f64) -> Result<f64> {
        let key = TileKey::for_point(lat, lon);
        if !self.tiles.contains_key(&key) {
            info!("loading elevation tile {}", key.file_name());
            let tile = self.loader.load(key)?;
            self.tiles.insert(key, tile);
        }
        self.tiles[&key].sample(key, lat, lon)
    }
}

// ===================== TESTS =====================
