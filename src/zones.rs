//! Fixed-size rectangular zones on the (longitude, latitude) plane.
//!
//! The grid origin is the lower-left corner of the sky, `(-180°, -90°)`. A point
//! belongs to the cell `floor((lon + 180) / size), floor((lat + 90) / size)` and
//! every cell is represented by its center.
//!
//! ```text
//!  (-80,20)     (-70,20)
//!         ┌─────┐
//! (-75,15)┼──·  │      (-71.28, 14.09) with 10° zones
//!         └─────┘
//!  (-80,10)     (-70,10)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite_records, PolarizationError, Result};
use crate::Measurement;

/// Longitude of the grid origin.
pub const ORIGIN_LON: f64 = -180.0;
/// Latitude of the grid origin.
pub const ORIGIN_LAT: f64 = -90.0;

/// Integer grid coordinate of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneIndex {
    /// Cells to the east of the origin
    pub lon_idx: i64,
    /// Cells to the north of the origin
    pub lat_idx: i64,
}

/// A zone: its grid index plus the materialised cell center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub index: ZoneIndex,
    pub zone_lon: f64,
    pub zone_lat: f64,
}

/// A catalog record tagged with the zone it falls in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZonedMeasurement {
    pub measurement: Measurement,
    pub zone: Zone,
}

/// Maps coordinates onto the cells of a fixed-size grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneGrid {
    zone_size: f64,
}

impl ZoneGrid {
    /// Create a grid of `zone_size`° × `zone_size`° cells.
    ///
    /// Fails with [`PolarizationError::InvalidConfig`] unless `zone_size` is a
    /// positive finite number.
    pub fn new(zone_size: f64) -> Result<Self> {
        if !(zone_size.is_finite() && zone_size > 0.0) {
            return Err(PolarizationError::invalid(
                "zone_size",
                zone_size,
                "must be a positive number of degrees",
            ));
        }
        Ok(Self { zone_size })
    }

    pub fn zone_size(&self) -> f64 {
        self.zone_size
    }

    /// Grid index of the cell containing `(lon, lat)`.
    pub fn index_of(&self, lon: f64, lat: f64) -> ZoneIndex {
        ZoneIndex {
            lon_idx: ((lon - ORIGIN_LON) / self.zone_size).floor() as i64,
            lat_idx: ((lat - ORIGIN_LAT) / self.zone_size).floor() as i64,
        }
    }

    /// Center coordinates of a cell.
    pub fn center_of(&self, index: ZoneIndex) -> (f64, f64) {
        let half = self.zone_size / 2.0;
        (
            ORIGIN_LON + index.lon_idx as f64 * self.zone_size + half,
            ORIGIN_LAT + index.lat_idx as f64 * self.zone_size + half,
        )
    }

    /// The zone containing `(lon, lat)`.
    pub fn zone_of(&self, lon: f64, lat: f64) -> Zone {
        let index = self.index_of(lon, lat);
        let (zone_lon, zone_lat) = self.center_of(index);
        Zone {
            index,
            zone_lon,
            zone_lat,
        }
    }

    /// Center of the cell containing `(lon, lat)`.
    pub fn cell_center(&self, lon: f64, lat: f64) -> (f64, f64) {
        self.center_of(self.index_of(lon, lat))
    }
}

/// Center of the `zone_size` cell that contains `(lon, lat)`.
///
/// # Example
///
/// ```rust
/// use polarization_map::zones::cell_center;
///
/// let center = cell_center(-71.28, 14.09, 10.0).unwrap();
/// assert_eq!(center, (-75.0, 15.0));
/// ```
pub fn cell_center(lon: f64, lat: f64, zone_size: f64) -> Result<(f64, f64)> {
    Ok(ZoneGrid::new(zone_size)?.cell_center(lon, lat))
}

/// Tag every record with its zone and sort by `(zone_lon, zone_lat)`.
///
/// The output satisfies the contiguity precondition of
/// [`aggregate_sorted`](crate::aggregate::aggregate_sorted). The sort is stable, so
/// records keep their catalog order within a zone.
///
/// Fails with [`PolarizationError::InvalidRecord`] if a record has a non-finite
/// position or angle.
pub fn tag_zones(records: &[Measurement], zone_size: f64) -> Result<Vec<ZonedMeasurement>> {
    let grid = ZoneGrid::new(zone_size)?;
    ensure_finite_records(records)?;
    let mut tagged: Vec<ZonedMeasurement> = records
        .iter()
        .map(|m| ZonedMeasurement {
            measurement: *m,
            zone: grid.zone_of(m.longitude, m.latitude),
        })
        .collect();
    tagged.sort_by_key(|t| t.zone.index);
    Ok(tagged)
}
