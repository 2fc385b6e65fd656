//! # Catalog Preparation and Export
//!
//! Everything that happens to a catalog before and after the pipelines:
//! - reading a delimited catalog into [`Measurement`]s with configurable column names
//! - shifting longitudes into `[-180, 180]`
//! - rectangular and threshold cutouts
//! - writing result tables as `;`-delimited text
//!
//! ## Example
//!
//! ```rust
//! use polarization_map::catalog::{read_catalog_csv, normalize_longitudes, CatalogColumns};
//!
//! let data = "GLON,GLAT,Pol,PA,e_Pol,e_PA\n350.0,1.0,2.5,45.0,0.1,3.0\n";
//! let records = read_catalog_csv(data.as_bytes(), &CatalogColumns::heiles()).unwrap();
//! let records = normalize_longitudes(records);
//! assert_eq!(records[0].longitude, -10.0);
//! ```

use std::io;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::clustering::ClusteredMeasurement;
use crate::error::{PolarizationError, Result};
use crate::geo_utils::{compute_bounds, normalize_longitude};
use crate::{Bounds, Measurement};

/// Column separator of exported tables.
pub const EXPORT_DELIMITER: u8 = b';';

/// Column names used to read a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogColumns {
    pub longitude: String,
    pub latitude: String,
    pub polarization: String,
    pub angle: String,
    pub polarization_error: String,
    pub angle_error: String,
    /// Field separator.
    /// Default: `,`
    pub delimiter: u8,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self {
            longitude: "longitude".into(),
            latitude: "latitude".into(),
            polarization: "polarization".into(),
            angle: "angle".into(),
            polarization_error: "polarization_error".into(),
            angle_error: "angle_error".into(),
            delimiter: b',',
        }
    }
}

impl CatalogColumns {
    /// Column names of the Heiles (2000) stellar polarization compilation.
    pub fn heiles() -> Self {
        Self {
            longitude: "GLON".into(),
            latitude: "GLAT".into(),
            polarization: "Pol".into(),
            angle: "PA".into(),
            polarization_error: "e_Pol".into(),
            angle_error: "e_PA".into(),
            ..Self::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Rectangle and threshold filters applied to a raw catalog.
///
/// Every filter is optional; an empty config keeps the catalog as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutoutConfig {
    /// Keep only records inside this rectangle (bounds included)
    pub bounds: Option<Bounds>,
    /// Minimum polarization
    pub pol_min: Option<f64>,
    /// Maximum angle error; records with unknown (zero) angle error are dropped
    pub ang_err_max: Option<f64>,
}

impl CutoutConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(b) = self.bounds {
            if !(b.min_lon <= b.max_lon) {
                return Err(PolarizationError::invalid("min_lon", b.min_lon, "exceeds max_lon"));
            }
            if !(b.min_lat <= b.max_lat) {
                return Err(PolarizationError::invalid("min_lat", b.min_lat, "exceeds max_lat"));
            }
        }
        if let Some(max) = self.ang_err_max {
            if !(max > 0.0) {
                return Err(PolarizationError::invalid("ang_err_max", max, "must be positive"));
            }
        }
        Ok(())
    }

    /// Apply the configured filters in order: rectangle, then thresholds.
    pub fn apply(&self, records: Vec<Measurement>) -> Vec<Measurement> {
        let records = match &self.bounds {
            Some(bounds) => space_cutout(&records, bounds),
            None => records,
        };
        if self.pol_min.is_none() && self.ang_err_max.is_none() {
            return records;
        }
        values_cutout(
            &records,
            self.pol_min.unwrap_or(f64::NEG_INFINITY),
            self.ang_err_max.unwrap_or(f64::INFINITY),
        )
    }
}

/// Shift every longitude above 180° down by a full turn, if the catalog has any.
///
/// Catalogs that already use `[-180, 180]` are returned unchanged.
pub fn normalize_longitudes(mut records: Vec<Measurement>) -> Vec<Measurement> {
    let max_lon = records.iter().map(|r| r.longitude).fold(f64::NEG_INFINITY, f64::max);
    if max_lon > 180.0 {
        for r in records.iter_mut() {
            r.longitude = normalize_longitude(r.longitude);
        }
        debug!("[Catalog] Shifted longitudes into [-180, 180]");
    }
    records
}

/// Keep records whose position lies inside `bounds`, edges included.
pub fn space_cutout(records: &[Measurement], bounds: &Bounds) -> Vec<Measurement> {
    let kept: Vec<Measurement> = records
        .iter()
        .filter(|r| bounds.contains(r.longitude, r.latitude))
        .copied()
        .collect();
    info!("[Catalog] Space cutout kept {} of {} records", kept.len(), records.len());
    kept
}

/// Keep records with `polarization >= pol_min` and `0 < angle_error <= ang_err_max`.
pub fn values_cutout(records: &[Measurement], pol_min: f64, ang_err_max: f64) -> Vec<Measurement> {
    let kept: Vec<Measurement> = records
        .iter()
        .filter(|r| r.polarization >= pol_min && r.angle_error > 0.0 && r.angle_error <= ang_err_max)
        .copied()
        .collect();
    info!("[Catalog] Value cutout kept {} of {} records", kept.len(), records.len());
    kept
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| PolarizationError::MissingColumn(name.to_string()))
}

/// Read a delimited catalog with a header row.
///
/// Extra columns are ignored. An empty error field is read as `0` (unknown error);
/// any other field that is not a finite number (including `nan` and `inf`) fails
/// with [`PolarizationError::InvalidField`].
pub fn read_catalog_csv<R: io::Read>(reader: R, columns: &CatalogColumns) -> Result<Vec<Measurement>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(columns.delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let names = [
        columns.longitude.as_str(),
        columns.latitude.as_str(),
        columns.polarization.as_str(),
        columns.angle.as_str(),
        columns.polarization_error.as_str(),
        columns.angle_error.as_str(),
    ];
    let mut idx = [0usize; 6];
    for (slot, name) in idx.iter_mut().zip(names) {
        *slot = column_index(&headers, name)?;
    }

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let mut values = [0.0f64; 6];
        for (k, value) in values.iter_mut().enumerate() {
            let raw = row.get(idx[k]).unwrap_or("");
            // error columns (4, 5) may be blank
            if raw.is_empty() && k >= 4 {
                continue;
            }
            *value = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| PolarizationError::InvalidField {
                    line,
                    column: names[k].to_string(),
                    value: raw.to_string(),
                })?;
        }
        let [lon, lat, pol, ang, pol_err, ang_err] = values;
        records.push(Measurement::new(lon, lat, pol, ang, pol_err, ang_err));
    }

    let invalid = records.iter().filter(|r| !r.is_valid()).count();
    if invalid > 0 {
        warn!("[Catalog] {} records have out-of-range values", invalid);
    }
    match compute_bounds(&records) {
        Some(b) => info!(
            "[Catalog] Read {} records, lon [{}, {}], lat [{}, {}]",
            records.len(),
            b.min_lon,
            b.max_lon,
            b.min_lat,
            b.max_lat
        ),
        None => info!("[Catalog] Read 0 records"),
    }
    Ok(records)
}

/// A clustered record as one flat table row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusteredRow {
    pub longitude: f64,
    pub latitude: f64,
    pub polarization: f64,
    pub angle: f64,
    pub polarization_error: f64,
    pub angle_error: f64,
    pub cluster: usize,
}

impl From<&ClusteredMeasurement> for ClusteredRow {
    fn from(c: &ClusteredMeasurement) -> Self {
        let m = &c.measurement;
        Self {
            longitude: m.longitude,
            latitude: m.latitude,
            polarization: m.polarization,
            angle: m.angle,
            polarization_error: m.polarization_error,
            angle_error: m.angle_error,
            cluster: c.cluster,
        }
    }
}

/// Write `rows` as a `;`-delimited table with a header row.
///
/// Any flat `Serialize` struct works as a row type:
/// [`ZoneStatistic`](crate::aggregate::ZoneStatistic),
/// [`ClusterSummary`](crate::summary::ClusterSummary), [`ClusteredRow`] or
/// [`Measurement`].
pub fn write_table_csv<W: io::Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(EXPORT_DELIMITER)
        .from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
