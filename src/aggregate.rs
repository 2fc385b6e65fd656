//! Zone statistics: one robust summary row per occupied zone.
//!
//! Each zone's measurements are sigma-clipped on angle, then the surviving
//! polarizations and angles are averaged with inverse-error weights.
//!
//! Two entry points produce the same rows:
//! - [`aggregate_sorted`] scans records that are already contiguous per zone
//!   (the output of [`tag_zones`](crate::zones::tag_zones)) in a single pass.
//! - [`aggregate_zones`] groups by zone index first and has no ordering
//!   requirement. Rows come out sorted by zone. With the `parallel` feature the
//!   zones are summarised on the rayon thread pool.

use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{PolarizationError, Result};
use crate::sigma_clip::{sigma_clip, validate_sigma_limit, ClipOutcome, ZoneSample};
use crate::stats::{weighted_axial_mean, weighted_mean};
use crate::zones::{Zone, ZoneGrid, ZoneIndex, ZonedMeasurement};
use crate::AngleMode;

/// Configuration for zone statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Side of each square zone in degrees.
    /// Default: 3.0
    pub zone_size: f64,
    /// Half-width of the accepted angle window, in standard deviations.
    /// Default: 2.0
    pub sigma_limit: f64,
    /// How angles are compared and averaged.
    /// Default: linear (plain numbers)
    pub angle_mode: AngleMode,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            zone_size: 3.0,
            sigma_limit: 2.0,
            angle_mode: AngleMode::Linear,
        }
    }
}

impl ZoneConfig {
    pub fn validate(&self) -> Result<()> {
        ZoneGrid::new(self.zone_size)?;
        validate_sigma_limit(self.sigma_limit)
    }
}

/// Summary of one zone after outlier rejection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneStatistic {
    /// Zone center longitude
    pub zone_lon: f64,
    /// Zone center latitude
    pub zone_lat: f64,
    /// Weighted mean polarization of the surviving points
    pub zone_pol: f64,
    /// Weighted mean angle of the surviving points
    pub zone_ang: f64,
    /// Points in the zone
    pub points_before: usize,
    /// Points left after sigma clipping
    pub points_after: usize,
}

/// Clip one zone's buffers and reduce them to a [`ZoneStatistic`].
fn summarize_zone(zone: &Zone, sample: ZoneSample, sigma_limit: f64, mode: AngleMode) -> Result<ZoneStatistic> {
    let points_before = sample.len();
    let clipped = sigma_clip(sample, sigma_limit, mode)?;
    if clipped.outcome == ClipOutcome::Fallback {
        debug!(
            "[Zones] ({}, {}): clipping would empty the zone, keeping all {} points",
            zone.zone_lon, zone.zone_lat, points_before
        );
    }
    let kept = clipped.sample;

    let zone_pol = weighted_mean(&kept.polarization, &kept.polarization_error)?;
    let zone_ang = match mode {
        AngleMode::Linear => weighted_mean(&kept.angle, &kept.angle_error)?,
        AngleMode::Axial => weighted_axial_mean(&kept.angle, &kept.angle_error)?,
    };

    Ok(ZoneStatistic {
        zone_lon: zone.zone_lon,
        zone_lat: zone.zone_lat,
        zone_pol,
        zone_ang,
        points_before,
        points_after: kept.len(),
    })
}

/// Aggregate records that are contiguous per zone, in a single pass.
///
/// # Precondition
///
/// All records of a zone must be adjacent, as produced by
/// [`tag_zones`](crate::zones::tag_zones). This is not checked: a zone split into
/// two runs yields two rows. Use [`aggregate_zones`] when the order is unknown.
///
/// # Errors
///
/// - [`PolarizationError::EmptyInput`] if `records` is empty
/// - [`PolarizationError::InvalidConfig`] for a negative or non-finite sigma limit
pub fn aggregate_sorted(records: &[ZonedMeasurement], config: &ZoneConfig) -> Result<Vec<ZoneStatistic>> {
    validate_sigma_limit(config.sigma_limit)?;
    let (first, rest) = records
        .split_first()
        .ok_or_else(|| PolarizationError::empty("aggregate_sorted"))?;

    let mut stats = Vec::new();
    let mut current = first.zone;
    let mut buffer = ZoneSample::new();
    buffer.push(&first.measurement);

    for record in rest {
        if record.zone.index != current.index {
            let full = std::mem::take(&mut buffer);
            stats.push(summarize_zone(&current, full, config.sigma_limit, config.angle_mode)?);
            current = record.zone;
        }
        buffer.push(&record.measurement);
    }
    stats.push(summarize_zone(&current, buffer, config.sigma_limit, config.angle_mode)?);

    info!(
        "[Zones] {} records -> {} zones (sigma limit {})",
        records.len(),
        stats.len(),
        config.sigma_limit
    );
    Ok(stats)
}

/// Aggregate records in any order by grouping on their zone index.
///
/// Produces the same rows as [`aggregate_sorted`] on sorted input, ordered by zone
/// (longitude first, then latitude).
pub fn aggregate_zones(records: &[ZonedMeasurement], config: &ZoneConfig) -> Result<Vec<ZoneStatistic>> {
    validate_sigma_limit(config.sigma_limit)?;
    if records.is_empty() {
        return Err(PolarizationError::empty("aggregate_zones"));
    }

    let mut groups: HashMap<ZoneIndex, (Zone, ZoneSample)> = HashMap::new();
    for record in records {
        groups
            .entry(record.zone.index)
            .or_insert_with(|| (record.zone, ZoneSample::new()))
            .1
            .push(&record.measurement);
    }

    let mut groups: Vec<(Zone, ZoneSample)> = groups.into_values().collect();
    groups.sort_by_key(|(zone, _)| zone.index);

    #[cfg(feature = "parallel")]
    let stats: Result<Vec<ZoneStatistic>> = {
        use rayon::prelude::*;
        groups
            .into_par_iter()
            .map(|(zone, sample)| summarize_zone(&zone, sample, config.sigma_limit, config.angle_mode))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let stats: Result<Vec<ZoneStatistic>> = groups
        .into_iter()
        .map(|(zone, sample)| summarize_zone(&zone, sample, config.sigma_limit, config.angle_mode))
        .collect();

    let stats = stats?;
    info!(
        "[Zones] {} records -> {} zones (sigma limit {})",
        records.len(),
        stats.len(),
        config.sigma_limit
    );
    Ok(stats)
}
