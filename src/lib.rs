//! # Polarization Map
//!
//! Robust statistics over catalogs of starlight polarization measurements.
//!
//! This library provides:
//! - Zone statistics: the sky is cut into square zones, angular outliers are
//!   sigma-clipped per zone and the survivors are averaged with inverse-error weights
//! - Density clustering over (longitude, latitude, angle) with per-cluster centroids
//!   and median angles
//! - Catalog reading, cutouts and `;`-delimited table export
//!
//! ## Features
//!
//! - **`parallel`** - Summarise zones in parallel with rayon
//! - **`cli`** - Build the `polmap` command-line tool
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use polarization_map::{compute_zone_statistics, Measurement, ZoneConfig};
//!
//! let catalog = vec![
//!     Measurement::new(10.2, 5.1, 1.8, 40.0, 0.1, 2.0),
//!     Measurement::new(10.9, 5.7, 2.2, 44.0, 0.2, 3.0),
//!     Measurement::new(-30.0, -2.0, 0.9, 120.0, 0.1, 5.0),
//! ];
//!
//! let stats = compute_zone_statistics(&catalog, &ZoneConfig::default()).unwrap();
//! assert_eq!(stats.len(), 2);
//! for zone in &stats {
//!     println!("({}, {}): {:.2}% at {:.1}°", zone.zone_lon, zone.zone_lat, zone.zone_pol, zone.zone_ang);
//! }
//! ```

use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{PolarizationError, Result};

// Weighted means and spreads
pub mod stats;
pub use stats::weighted_mean;

pub mod sigma_clip;
pub use sigma_clip::{clip, sigma_clip, ClipOutcome, ClipResult, ZoneSample};

pub mod zones;
pub use zones::{cell_center, tag_zones, Zone, ZoneGrid, ZoneIndex, ZonedMeasurement};

pub mod aggregate;
pub use aggregate::{aggregate_sorted, aggregate_zones, ZoneConfig, ZoneStatistic};

pub mod clustering;
pub use clustering::{
    extract_clusters, extract_clusters_with, ClusterConfig, ClusterLabel, ClusteredMeasurement,
    Dbscan, DensityClusterer,
};

pub mod summary;
pub use summary::{cluster_outlines, summarize_clusters, ClusterAnalysis, ClusterOutline, ClusterSummary};

pub mod catalog;
pub use catalog::{read_catalog_csv, write_table_csv, CatalogColumns, CutoutConfig};

pub mod geo_utils;

// ============================================================================
// Core Types
// ============================================================================

/// One catalog record.
///
/// Positions and angles are in degrees. An error of `0` means the error is unknown.
///
/// # Example
/// ```
/// use polarization_map::Measurement;
/// let m = Measurement::new(-71.28, 14.09, 1.2, 35.0, 0.05, 2.5);
/// assert!(m.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Galactic longitude, `[-180, 180]` once normalised
    pub longitude: f64,
    /// Galactic latitude, `[-90, 90]`
    pub latitude: f64,
    /// Degree of polarization
    pub polarization: f64,
    /// Polarization angle, nominally `[0, 180)`
    pub angle: f64,
    pub polarization_error: f64,
    pub angle_error: f64,
}

impl Measurement {
    pub fn new(
        longitude: f64,
        latitude: f64,
        polarization: f64,
        angle: f64,
        polarization_error: f64,
        angle_error: f64,
    ) -> Self {
        Self {
            longitude,
            latitude,
            polarization,
            angle,
            polarization_error,
            angle_error,
        }
    }

    /// Check that every field is finite and in range.
    ///
    /// Longitudes are accepted in both `[-180, 180]` and `[0, 360]` conventions.
    pub fn is_valid(&self) -> bool {
        let fields = [
            self.longitude,
            self.latitude,
            self.polarization,
            self.angle,
            self.polarization_error,
            self.angle_error,
        ];
        fields.iter().all(|v| v.is_finite())
            && (-180.0..=360.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
            && self.polarization >= 0.0
            && self.polarization_error >= 0.0
            && self.angle_error >= 0.0
    }
}

/// Rectangle on the (longitude, latitude) plane, edges included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        longitude >= self.min_lon
            && longitude <= self.max_lon
            && latitude >= self.min_lat
            && latitude <= self.max_lat
    }
}

/// How polarization angles are compared and averaged.
///
/// `Linear` treats angles as plain numbers, so 1° and 179° are far apart.
/// `Axial` treats them as orientations with a 180° period: means are taken on
/// doubled angles and differences wrap into `[-90, 90)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleMode {
    #[default]
    Linear,
    Axial,
}

/// Settings for a whole analysis run, loadable from JSON.
///
/// Missing sections and fields take their defaults:
///
/// ```
/// use polarization_map::AnalysisConfig;
///
/// let config = AnalysisConfig::from_json_str(r#"{ "zones": { "zone_size": 5.0 } }"#).unwrap();
/// assert_eq!(config.zones.zone_size, 5.0);
/// assert_eq!(config.zones.sigma_limit, 2.0);
/// assert_eq!(config.clusters.min_neighbors, 10);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub zones: ZoneConfig,
    pub clusters: ClusterConfig,
    pub cutout: CutoutConfig,
}

impl AnalysisConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.zones.validate()?;
        self.clusters.validate()?;
        self.cutout.validate()
    }
}

// ============================================================================
// Pipelines
// ============================================================================

/// Zone statistics for a catalog in any order.
///
/// Tags every record with its zone, then emits one [`ZoneStatistic`] per occupied
/// zone, ordered by zone longitude and then latitude.
///
/// # Errors
///
/// - [`PolarizationError::InvalidConfig`] for a bad zone size or sigma limit
/// - [`PolarizationError::EmptyInput`] if `records` is empty
/// - [`PolarizationError::InvalidRecord`] for a non-finite position or angle
pub fn compute_zone_statistics(records: &[Measurement], config: &ZoneConfig) -> Result<Vec<ZoneStatistic>> {
    config.validate()?;
    if records.is_empty() {
        return Err(PolarizationError::empty("compute_zone_statistics"));
    }
    let tagged = tag_zones(records, config.zone_size)?;

    #[cfg(feature = "parallel")]
    let stats = aggregate_zones(&tagged, config)?;

    #[cfg(not(feature = "parallel"))]
    let stats = aggregate_sorted(&tagged, config)?;

    Ok(stats)
}

/// Cluster a catalog and summarise every cluster.
///
/// A catalog in which every record is noise yields empty `clustered` and
/// `summaries` rather than an error.
pub fn analyze_clusters(records: &[Measurement], config: &ClusterConfig) -> Result<ClusterAnalysis> {
    let clustered = extract_clusters(records, config)?;
    if clustered.is_empty() {
        warn!(
            "[Clusters] No clusters found (max_separation={}, min_neighbors={})",
            config.max_separation, config.min_neighbors
        );
        return Ok(ClusterAnalysis {
            clustered,
            summaries: Vec::new(),
        });
    }
    let summaries = summarize_clusters(&clustered)?;
    info!("[Clusters] Analysis complete: {} clusters", summaries.len());
    Ok(ClusterAnalysis { clustered, summaries })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_validation() {
        assert!(Measurement::new(-71.28, 14.09, 1.2, 35.0, 0.05, 2.5).is_valid());
        assert!(Measurement::new(350.0, 0.0, 1.0, 0.0, 0.0, 0.0).is_valid());
        assert!(!Measurement::new(0.0, 91.0, 1.0, 0.0, 0.1, 1.0).is_valid());
        assert!(!Measurement::new(0.0, 0.0, -1.0, 0.0, 0.1, 1.0).is_valid());
        assert!(!Measurement::new(f64::NAN, 0.0, 1.0, 0.0, 0.1, 1.0).is_valid());
    }

    #[test]
    fn test_bounds() {
        let b = Bounds {
            min_lon: -10.0,
            max_lon: 10.0,
            min_lat: 0.0,
            max_lat: 4.0,
        };
        assert!(b.contains(-10.0, 4.0));
        assert!(!b.contains(0.0, -0.1));
    }

    #[test]
    fn test_angle_mode_serde() {
        assert_eq!(serde_json::to_string(&AngleMode::Axial).unwrap(), "\"axial\"");
        let mode: AngleMode = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(mode, AngleMode::Linear);
    }

    #[test]
    fn test_config_rejects_invalid_values() {
        let err = AnalysisConfig::from_json_str(r#"{ "clusters": { "min_neighbors": 0 } }"#);
        assert!(matches!(err, Err(PolarizationError::InvalidConfig { parameter: "min_neighbors", .. })));

        let err = AnalysisConfig::from_json_str("{ not json");
        assert!(matches!(err, Err(PolarizationError::Json(_))));
    }

    #[test]
    fn test_compute_zone_statistics_unsorted_input() {
        let catalog = vec![
            Measurement::new(4.0, 1.0, 1.0, 100.0, 0.1, 2.0),
            Measurement::new(1.0, 1.0, 2.0, 40.0, 0.1, 2.0),
            Measurement::new(5.0, 2.0, 3.0, 110.0, 0.1, 2.0),
        ];
        let stats = compute_zone_statistics(&catalog, &ZoneConfig::default()).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!((stats[0].zone_lon, stats[0].zone_lat), (1.5, 1.5));
        assert_eq!(stats[1].points_before, 2);
    }

    #[test]
    fn test_compute_zone_statistics_errors() {
        assert!(matches!(
            compute_zone_statistics(&[], &ZoneConfig::default()),
            Err(PolarizationError::EmptyInput { .. })
        ));
        let catalog = vec![Measurement::new(0.0, 0.0, 1.0, 1.0, 0.1, 1.0)];
        let config = ZoneConfig {
            zone_size: 0.0,
            ..ZoneConfig::default()
        };
        assert!(matches!(
            compute_zone_statistics(&catalog, &config),
            Err(PolarizationError::InvalidConfig { parameter: "zone_size", .. })
        ));
    }

    #[test]
    fn test_analyze_all_noise() {
        let catalog = vec![
            Measurement::new(0.0, 0.0, 1.0, 10.0, 0.1, 1.0),
            Measurement::new(90.0, 0.0, 1.0, 10.0, 0.1, 1.0),
        ];
        let analysis = analyze_clusters(&catalog, &ClusterConfig::default()).unwrap();
        assert!(analysis.clustered.is_empty());
        assert!(analysis.summaries.is_empty());
    }
}
