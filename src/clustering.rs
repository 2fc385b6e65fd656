//! # Density Clustering
//!
//! Groups measurements that are close in (longitude, latitude, angle) space.
//!
//! ## Algorithm
//! 1. Build an R-tree over the 3-D feature points
//! 2. Find every point's neighbourhood (itself included) within `max_separation`
//! 3. Points with at least `min_neighbors` neighbours are core points; clusters grow
//!    from core points in catalog order and absorb the border points they reach
//! 4. Points reached by no cluster are noise and are dropped from the output
//!
//! All three axes are in degrees and compared at a 1:1 scale, so `max_separation`
//! bounds the spatial and the angular difference together.
//!
//! The clustering step sits behind [`DensityClusterer`], which speaks the usual
//! integer-label convention (`-1` = noise). Inside the crate labels are
//! [`ClusterLabel`] values.

use std::collections::HashSet;

use log::{debug, info};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite_records, PolarizationError, Result};
use crate::geo_utils::{axial_difference, normalize_axial};
use crate::{AngleMode, Measurement};

/// Raw label reserved for noise at the [`DensityClusterer`] boundary.
pub const NOISE_LABEL: i64 = -1;

/// Configuration for cluster extraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Neighbourhood radius in degrees, over position and angle together.
    /// Default: 3.5
    pub max_separation: f64,
    /// Neighbours (the point itself included) needed to be a core point.
    /// Default: 10
    pub min_neighbors: usize,
    /// Whether the angle axis wraps at 180°.
    /// Default: linear
    pub angle_mode: AngleMode,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_separation: 3.5,
            min_neighbors: 10,
            angle_mode: AngleMode::Linear,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_separation.is_finite() && self.max_separation > 0.0) {
            return Err(PolarizationError::invalid(
                "max_separation",
                self.max_separation,
                "must be a positive number of degrees",
            ));
        }
        if self.min_neighbors < 1 {
            return Err(PolarizationError::invalid(
                "min_neighbors",
                self.min_neighbors as f64,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Cluster membership of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClusterLabel {
    Member(usize),
    Noise,
}

impl ClusterLabel {
    /// Interpret a raw label: negative values are noise.
    pub fn from_raw(raw: i64) -> Self {
        if raw < 0 {
            ClusterLabel::Noise
        } else {
            ClusterLabel::Member(raw as usize)
        }
    }

    pub fn to_raw(self) -> i64 {
        match self {
            ClusterLabel::Member(id) => id as i64,
            ClusterLabel::Noise => NOISE_LABEL,
        }
    }

    pub fn cluster_id(self) -> Option<usize> {
        match self {
            ClusterLabel::Member(id) => Some(id),
            ClusterLabel::Noise => None,
        }
    }
}

/// A catalog record assigned to a cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusteredMeasurement {
    pub measurement: Measurement,
    pub cluster: usize,
}

/// A density-based clustering primitive.
///
/// Returns one label per feature row, `-1` for noise and `0, 1, ...` for clusters.
pub trait DensityClusterer {
    fn cluster(&self, features: &[[f64; 3]], eps: f64, min_samples: usize) -> Vec<i64>;
}

// =============================================================================
// R-tree Indexed Feature for Neighbourhood Queries
// =============================================================================

/// A feature point with its row index for R-tree queries
#[derive(Debug, Clone, Copy)]
struct IndexedFeature {
    idx: usize,
    coords: [f64; 3],
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.coords)
    }
}

impl PointDistance for IndexedFeature {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        self.coords
            .iter()
            .zip(point)
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

/// DBSCAN over 3-D features.
///
/// Matches the common reference behaviour: a neighbourhood includes the point
/// itself and every point at distance `<= eps`; clusters are numbered in the order
/// their first core point appears; a border point joins the first cluster that
/// reaches it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dbscan {
    /// Treat the third axis as an angle with a 180° period
    pub angle_mode: AngleMode,
}

impl Dbscan {
    pub fn new(angle_mode: AngleMode) -> Self {
        Self { angle_mode }
    }

    fn neighbourhoods(&self, features: &[[f64; 3]], eps: f64) -> Vec<Vec<usize>> {
        let points: Vec<[f64; 3]> = match self.angle_mode {
            AngleMode::Linear => features.to_vec(),
            AngleMode::Axial => features
                .iter()
                .map(|f| [f[0], f[1], normalize_axial(f[2])])
                .collect(),
        };
        // Non-finite rows stay out of the tree and get an empty neighbourhood
        let finite = |p: &[f64; 3]| p.iter().all(|v| v.is_finite());
        let tree = RTree::bulk_load(
            points
                .iter()
                .enumerate()
                .filter(|(_, p)| finite(*p))
                .map(|(idx, &coords)| IndexedFeature { idx, coords })
                .collect(),
        );
        let eps_2 = eps * eps;

        points
            .iter()
            .map(|p| match self.angle_mode {
                _ if !finite(p) => Vec::new(),
                AngleMode::Linear => {
                    let mut found: Vec<usize> = tree
                        .locate_within_distance(*p, eps_2)
                        .map(|f| f.idx)
                        .collect();
                    found.sort_unstable();
                    found
                }
                AngleMode::Axial => {
                    // Query the point and its images one period up and down, then
                    // keep what is really within reach on the wrapped axis
                    let mut found: HashSet<usize> = HashSet::new();
                    for shift in [0.0, 180.0, -180.0] {
                        let image = [p[0], p[1], p[2] + shift];
                        found.extend(tree.locate_within_distance(image, eps_2).map(|f| f.idx));
                    }
                    let mut found: Vec<usize> = found
                        .into_iter()
                        .filter(|&j| axial_distance_2(p, &points[j]) <= eps_2)
                        .collect();
                    found.sort_unstable();
                    found
                }
            })
            .collect()
    }
}

fn axial_distance_2(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dlon = a[0] - b[0];
    let dlat = a[1] - b[1];
    let dang = axial_difference(a[2], b[2]);
    dlon * dlon + dlat * dlat + dang * dang
}

impl DensityClusterer for Dbscan {
    fn cluster(&self, features: &[[f64; 3]], eps: f64, min_samples: usize) -> Vec<i64> {
        let neighbourhoods = self.neighbourhoods(features, eps);
        let is_core: Vec<bool> = neighbourhoods.iter().map(|n| n.len() >= min_samples).collect();

        let mut labels = vec![NOISE_LABEL; features.len()];
        let mut next_cluster: i64 = 0;

        for start in 0..features.len() {
            if labels[start] != NOISE_LABEL || !is_core[start] {
                continue;
            }
            labels[start] = next_cluster;
            let mut frontier = vec![start];
            while let Some(current) = frontier.pop() {
                for &neighbour in &neighbourhoods[current] {
                    if labels[neighbour] != NOISE_LABEL {
                        continue;
                    }
                    labels[neighbour] = next_cluster;
                    if is_core[neighbour] {
                        frontier.push(neighbour);
                    }
                }
            }
            next_cluster += 1;
        }

        debug!(
            "[Clusters] DBSCAN eps={} min_samples={}: {} clusters over {} points",
            eps,
            min_samples,
            next_cluster,
            features.len()
        );
        labels
    }
}

/// Assign every record to a cluster with the bundled [`Dbscan`] and drop the noise.
///
/// The feature of each record is `(longitude, latitude, angle)`. The output is
/// ordered by cluster id, then longitude, then latitude.
///
/// # Errors
///
/// - [`PolarizationError::InvalidConfig`] if `max_separation <= 0` or `min_neighbors < 1`
/// - [`PolarizationError::EmptyInput`] if `records` is empty
/// - [`PolarizationError::InvalidRecord`] if a record has a non-finite position or angle
pub fn extract_clusters(records: &[Measurement], config: &ClusterConfig) -> Result<Vec<ClusteredMeasurement>> {
    extract_clusters_with(records, config, &Dbscan::new(config.angle_mode))
}

/// Like [`extract_clusters`], with a caller-supplied clustering primitive.
pub fn extract_clusters_with<C: DensityClusterer>(
    records: &[Measurement],
    config: &ClusterConfig,
    clusterer: &C,
) -> Result<Vec<ClusteredMeasurement>> {
    config.validate()?;
    if records.is_empty() {
        return Err(PolarizationError::empty("extract_clusters"));
    }
    ensure_finite_records(records)?;

    let features: Vec<[f64; 3]> = records
        .iter()
        .map(|r| [r.longitude, r.latitude, r.angle])
        .collect();
    let labels = clusterer.cluster(&features, config.max_separation, config.min_neighbors);
    if labels.len() != records.len() {
        return Err(PolarizationError::ShapeMismatch {
            expected: records.len(),
            actual: labels.len(),
        });
    }

    let mut clustered: Vec<ClusteredMeasurement> = records
        .iter()
        .zip(labels)
        .filter_map(|(r, raw)| {
            ClusterLabel::from_raw(raw)
                .cluster_id()
                .map(|cluster| ClusteredMeasurement {
                    measurement: *r,
                    cluster,
                })
        })
        .collect();

    clustered.sort_by(|a, b| {
        a.cluster
            .cmp(&b.cluster)
            .then(a.measurement.longitude.total_cmp(&b.measurement.longitude))
            .then(a.measurement.latitude.total_cmp(&b.measurement.latitude))
    });

    info!(
        "[Clusters] {} records -> {} clustered ({} noise)",
        records.len(),
        clustered.len(),
        records.len() - clustered.len()
    );
    Ok(clustered)
}
