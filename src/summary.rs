//! # Cluster Summaries
//!
//! Reduces a clustered catalog to one row per cluster: the centroid of its members
//! and their median angle. [`cluster_outlines`] additionally gives the convex hull of
//! each cluster for drawing its boundary.

use std::collections::BTreeMap;

use geo::{ConvexHull, MultiPoint, Point, Polygon};
use log::info;
use serde::{Deserialize, Serialize};

use crate::clustering::ClusteredMeasurement;
use crate::error::{PolarizationError, Result};
use crate::geo_utils::compute_center;
use crate::stats::median;
use crate::Measurement;

/// Centroid and representative angle of one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster: usize,
    /// Mean longitude of the members
    pub longitude: f64,
    /// Mean latitude of the members
    pub latitude: f64,
    /// Median angle of the members
    pub angle: f64,
    pub members: usize,
}

/// Boundary of one cluster on the (longitude, latitude) plane.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterOutline {
    pub cluster: usize,
    /// Median angle of the members
    pub angle: f64,
    pub hull: Polygon<f64>,
}

/// Clustered catalog together with its per-cluster summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAnalysis {
    pub clustered: Vec<ClusteredMeasurement>,
    pub summaries: Vec<ClusterSummary>,
}

fn group_by_cluster(clustered: &[ClusteredMeasurement]) -> BTreeMap<usize, Vec<Measurement>> {
    let mut groups: BTreeMap<usize, Vec<Measurement>> = BTreeMap::new();
    for c in clustered {
        groups.entry(c.cluster).or_default().push(c.measurement);
    }
    groups
}

fn median_angle(members: &[Measurement]) -> Result<f64> {
    let angles: Vec<f64> = members.iter().map(|m| m.angle).collect();
    median(&angles)
}

/// One [`ClusterSummary`] per distinct cluster id, ordered by id.
///
/// Ids do not have to be dense; each id present in `clustered` yields exactly one row.
///
/// # Errors
///
/// [`PolarizationError::EmptyInput`] if `clustered` is empty.
pub fn summarize_clusters(clustered: &[ClusteredMeasurement]) -> Result<Vec<ClusterSummary>> {
    if clustered.is_empty() {
        return Err(PolarizationError::empty("summarize_clusters"));
    }

    let mut summaries = Vec::new();
    for (cluster, members) in group_by_cluster(clustered) {
        let (longitude, latitude) =
            compute_center(&members).ok_or_else(|| PolarizationError::empty("summarize_clusters"))?;
        summaries.push(ClusterSummary {
            cluster,
            longitude,
            latitude,
            angle: median_angle(&members)?,
            members: members.len(),
        });
    }

    info!(
        "[Clusters] Summarized {} clusters from {} members",
        summaries.len(),
        clustered.len()
    );
    Ok(summaries)
}

/// Convex hull of each cluster's member positions, ordered by cluster id.
///
/// Clusters with fewer than three distinct positions give a degenerate polygon.
pub fn cluster_outlines(clustered: &[ClusteredMeasurement]) -> Result<Vec<ClusterOutline>> {
    if clustered.is_empty() {
        return Err(PolarizationError::empty("cluster_outlines"));
    }

    group_by_cluster(clustered)
        .into_iter()
        .map(|(cluster, members)| {
            let points: MultiPoint<f64> = members
                .iter()
                .map(|m| Point::new(m.longitude, m.latitude))
                .collect::<Vec<_>>()
                .into();
            Ok(ClusterOutline {
                cluster,
                angle: median_angle(&members)?,
                hull: points.convex_hull(),
            })
        })
        .collect()
}
