//! End-to-end tests of the zone and cluster pipelines

use polarization_map::{
    analyze_clusters, cluster_outlines, compute_zone_statistics, zones::tag_zones, aggregate_sorted,
    aggregate_zones, AngleMode, ClusterConfig, Measurement, PolarizationError, ZoneConfig,
};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Symmetric 5x5 grid of identical-angle measurements centred on (lon, lat)
fn blob(lon: f64, lat: f64, angle: f64) -> Vec<Measurement> {
    let mut points = Vec::new();
    for i in -2..=2 {
        for j in -2..=2 {
            points.push(Measurement::new(
                lon + i as f64 * 0.5,
                lat + j as f64 * 0.5,
                1.0,
                angle,
                0.1,
                2.0,
            ));
        }
    }
    points
}

#[test]
fn test_two_blobs_give_two_clusters() {
    let mut catalog = blob(10.0, 10.0, 20.0);
    catalog.extend(blob(100.0, -30.0, 150.0));
    catalog.push(Measurement::new(-100.0, 50.0, 1.0, 90.0, 0.1, 2.0));
    catalog.push(Measurement::new(60.0, 0.0, 1.0, 20.0, 0.1, 2.0));

    let analysis = analyze_clusters(&catalog, &ClusterConfig::default()).unwrap();
    assert_eq!(analysis.clustered.len(), 50);
    assert_eq!(analysis.summaries.len(), 2);

    let a = &analysis.summaries[0];
    assert!(approx_eq(a.longitude, 10.0, 1e-9));
    assert!(approx_eq(a.latitude, 10.0, 1e-9));
    assert_eq!(a.angle, 20.0);
    assert_eq!(a.members, 25);

    let b = &analysis.summaries[1];
    assert!(approx_eq(b.longitude, 100.0, 1e-9));
    assert!(approx_eq(b.latitude, -30.0, 1e-9));
    assert_eq!(b.angle, 150.0);

    let outlines = cluster_outlines(&analysis.clustered).unwrap();
    assert_eq!(outlines.len(), 2);
    assert_eq!(outlines[1].angle, 150.0);
}

#[test]
fn test_cluster_centroids_within_member_span() {
    let mut catalog = blob(-40.0, 20.0, 60.0);
    catalog.extend(blob(-37.0, 21.0, 62.0));
    let analysis = analyze_clusters(&catalog, &ClusterConfig::default()).unwrap();
    for s in &analysis.summaries {
        let members: Vec<&Measurement> = analysis
            .clustered
            .iter()
            .filter(|c| c.cluster == s.cluster)
            .map(|c| &c.measurement)
            .collect();
        let min_lon = members.iter().map(|m| m.longitude).fold(f64::INFINITY, f64::min);
        let max_lon = members.iter().map(|m| m.longitude).fold(f64::NEG_INFINITY, f64::max);
        let min_lat = members.iter().map(|m| m.latitude).fold(f64::INFINITY, f64::min);
        let max_lat = members.iter().map(|m| m.latitude).fold(f64::NEG_INFINITY, f64::max);
        assert!(s.longitude >= min_lon && s.longitude <= max_lon);
        assert!(s.latitude >= min_lat && s.latitude <= max_lat);
    }
}

#[test]
fn test_zone_pipeline_both_strategies_agree() {
    let mut catalog = blob(10.0, 10.0, 20.0);
    catalog.extend(blob(-60.0, 45.0, 170.0));
    // outliers inside the first blob's zones
    catalog.push(Measurement::new(10.1, 10.1, 5.0, 110.0, 0.1, 2.0));
    catalog.push(Measurement::new(9.1, 9.1, 5.0, 100.0, 0.1, 2.0));

    let config = ZoneConfig::default();
    let tagged = tag_zones(&catalog, config.zone_size).unwrap();
    let sorted = aggregate_sorted(&tagged, &config).unwrap();
    let grouped = aggregate_zones(&tagged, &config).unwrap();
    let piped = compute_zone_statistics(&catalog, &config).unwrap();

    assert_eq!(sorted, grouped);
    assert_eq!(sorted, piped);

    let total_before: usize = piped.iter().map(|s| s.points_before).sum();
    assert_eq!(total_before, catalog.len());
    for s in &piped {
        assert!(s.points_after >= 1);
        assert!(s.points_before >= s.points_after);
    }
}

#[test]
fn test_zone_rows_sorted_by_center() {
    let catalog = vec![
        Measurement::new(170.0, -80.0, 1.0, 10.0, 0.1, 1.0),
        Measurement::new(-170.0, 80.0, 1.0, 10.0, 0.1, 1.0),
        Measurement::new(-170.0, -80.0, 1.0, 10.0, 0.1, 1.0),
        Measurement::new(0.0, 0.0, 1.0, 10.0, 0.1, 1.0),
    ];
    let stats = compute_zone_statistics(&catalog, &ZoneConfig::default()).unwrap();
    let centers: Vec<(f64, f64)> = stats.iter().map(|s| (s.zone_lon, s.zone_lat)).collect();
    let mut expected = centers.clone();
    expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(centers, expected);
    assert_eq!(stats.len(), 4);
}

#[test]
fn test_axial_mode_keeps_seam_cluster_together() {
    // A zone whose angles straddle 0°/180°
    let angles = [178.0, 179.0, 179.5, 0.5, 1.0, 2.0, 1.5, 178.5];
    let catalog: Vec<Measurement> = angles
        .iter()
        .enumerate()
        .map(|(i, &a)| Measurement::new(0.5 + i as f64 * 0.1, 0.5, 1.0, a, 0.1, 1.0))
        .collect();

    let axial = ZoneConfig {
        angle_mode: AngleMode::Axial,
        ..ZoneConfig::default()
    };
    let stats = compute_zone_statistics(&catalog, &axial).unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].points_after, angles.len());
    let ang = stats[0].zone_ang;
    assert!(ang > 179.0 || ang < 1.0, "axial mean {} should sit on the seam", ang);

    // Linear mode averages to the middle of the range instead
    let linear = compute_zone_statistics(&catalog, &ZoneConfig::default()).unwrap();
    assert!(linear[0].zone_ang > 45.0 && linear[0].zone_ang < 135.0);
}

#[test]
fn test_non_finite_records_are_rejected_by_both_pipelines() {
    let mut catalog = blob(10.0, 10.0, 20.0);
    catalog.extend(blob(100.0, -30.0, 150.0));
    catalog.push(Measurement::new(1.0, f64::NAN, 1.0, 20.0, 0.1, 2.0));

    assert!(matches!(
        analyze_clusters(&catalog, &ClusterConfig::default()),
        Err(PolarizationError::InvalidRecord { index: 50, .. })
    ));

    let catalog = vec![
        Measurement::new(1.0, 1.0, 1.0, 20.0, 0.1, 2.0),
        Measurement::new(f64::NAN, 1.0, 1.0, 20.0, 0.1, 2.0),
    ];
    assert!(matches!(
        compute_zone_statistics(&catalog, &ZoneConfig::default()),
        Err(PolarizationError::InvalidRecord { index: 1, .. })
    ));
}
