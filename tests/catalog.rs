//! Catalog reading, cutouts, export and config loading

use polarization_map::{
    catalog::{normalize_longitudes, ClusteredRow},
    compute_zone_statistics, read_catalog_csv, write_table_csv, AnalysisConfig, AngleMode, Bounds,
    CatalogColumns, ClusterSummary, CutoutConfig, PolarizationError, ZoneStatistic,
};

const HEILES_SAMPLE: &str = "\
GLON,GLAT,Pol,PA,e_Pol,e_PA,Name
1.2,1.1,2.0,40.0,0.1,2.0,HD 1
1.8,2.2,2.2,42.0,0.2,1.5,HD 2
359.0,-1.0,0.3,120.0,0.1,9.0,HD 3
359.5,-1.5,1.1,118.0,0.1,0.0,HD 4
200.0,60.0,3.0,10.0,0.3,4.0,HD 5
";

fn read_sample() -> Vec<polarization_map::Measurement> {
    let records = read_catalog_csv(HEILES_SAMPLE.as_bytes(), &CatalogColumns::heiles()).unwrap();
    normalize_longitudes(records)
}

#[test]
fn test_read_and_normalize() {
    let records = read_sample();
    assert_eq!(records.len(), 5);
    assert_eq!(records[2].longitude, -1.0);
    assert_eq!(records[4].longitude, -160.0);
    assert_eq!(records[0].longitude, 1.2);
    assert!(records.iter().all(|r| r.is_valid()));
}

#[test]
fn test_cutouts_before_zoning() {
    let cutout = CutoutConfig {
        bounds: Some(Bounds {
            min_lon: -5.0,
            max_lon: 5.0,
            min_lat: -5.0,
            max_lat: 5.0,
        }),
        pol_min: Some(0.5),
        ang_err_max: Some(5.0),
    };
    let records = cutout.apply(read_sample());
    // HD 3 fails pol_min, HD 4 has unknown angle error, HD 5 is outside the box
    assert_eq!(records.len(), 2);

    let stats = compute_zone_statistics(&records, &Default::default()).unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!((stats[0].zone_lon, stats[0].zone_lat), (1.5, 1.5));
}

#[test]
fn test_zone_table_round_trip() {
    let stats = compute_zone_statistics(&read_sample(), &Default::default()).unwrap();

    let mut out = Vec::new();
    write_table_csv(&mut out, &stats).unwrap();
    let text = String::from_utf8(out.clone()).unwrap();
    assert!(text.starts_with("zone_lon;zone_lat;zone_pol;zone_ang;points_before;points_after\n"));

    let mut rdr = csv::ReaderBuilder::new().delimiter(b';').from_reader(out.as_slice());
    let back: Vec<ZoneStatistic> = rdr.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(back, stats);
}

#[test]
fn test_summary_and_member_tables() {
    let summaries = vec![ClusterSummary {
        cluster: 3,
        longitude: 10.5,
        latitude: -2.25,
        angle: 20.0,
        members: 12,
    }];
    let mut out = Vec::new();
    write_table_csv(&mut out, &summaries).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text, "cluster;longitude;latitude;angle;members\n3;10.5;-2.25;20.0;12\n");

    let mut out = Vec::new();
    write_table_csv::<_, ClusteredRow>(&mut out, &[]).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_config_from_file() {
    let path = std::env::temp_dir().join(format!("polmap-config-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{
            "zones": { "zone_size": 2.5, "angle_mode": "axial" },
            "clusters": { "max_separation": 1.0, "min_neighbors": 4 },
            "cutout": { "pol_min": 0.2 }
        }"#,
    )
    .unwrap();

    let config = AnalysisConfig::from_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.zones.zone_size, 2.5);
    assert_eq!(config.zones.angle_mode, AngleMode::Axial);
    assert_eq!(config.zones.sigma_limit, 2.0);
    assert_eq!(config.clusters.min_neighbors, 4);
    assert_eq!(config.clusters.angle_mode, AngleMode::Linear);
    assert_eq!(config.cutout.pol_min, Some(0.2));
    assert!(config.cutout.bounds.is_none());
}

#[test]
fn test_config_errors() {
    let missing = AnalysisConfig::from_path("/nonexistent/polmap.json");
    assert!(matches!(missing, Err(PolarizationError::Io(_))));

    let invalid = AnalysisConfig::from_json_str(r#"{ "zones": { "zone_size": -3.0 } }"#);
    assert!(matches!(
        invalid,
        Err(PolarizationError::InvalidConfig { parameter: "zone_size", .. })
    ));
}
