//! Example of density clustering with summaries and outlines.
//!
//! Run with: cargo run --example cluster_extraction

use geo::Area;
use polarization_map::{analyze_clusters, cluster_outlines, ClusterConfig, Measurement};

fn main() {
    println!("Cluster Extraction Example\n");

    let mut catalog = Vec::new();
    // Two coherent structures with different field directions
    add_blob(&mut catalog, 10.0, 10.0, 20.0, 40);
    add_blob(&mut catalog, 100.0, -30.0, 150.0, 40);
    // Scattered field stars
    for i in 0..30 {
        let t = i as f64;
        catalog.push(Measurement::new(-150.0 + t * 9.7, -60.0 + t * 3.9, 0.5, (t * 37.0) % 180.0, 0.1, 4.0));
    }

    let config = ClusterConfig {
        max_separation: 2.0,
        min_neighbors: 8,
        ..ClusterConfig::default()
    };

    let analysis = match analyze_clusters(&catalog, &config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Clustering failed: {}", e);
            return;
        }
    };

    println!(
        "{} of {} measurements fall in {} clusters\n",
        analysis.clustered.len(),
        catalog.len(),
        analysis.summaries.len()
    );
    for s in &analysis.summaries {
        println!(
            "Cluster {}: center ({:.3}, {:.3}), angle {:.1}°, {} members",
            s.cluster, s.longitude, s.latitude, s.angle, s.members
        );
    }

    if let Ok(outlines) = cluster_outlines(&analysis.clustered) {
        println!();
        for o in &outlines {
            println!(
                "Cluster {} outline: {} vertices, area {:.2} deg²",
                o.cluster,
                o.hull.exterior().0.len(),
                o.hull.unsigned_area()
            );
        }
    }
}

fn add_blob(catalog: &mut Vec<Measurement>, lon: f64, lat: f64, angle: f64, count: usize) {
    for i in 0..count {
        let t = i as f64;
        let (s, c) = (t * 2.39996).sin_cos();
        let r = 0.15 * t.sqrt();
        catalog.push(Measurement::new(
            lon + r * c,
            lat + r * s,
            1.2,
            angle + (t * 7.1).sin() * 0.5,
            0.1,
            2.0,
        ));
    }
}
