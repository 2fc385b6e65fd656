//! Example of zone statistics over a synthetic catalog.
//!
//! Run with: cargo run --example zone_statistics

use polarization_map::{compute_zone_statistics, AngleMode, Measurement, ZoneConfig};
use std::time::Instant;

fn main() {
    println!("Zone Statistics Example\n");

    // A patch of sky where the field runs at ~40° with a few scattered stars,
    // and a second patch where it runs close to the 0°/180° seam
    let mut catalog = Vec::new();
    for i in 0..200 {
        let t = i as f64;
        let lon = -20.0 + (t * 0.37) % 12.0;
        let lat = -6.0 + (t * 0.53) % 12.0;
        let angle = if i % 17 == 0 { 130.0 } else { 40.0 + jitter(t, 6.0) };
        catalog.push(Measurement::new(lon, lat, 1.5 + jitter(t, 0.4), angle, 0.1, 2.0 + jitter(t, 1.0)));
    }
    for i in 0..60 {
        let t = i as f64;
        let angle = (178.0 + jitter(t, 5.0)).rem_euclid(180.0);
        catalog.push(Measurement::new(30.0 + (t * 0.11) % 2.5, 10.0 + (t * 0.07) % 2.5, 0.8, angle, 0.05, 3.0));
    }

    for mode in [AngleMode::Linear, AngleMode::Axial] {
        let config = ZoneConfig {
            angle_mode: mode,
            ..ZoneConfig::default()
        };

        let start = Instant::now();
        let stats = match compute_zone_statistics(&catalog, &config) {
            Ok(stats) => stats,
            Err(e) => {
                eprintln!("Zone statistics failed: {}", e);
                return;
            }
        };
        let elapsed = start.elapsed();

        println!("{:?} angles: {} zones in {:?}", mode, stats.len(), elapsed);
        println!("  {:>8} {:>8} {:>7} {:>7} {:>6} {:>6}", "lon", "lat", "pol", "angle", "before", "after");
        for s in &stats {
            println!(
                "  {:8.2} {:8.2} {:7.3} {:7.2} {:6} {:6}",
                s.zone_lon, s.zone_lat, s.zone_pol, s.zone_ang, s.points_before, s.points_after
            );
        }
        println!();
    }
}

/// Deterministic pseudo-noise in `[-scale, scale]`
fn jitter(t: f64, scale: f64) -> f64 {
    (t * 12.9898).sin() * scale
}
