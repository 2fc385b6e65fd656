//! # Sky Coordinate Utilities
//!
//! Small geometric helpers used throughout the crate.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`normalize_longitude`] | Map a `[0, 360)` longitude into `[-180, 180]` |
//! | [`normalize_axial`] | Fold an angle into the axial range `[0, 180)` |
//! | [`axial_difference`] | Signed smallest difference between two axial angles |
//! | [`field_angle`] | Polarization angle or its perpendicular (magnetic field) |
//! | [`direction_bar`] | Line segment showing a polarization direction |
//! | [`compute_bounds`] | Bounding box of a set of measurements |
//! | [`compute_center`] | Arithmetic centroid of a set of measurements |
//!
//! ## Coordinate System
//!
//! Positions are Galactic longitude/latitude in degrees with the Galactic center at
//! longitude 0. Polarization angles are axial: 0° and 180° describe the same
//! orientation.

use geo::{coord, Line};
use crate::{Bounds, Measurement};

/// Shift longitudes above 180° down by a full turn, so that the Galactic center sits
/// in the middle of the map.
///
/// ```rust
/// use polarization_map::geo_utils::normalize_longitude;
///
/// assert_eq!(normalize_longitude(350.0), -10.0);
/// assert_eq!(normalize_longitude(180.0), 180.0);
/// assert_eq!(normalize_longitude(-45.0), -45.0);
/// ```
#[inline]
pub fn normalize_longitude(longitude: f64) -> f64 {
    if longitude > 180.0 {
        longitude - 360.0
    } else {
        longitude
    }
}

/// Fold an angle in degrees into `[0, 180)`.
#[inline]
pub fn normalize_axial(angle: f64) -> f64 {
    let folded = angle.rem_euclid(180.0);
    // rem_euclid can round tiny negative inputs up to exactly 180
    if folded >= 180.0 {
        0.0
    } else {
        folded
    }
}

/// Signed difference `a - b` between two axial angles, wrapped into `[-90, 90)`.
///
/// ```rust
/// use polarization_map::geo_utils::axial_difference;
///
/// assert_eq!(axial_difference(179.0, 1.0), -2.0);
/// assert_eq!(axial_difference(10.0, 40.0), -30.0);
/// ```
#[inline]
pub fn axial_difference(a: f64, b: f64) -> f64 {
    (a - b + 90.0).rem_euclid(180.0) - 90.0
}

/// The direction to display for a polarization angle.
///
/// With `perpendicular` the angle is rotated by 90°, which gives the orientation of
/// the magnetic field that produced the polarization. Results above 180° are folded
/// back by 180°.
pub fn field_angle(angle: f64, perpendicular: bool) -> f64 {
    let rotated = if perpendicular { angle + 90.0 } else { angle };
    if rotated > 180.0 {
        rotated - 180.0
    } else {
        rotated
    }
}

/// A bar centred on a measurement, oriented along its (field) angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionBar {
    /// Segment in (longitude, latitude) degrees
    pub line: Line<f64>,
    /// Angle mapped onto `[0, 1]` for color lookups
    pub color_fraction: f64,
}

/// Compute the bar that represents a polarization direction at `(longitude, latitude)`.
///
/// The bar has total length `bar_length` (usually the zone size) and is measured from
/// the longitude axis.
///
/// ```rust
/// use polarization_map::geo_utils::direction_bar;
///
/// let bar = direction_bar(10.0, 20.0, 0.0, 4.0, false);
/// assert_eq!(bar.line.start.x, 8.0);
/// assert_eq!(bar.line.end.x, 12.0);
/// assert_eq!(bar.color_fraction, 0.0);
/// ```
pub fn direction_bar(
    longitude: f64,
    latitude: f64,
    angle: f64,
    bar_length: f64,
    perpendicular: bool,
) -> DirectionBar {
    let shown = field_angle(angle, perpendicular);
    let half = bar_length / 2.0;
    let (sin, cos) = shown.to_radians().sin_cos();

    DirectionBar {
        line: Line::new(
            coord! { x: longitude - half * cos, y: latitude - half * sin },
            coord! { x: longitude + half * cos, y: latitude + half * sin },
        ),
        color_fraction: shown / 180.0,
    }
}

/// Bounding box of a set of measurements, `None` when empty.
pub fn compute_bounds(records: &[Measurement]) -> Option<Bounds> {
    if records.is_empty() {
        return None;
    }
    let mut bounds = Bounds {
        min_lon: f64::MAX,
        max_lon: f64::MIN,
        min_lat: f64::MAX,
        max_lat: f64::MIN,
    };
    for r in records {
        bounds.min_lon = bounds.min_lon.min(r.longitude);
        bounds.max_lon = bounds.max_lon.max(r.longitude);
        bounds.min_lat = bounds.min_lat.min(r.latitude);
        bounds.max_lat = bounds.max_lat.max(r.latitude);
    }
    Some(bounds)
}

/// Arithmetic centroid `(longitude, latitude)`, `None` when empty.
///
/// # Notes
///
/// This is a plain average in degrees. Groups straddling the ±180° longitude seam
/// average to somewhere near 0°; longitudes are expected to be normalised first.
pub fn compute_center(records: &[Measurement]) -> Option<(f64, f64)> {
    if records.is_empty() {
        return None;
    }
    let n = records.len() as f64;
    let sum_lon: f64 = records.iter().map(|r| r.longitude).sum();
    let sum_lat: f64 = records.iter().map(|r| r.latitude).sum();
    Some((sum_lon / n, sum_lat / n))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn at(longitude: f64, latitude: f64) -> Measurement {
        Measurement::new(longitude, latitude, 1.0, 0.0, 0.1, 1.0)
    }

    #[test]
    fn test_normalize_axial() {
        assert_eq!(normalize_axial(190.0), 10.0);
        assert_eq!(normalize_axial(-10.0), 170.0);
        assert_eq!(normalize_axial(180.0), 0.0);
        assert!(normalize_axial(-1e-18) < 180.0);
    }

    #[test]
    fn test_axial_difference_wraps() {
        assert_eq!(axial_difference(1.0, 179.0), 2.0);
        assert_eq!(axial_difference(90.0, 0.0), -90.0);
        assert_eq!(axial_difference(45.0, 45.0), 0.0);
    }

    #[test]
    fn test_field_angle() {
        assert_eq!(field_angle(30.0, false), 30.0);
        assert_eq!(field_angle(30.0, true), 120.0);
        assert_eq!(field_angle(150.0, true), 60.0);
    }

    #[test]
    fn test_direction_bar_vertical() {
        let bar = direction_bar(0.0, 0.0, 0.0, 2.0, true);
        assert!(approx_eq(bar.line.start.x, 0.0, 1e-12));
        assert!(approx_eq(bar.line.start.y, -1.0, 1e-12));
        assert!(approx_eq(bar.line.end.y, 1.0, 1e-12));
        assert_eq!(bar.color_fraction, 0.5);
    }

    #[test]
    fn test_compute_bounds() {
        let records = vec![at(-10.0, 5.0), at(20.0, -3.0), at(0.0, 0.0)];
        let bounds = compute_bounds(&records).unwrap();
        assert_eq!(bounds.min_lon, -10.0);
        assert_eq!(bounds.max_lon, 20.0);
        assert_eq!(bounds.min_lat, -3.0);
        assert_eq!(bounds.max_lat, 5.0);
        assert!(compute_bounds(&[]).is_none());
    }

    #[test]
    fn test_compute_center() {
        let records = vec![at(10.0, 10.0), at(12.0, 14.0)];
        let (lon, lat) = compute_center(&records).unwrap();
        assert!(approx_eq(lon, 11.0, 1e-12));
        assert!(approx_eq(lat, 12.0, 1e-12));
        assert!(compute_center(&[]).is_none());
    }
}
