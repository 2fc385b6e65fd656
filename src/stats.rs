//! # Weighted Statistics
//!
//! Sample statistics shared by the zone and cluster pipelines.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`weighted_mean`] | Mean weighted by the inverse of each measurement error |
//! | [`weighted_axial_mean`] | Same weighting for angles with a 180° period |
//! | [`inverse_tolerance_weights`] | Weights after replacing unknown errors |
//! | [`mean`] / [`median`] | Plain location estimates |
//! | [`population_std_dev`] | Standard deviation without Bessel correction |
//!
//! ## Unknown errors
//!
//! Catalogs encode "error not measured" as `0`. Such a point must neither drop out
//! of the average (zero weight) nor dominate it (infinite weight), so every
//! tolerance `<= 0` is replaced by the largest tolerance in the same sample before
//! weighting. If no tolerance in the sample is positive, all of them fall back to
//! [`TOLERANCE_FLOOR`].

use crate::error::{ensure_same_len, PolarizationError, Result};
use crate::geo_utils::{axial_difference, normalize_axial};

/// Tolerance used when no measurement in a sample has a positive error.
pub const TOLERANCE_FLOOR: f64 = 0.01;

/// Weights (`1 / tolerance`) for a sample, after replacing non-positive tolerances.
///
/// # Example
///
/// ```rust
/// use polarization_map::stats::inverse_tolerance_weights;
///
/// let weights = inverse_tolerance_weights(&[0.0, 2.0, 4.0]);
/// assert_eq!(weights, vec![0.25, 0.5, 0.25]);
/// ```
pub fn inverse_tolerance_weights(tolerances: &[f64]) -> Vec<f64> {
    let max_positive = tolerances
        .iter()
        .copied()
        .filter(|t| *t > 0.0)
        .fold(f64::NEG_INFINITY, f64::max);
    let replacement = if max_positive.is_finite() {
        max_positive
    } else {
        TOLERANCE_FLOOR
    };

    tolerances
        .iter()
        .map(|&t| if t > 0.0 { 1.0 / t } else { 1.0 / replacement })
        .collect()
}

/// Tolerance-weighted mean: `Σ(v·w) / Σ(w)` with `w = 1 / tolerance`.
///
/// A single value is returned as is, whatever its tolerance.
///
/// # Errors
///
/// - [`PolarizationError::ShapeMismatch`] if the slices differ in length
/// - [`PolarizationError::EmptyInput`] if they are empty
///
/// # Example
///
/// ```rust
/// use polarization_map::stats::weighted_mean;
///
/// assert_eq!(weighted_mean(&[1.0, 3.0], &[1.0, 1.0]).unwrap(), 2.0);
/// // An unknown error counts as the worst known error of the sample
/// assert_eq!(weighted_mean(&[10.0, 20.0], &[0.0, 2.0]).unwrap(), 15.0);
/// ```
pub fn weighted_mean(values: &[f64], tolerances: &[f64]) -> Result<f64> {
    ensure_same_len(values.len(), tolerances.len())?;
    match values {
        [] => Err(PolarizationError::empty("weighted_mean")),
        [single] => Ok(*single),
        _ => {
            let weights = inverse_tolerance_weights(tolerances);
            let weight_sum: f64 = weights.iter().sum();
            let weighted_sum: f64 = values.iter().zip(&weights).map(|(v, w)| v * w).sum();
            Ok(weighted_sum / weight_sum)
        }
    }
}

/// Tolerance-weighted mean of axial angles (degrees, period 180°).
///
/// Angles are doubled, averaged as unit vectors with the same weights as
/// [`weighted_mean`], and halved back. The result lies in `[0, 180)`.
pub fn weighted_axial_mean(angles: &[f64], tolerances: &[f64]) -> Result<f64> {
    ensure_same_len(angles.len(), tolerances.len())?;
    match angles {
        [] => Err(PolarizationError::empty("weighted_axial_mean")),
        [single] => Ok(normalize_axial(*single)),
        _ => {
            let weights = inverse_tolerance_weights(tolerances);
            Ok(axial_resultant(angles, &weights))
        }
    }
}

/// Unweighted axial mean in `[0, 180)`.
pub fn axial_mean(angles: &[f64]) -> Result<f64> {
    if angles.is_empty() {
        return Err(PolarizationError::empty("axial_mean"));
    }
    let weights = vec![1.0; angles.len()];
    Ok(axial_resultant(angles, &weights))
}

fn axial_resultant(angles: &[f64], weights: &[f64]) -> f64 {
    let (sin_sum, cos_sum) = angles
        .iter()
        .zip(weights)
        .fold((0.0, 0.0), |(s, c), (a, w)| {
            let doubled = (2.0 * a).to_radians();
            (s + w * doubled.sin(), c + w * doubled.cos())
        });
    normalize_axial(sin_sum.atan2(cos_sum).to_degrees() / 2.0)
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(PolarizationError::empty("mean"));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; for an even count, the mean of the two middle values.
pub fn median(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(PolarizationError::empty("median"));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn population_std_dev(values: &[f64]) -> Result<f64> {
    let center = mean(values)?;
    let variance =
        values.iter().map(|v| (v - center).powi(2)).sum::<f64>() / values.len() as f64;
    Ok(variance.sqrt())
}

/// Root-mean-square axial deviation of `angles` from their unweighted axial mean.
///
/// The axial counterpart of [`population_std_dev`]: deviations are wrapped into
/// `[-90, 90)` before squaring, so 179° and 1° are 2° apart.
pub fn axial_std_dev(angles: &[f64]) -> Result<f64> {
    let center = axial_mean(angles)?;
    let variance = angles
        .iter()
        .map(|a| axial_difference(*a, center).powi(2))
        .sum::<f64>()
        / angles.len() as f64;
    Ok(variance.sqrt())
}
