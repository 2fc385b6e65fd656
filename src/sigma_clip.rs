//! Angular outlier rejection for a zone's measurements.
//!
//! A point survives when its angle lies within `sigma_limit` standard deviations
//! of the zone's weighted mean angle. Two situations leave the sample untouched:
//! a spread of exactly zero (one point, or identical angles), and a window so
//! narrow that nothing would survive. A zone is never emptied.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_same_len, PolarizationError, Result};
use crate::geo_utils::axial_difference;
use crate::stats::{axial_std_dev, population_std_dev, weighted_axial_mean, weighted_mean};
use crate::{AngleMode, Measurement};

/// The four parallel per-zone buffers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneSample {
    pub polarization: Vec<f64>,
    pub polarization_error: Vec<f64>,
    pub angle: Vec<f64>,
    pub angle_error: Vec<f64>,
}

impl ZoneSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sample from parallel sequences, which must share one length.
    pub fn from_parts(
        polarization: Vec<f64>,
        polarization_error: Vec<f64>,
        angle: Vec<f64>,
        angle_error: Vec<f64>,
    ) -> Result<Self> {
        let n = polarization.len();
        ensure_same_len(n, polarization_error.len())?;
        ensure_same_len(n, angle.len())?;
        ensure_same_len(n, angle_error.len())?;
        Ok(Self {
            polarization,
            polarization_error,
            angle,
            angle_error,
        })
    }

    pub fn push(&mut self, m: &Measurement) {
        self.polarization.push(m.polarization);
        self.polarization_error.push(m.polarization_error);
        self.angle.push(m.angle);
        self.angle_error.push(m.angle_error);
    }

    pub fn len(&self) -> usize {
        self.polarization.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polarization.is_empty()
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
        (
            self.polarization,
            self.polarization_error,
            self.angle,
            self.angle_error,
        )
    }

    fn retain_indices(&self, keep: &[usize]) -> Self {
        let pick = |v: &[f64]| keep.iter().map(|&i| v[i]).collect();
        Self {
            polarization: pick(&self.polarization),
            polarization_error: pick(&self.polarization_error),
            angle: pick(&self.angle),
            angle_error: pick(&self.angle_error),
        }
    }
}

/// Fail with [`PolarizationError::InvalidConfig`] unless `sigma_limit` is finite
/// and non-negative.
pub(crate) fn validate_sigma_limit(sigma_limit: f64) -> Result<()> {
    if sigma_limit.is_finite() && sigma_limit >= 0.0 {
        Ok(())
    } else {
        Err(PolarizationError::invalid(
            "sigma_limit",
            sigma_limit,
            "must be a finite, non-negative number of standard deviations",
        ))
    }
}

/// What the filter did to a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOutcome {
    /// All angles identical (or a single point); nothing to measure against
    ZeroSpread,
    /// Points outside the window were removed (possibly none)
    Filtered { rejected: usize },
    /// The window would have removed every point; the input is kept whole
    Fallback,
}

/// A clipped sample and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipResult {
    pub sample: ZoneSample,
    pub outcome: ClipOutcome,
}

/// Reject angular outliers from `sample`.
///
/// The window is `[mean - sigma_limit·spread, mean + sigma_limit·spread]`, bounds
/// included, where `mean` is the error-weighted mean angle and `spread` the
/// unweighted population standard deviation. With [`AngleMode::Axial`] both are
/// measured on the 180° circle and distances are wrapped.
///
/// # Errors
///
/// - [`PolarizationError::EmptyInput`] for an empty sample
/// - [`PolarizationError::ShapeMismatch`] if the buffers differ in length
/// - [`PolarizationError::InvalidConfig`] for a negative or non-finite `sigma_limit`
pub fn sigma_clip(sample: ZoneSample, sigma_limit: f64, mode: AngleMode) -> Result<ClipResult> {
    validate_sigma_limit(sigma_limit)?;
    let n = sample.len();
    ensure_same_len(n, sample.polarization_error.len())?;
    ensure_same_len(n, sample.angle.len())?;
    ensure_same_len(n, sample.angle_error.len())?;
    if n == 0 {
        return Err(PolarizationError::empty("sigma_clip"));
    }

    let (center, spread) = match mode {
        AngleMode::Linear => (
            weighted_mean(&sample.angle, &sample.angle_error)?,
            population_std_dev(&sample.angle)?,
        ),
        AngleMode::Axial => (
            weighted_axial_mean(&sample.angle, &sample.angle_error)?,
            axial_std_dev(&sample.angle)?,
        ),
    };

    if spread == 0.0 {
        return Ok(ClipResult {
            sample,
            outcome: ClipOutcome::ZeroSpread,
        });
    }

    let half_width = sigma_limit * spread;
    let keep: Vec<usize> = sample
        .angle
        .iter()
        .enumerate()
        .filter(|(_, &a)| match mode {
            AngleMode::Linear => a >= center - half_width && a <= center + half_width,
            AngleMode::Axial => axial_difference(a, center).abs() <= half_width,
        })
        .map(|(i, _)| i)
        .collect();

    if keep.is_empty() {
        return Ok(ClipResult {
            sample,
            outcome: ClipOutcome::Fallback,
        });
    }

    let rejected = n - keep.len();
    let sample = if rejected == 0 {
        sample
    } else {
        sample.retain_indices(&keep)
    };
    Ok(ClipResult {
        sample,
        outcome: ClipOutcome::Filtered { rejected },
    })
}

/// Co-filter four parallel sequences, keeping the points whose angle is within
/// `sigma_limit` standard deviations of the weighted mean angle.
///
/// Angles are treated as plain numbers. Returns the surviving
/// `(pol, pol_err, ang, ang_err)`; never returns empty sequences for non-empty input.
///
/// # Example
///
/// ```rust
/// use polarization_map::sigma_clip::clip;
///
/// let (pol, _, ang, _) = clip(
///     vec![1.0, 1.0, 1.0, 1.0, 9.0],
///     vec![0.1; 5],
///     vec![10.0, 11.0, 9.0, 10.0, 90.0],
///     vec![1.0; 5],
///     1.5,
/// )
/// .unwrap();
/// assert_eq!(ang, vec![10.0, 11.0, 9.0, 10.0]);
/// assert_eq!(pol.len(), 4);
/// ```
pub fn clip(
    pol: Vec<f64>,
    pol_err: Vec<f64>,
    ang: Vec<f64>,
    ang_err: Vec<f64>,
    sigma_limit: f64,
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>)> {
    let sample = ZoneSample::from_parts(pol, pol_err, ang, ang_err)?;
    Ok(sigma_clip(sample, sigma_limit, AngleMode::Linear)?
        .sample
        .into_parts())
}
