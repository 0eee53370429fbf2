use crate::types::{DerivedIndexRaster, PixelArray, SpectralError, SpectralResult};
use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

/// What a division by zero produces
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DivisionPolicy {
    /// Zero denominators yield NaN ("no data")
    #[default]
    NanOnZero,
    /// Zero denominators yield a fixed value
    Fill(f64),
}

impl DivisionPolicy {
    fn zero_denominator_value(self) -> f64 {
        match self {
            DivisionPolicy::NanOnZero => f64::NAN,
            DivisionPolicy::Fill(value) => value,
        }
    }
}

/// Divide without ever raising or producing infinity from a zero denominator
#[inline]
pub fn safe_divide(numerator: f64, denominator: f64, policy: DivisionPolicy) -> f64 {
    if denominator == 0.0 {
        policy.zero_denominator_value()
    } else {
        numerator / denominator
    }
}

/// Element-wise band arithmetic
#[derive(Debug, Clone, Default)]
pub struct BandMath {
    policy: DivisionPolicy,
}

impl BandMath {
    /// Band math with NaN-on-zero division
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DivisionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DivisionPolicy {
        self.policy
    }

    /// `(a - b) / (a + b)` per element
    pub fn normalized_difference(
        &self,
        band_a: &PixelArray<f64>,
        band_b: &PixelArray<f64>,
    ) -> SpectralResult<DerivedIndexRaster> {
        check_same_shape(band_a, band_b)?;
        log::debug!("Normalized difference over {:?} ({:?})", band_a.dim(), self.policy);

        let policy = self.policy;
        Ok(Zip::from(band_a)
            .and(band_b)
            .map_collect(|&a, &b| safe_divide(a - b, a + b, policy)))
    }

    /// `a / b` per element
    pub fn ratio(&self, band_a: &PixelArray<f64>, band_b: &PixelArray<f64>) -> SpectralResult<DerivedIndexRaster> {
        check_same_shape(band_a, band_b)?;

        let policy = self.policy;
        Ok(Zip::from(band_a)
            .and(band_b)
            .map_collect(|&a, &b| safe_divide(a, b, policy)))
    }

    /// Apply `f` to the values of every band at each pixel.
    ///
    /// `f` receives one value per band, in the order given. Use
    /// [`safe_divide`] inside `f` for any division.
    pub fn combine<F>(&self, bands: &[ArrayView2<f64>], f: F) -> SpectralResult<DerivedIndexRaster>
    where
        F: Fn(&[f64]) -> f64,
    {
        let first = bands
            .first()
            .ok_or_else(|| SpectralError::ShapeMismatch("No bands to combine".to_string()))?;
        let dim = first.dim();
        if let Some(band) = bands.iter().find(|b| b.dim() != dim) {
            return Err(SpectralError::ShapeMismatch(format!(
                "Band shape {:?} differs from {:?}",
                band.dim(),
                dim
            )));
        }

        let mut values = vec![0.0; bands.len()];
        Ok(Array2::from_shape_fn(dim, |(row, col)| {
            for (slot, band) in values.iter_mut().zip(bands) {
                *slot = band[[row, col]];
            }
            f(&values)
        }))
    }

    /// Parallel normalized difference using Rayon
    #[cfg(feature = "parallel")]
    pub fn normalized_difference_parallel(
        &self,
        band_a: &PixelArray<f64>,
        band_b: &PixelArray<f64>,
    ) -> SpectralResult<DerivedIndexRaster> {
        check_same_shape(band_a, band_b)?;
        log::debug!(
            "Parallel normalized difference over {:?} on {} threads",
            band_a.dim(),
            rayon::current_num_threads()
        );

        let policy = self.policy;
        Ok(Zip::from(band_a)
            .and(band_b)
            .par_map_collect(|&a, &b| safe_divide(a - b, a + b, policy)))
    }
}

/// `(a - b) / (a + b)` with NaN where `a + b == 0`
pub fn normalized_difference(
    band_a: &PixelArray<f64>,
    band_b: &PixelArray<f64>,
) -> SpectralResult<DerivedIndexRaster> {
    normalized_difference_with(band_a, band_b, DivisionPolicy::NanOnZero)
}

/// `(a - b) / (a + b)` with zero denominators resolved by `policy`
pub fn normalized_difference_with(
    band_a: &PixelArray<f64>,
    band_b: &PixelArray<f64>,
    policy: DivisionPolicy,
) -> SpectralResult<DerivedIndexRaster> {
    BandMath::with_policy(policy).normalized_difference(band_a, band_b)
}

fn check_same_shape(a: &PixelArray<f64>, b: &PixelArray<f64>) -> SpectralResult<()> {
    if a.dim() != b.dim() {
        return Err(SpectralError::ShapeMismatch(format!(
            "Bands have different shapes: {:?} vs {:?}",
            a.dim(),
            b.dim()
        )));
    }
    Ok(())
}

/// Spacing between the first two band centres
pub fn band_spacing(wavelengths: &[f64]) -> Option<f64> {
    match wavelengths {
        [first, second, ..] => Some((second - first).abs()),
        _ => None,
    }
}

/// Relative deviation from the first gap still treated as uniform spacing
pub const SPACING_TOLERANCE: f64 = 0.01;

/// Whether every gap between consecutive band centres stays within
/// `tolerance * first_gap` of the first gap
pub fn is_uniform_spacing(wavelengths: &[f64], tolerance: f64) -> bool {
    let first = match band_spacing(wavelengths) {
        Some(gap) => gap,
        None => return true,
    };
    wavelengths
        .windows(2)
        .all(|pair| ((pair[1] - pair[0]).abs() - first).abs() <= tolerance * first)
}

/// Index (0-based) of the band whose centre is nearest to `target`.
///
/// `spacing` is the expected distance between neighbouring band centres;
/// a target further than one spacing from every band is out of coverage.
pub fn nearest_band(wavelengths: &[f64], target: f64, spacing: f64) -> SpectralResult<usize> {
    let (index, distance) = wavelengths
        .iter()
        .enumerate()
        .map(|(i, w)| (i, (w - target).abs()))
        .filter(|(_, d)| !d.is_nan())
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| SpectralError::Index("No wavelengths to search".to_string()))?;

    if spacing > 0.0 && distance > spacing {
        return Err(SpectralError::Index(format!(
            "No band within {} of {} (nearest is band {} at distance {})",
            spacing, target, index, distance
        )));
    }

    log::debug!("Wavelength {} resolved to band {} ({})", target, index, wavelengths[index]);
    Ok(index)
}

/// Wavelength interval covered by a band, assuming uniform spacing
pub fn band_wavelength_range(wavelengths: &[f64], band: usize) -> SpectralResult<(f64, f64)> {
    let centre = *wavelengths.get(band).ok_or_else(|| {
        SpectralError::Index(format!("Band {} outside [0, {})", band, wavelengths.len()))
    })?;
    let half = band_spacing(wavelengths).unwrap_or(0.0) / 2.0;
    Ok((centre - half, centre + half))
}

/// Minimum and maximum over non-NaN elements, `None` if there are none
pub fn nan_min_max(array: &DerivedIndexRaster) -> Option<(f64, f64)> {
    array
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
