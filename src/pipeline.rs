//! Batch entry points: raster-to-array conversion and index computation

use crate::config::{derived_path_for, DatasetPaths, IndexParams};
use crate::core::band_math::{
    band_spacing, band_wavelength_range, is_uniform_spacing, nan_min_max, nearest_band, BandMath, SPACING_TOLERANCE,
};
use crate::core::spectral_index::{SpectralIndex, SpectralSession};
use crate::io::{ArrayStore, HeaderParser, RasterAccess};
use crate::types::{DerivedIndexRaster, HeaderRecord, SpectralError, SpectralResult};
use ndarray::Axis;
use std::path::{Path, PathBuf};

/// Convert a raster to a persisted array next to it; returns the array path
pub fn convert<P: AsRef<Path>>(input_path: P, driver_hint: Option<&str>) -> SpectralResult<PathBuf> {
    let paths = DatasetPaths::from_source(input_path);
    convert_dataset(&paths, driver_hint)?;
    Ok(paths.array)
}

/// Convert `paths.source` into `paths.array`
pub fn convert_dataset(paths: &DatasetPaths, driver_hint: Option<&str>) -> SpectralResult<()> {
    log::info!("Reading raster from {}", paths.source.display());

    let stack = {
        let handle = RasterAccess::open(&paths.source, driver_hint)?;
        handle.read_stack()?
    };

    log::info!("Saving array to {}", paths.array.display());
    ArrayStore::write_stack_to(&stack, &paths.array)
}

/// Compute a normalized-difference index from a persisted array and its
/// header; returns the path of the written `<stem>_<suffix>.npy`
pub fn compute_index<P: AsRef<Path>, Q: AsRef<Path>>(
    array_path: P,
    header_path: Q,
    params: &IndexParams,
) -> SpectralResult<PathBuf> {
    let array_path = array_path.as_ref();
    let header = HeaderParser::parse_file(header_path)?;
    let index = index_from_array(array_path, &header, params)?;

    let output_path = derived_path_for(array_path, &params.output_suffix);
    log::info!("Saving index to {}", output_path.display());
    ArrayStore::write_to(&index, &output_path)?;
    Ok(output_path)
}

/// [`compute_index`] over a configured dataset
pub fn compute_index_for(paths: &DatasetPaths, params: &IndexParams) -> SpectralResult<PathBuf> {
    let header_path = paths.header.as_ref().ok_or_else(|| {
        SpectralError::NotFound(format!("No header configured for {}", paths.source.display()))
    })?;
    compute_index(&paths.array, header_path, params)
}

/// Load the persisted stack and derive the index without writing it
pub fn index_from_array(
    array_path: &Path,
    header: &HeaderRecord,
    params: &IndexParams,
) -> SpectralResult<DerivedIndexRaster> {
    let cube = ArrayStore::load_stack(array_path)?.to_f64();
    let band_count = cube.len_of(Axis(0));

    let (nir, red) = select_bands(header, band_count, params)?;
    log::info!("Using band {} as NIR and band {} as red", nir, red);

    let nir_band = cube.index_axis(Axis(0), nir).to_owned();
    let red_band = cube.index_axis(Axis(0), red).to_owned();
    let index = BandMath::new().normalized_difference(&nir_band, &red_band)?;

    match nan_min_max(&index) {
        Some((lo, hi)) => log::info!("Index range: {:.4} to {:.4}", lo, hi),
        None => log::warn!("Index has no valid pixels"),
    }
    Ok(index)
}

/// Open an inspection session over a persisted array and its header
pub fn open_session<P: AsRef<Path>, Q: AsRef<Path>>(array_path: P, header_path: Q) -> SpectralResult<SpectralSession> {
    let header_path = header_path.as_ref();
    let header = HeaderParser::parse_file(header_path)?;
    let wavelengths = header.wavelengths()?.ok_or_else(|| {
        SpectralError::Format(format!("{} has no wavelength list", header_path.display()))
    })?;

    let stack = ArrayStore::load_stack(array_path)?;
    let index = SpectralIndex::from_stack(&stack, wavelengths)?;
    Ok(SpectralSession::new(index))
}

/// Resolve NIR and red band indices (0-based) by wavelength, falling back to
/// the configured indices when the header carries no wavelengths
pub fn select_bands(header: &HeaderRecord, band_count: usize, params: &IndexParams) -> SpectralResult<(usize, usize)> {
    let (nir, red) = match header.wavelengths()? {
        Some(wavelengths) => {
            if wavelengths.len() != band_count {
                return Err(SpectralError::ShapeMismatch(format!(
                    "Header lists {} wavelengths for an array of {} bands",
                    wavelengths.len(),
                    band_count
                )));
            }

            let spacing = band_spacing(&wavelengths).unwrap_or(0.0);
            if !is_uniform_spacing(&wavelengths, SPACING_TOLERANCE) {
                log::warn!(
                    "Wavelength spacing is not uniform; band matching and ranges use the first gap ({} nm)",
                    spacing
                );
            }
            let nir = nearest_band(&wavelengths, params.nir_wavelength, spacing)?;
            let red = nearest_band(&wavelengths, params.red_wavelength, spacing)?;

            for band in [nir, red] {
                let (lo, hi) = band_wavelength_range(&wavelengths, band)?;
                log::info!("band {} wavelength range: {:.2}-{:.2} nm", band, lo, hi);
            }
            (nir, red)
        }
        None => {
            log::warn!(
                "Header has no wavelengths, using fallback bands {} (NIR) and {} (red)",
                params.fallback_nir_band,
                params.fallback_red_band
            );
            (params.fallback_nir_band, params.fallback_red_band)
        }
    };

    for band in [nir, red] {
        if band >= band_count {
            return Err(SpectralError::Index(format!(
                "Band {} outside [0, {})",
                band, band_count
            )));
        }
    }

    Ok((nir, red))
}
