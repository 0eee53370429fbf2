use crate::types::{GeoTransform, PixelArray, PixelStack, RasterStack, SpectralError, SpectralResult};
use gdal::raster::{GdalDataType, GdalType};
use gdal::{Dataset, DatasetOptions, GdalOpenFlags, Metadata};
use ndarray::{Array2, Axis};
use std::path::{Path, PathBuf};

/// Geotransform GDAL reports for rasters without georeferencing
const IDENTITY_GEOTRANSFORM: [f64; 6] = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Geo-raster reader backed by GDAL
pub struct RasterAccess;

impl RasterAccess {
    /// Open a raster dataset, optionally restricting GDAL to one driver.
    ///
    /// Accepts anything GDAL can open: plain files, subdataset names such as
    /// `GTIFF_DIR:2:scene.tif`, or `/vsizip/` paths.
    ///
    /// With a driver hint such as `"ENVI"` or `"GTiff"`, the open fails
    /// unless that driver recognises the file (an ENVI binary without its
    /// `.hdr` sidecar is rejected this way).
    pub fn open<P: AsRef<Path>>(path: P, driver_hint: Option<&str>) -> SpectralResult<RasterHandle> {
        let path = path.as_ref();
        log::debug!("Opening raster {} (driver hint: {:?})", path.display(), driver_hint);

        // `path` may be a GDAL identifier (subdataset name, /vsi path), not a file
        let allowed: Vec<&str> = driver_hint.into_iter().collect();
        let options = DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_READONLY | GdalOpenFlags::GDAL_OF_RASTER,
            allowed_drivers: if allowed.is_empty() { None } else { Some(allowed.as_slice()) },
            ..Default::default()
        };

        let dataset = Dataset::open_ex(path, options).map_err(|e| {
            let hint = match driver_hint {
                Some("ENVI") => " (an ENVI binary needs its .hdr sidecar next to it)",
                Some(_) => " (check that the driver hint matches the file format)",
                None => "",
            };
            SpectralError::NotFound(format!("Couldn't open this file: {}{}: {}", path.display(), hint, e))
        })?;

        let driver_name = dataset.driver().short_name();
        if let Some(expected) = driver_hint {
            if !driver_name.eq_ignore_ascii_case(expected) {
                return Err(SpectralError::NotFound(format!(
                    "{} was opened by driver {} but {} was requested",
                    path.display(),
                    driver_name,
                    expected
                )));
            }
        }

        let band_count = dataset.raster_count();
        if band_count < 1 {
            return Err(SpectralError::NotFound(format!(
                "{} contains no raster bands",
                path.display()
            )));
        }

        let geotransform = match dataset.geo_transform() {
            Ok(gt) => gt,
            Err(e) => {
                log::debug!("No geotransform on {} ({}), using identity", path.display(), e);
                IDENTITY_GEOTRANSFORM
            }
        };
        let (width, height) = dataset.raster_size();

        log::info!("{} opened successfully", path.display());
        log::debug!(
            "Raster size: {}x{}, {} bands, driver {}, geotransform {:?}",
            width,
            height,
            band_count,
            driver_name,
            geotransform
        );

        Ok(RasterHandle {
            dataset,
            path: path.to_path_buf(),
            driver_name,
            band_count: band_count as usize,
            geotransform: GeoTransform::from(geotransform),
            width,
            height,
        })
    }

    /// Read band 1 of every subdataset in a container file and stack them
    pub fn stack_subdatasets<P: AsRef<Path>>(path: P) -> SpectralResult<PixelStack<f64>> {
        let names = {
            let container = Self::open(path.as_ref(), None)?;
            container.subdataset_paths()
        };

        if names.is_empty() {
            return Err(SpectralError::NotFound(format!(
                "{} has no subdatasets",
                path.as_ref().display()
            )));
        }

        let mut bands = Vec::with_capacity(names.len());
        for name in &names {
            log::debug!("Reading subdataset {}", name);
            let handle = Self::open(name, None)?;
            bands.push(handle.read_band(1)?);
        }

        let stacked = stack_bands(bands)?;
        log::info!("Stacked {} subdatasets into {:?}", names.len(), stacked.dim());
        Ok(stacked)
    }
}

/// An open raster dataset. The underlying GDAL handle closes on drop.
pub struct RasterHandle {
    dataset: Dataset,
    path: PathBuf,
    driver_name: String,
    band_count: usize,
    geotransform: GeoTransform,
    width: usize,
    height: usize,
}

impl RasterHandle {
    pub fn band_count(&self) -> usize {
        self.band_count
    }

    pub fn geotransform(&self) -> GeoTransform {
        self.geotransform
    }

    /// (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    /// Projection definition as reported by GDAL, passed through untouched
    pub fn projection(&self) -> String {
        self.dataset.projection()
    }

    /// Read one full band (1-based index) widened to f64
    pub fn read_band(&self, band_index: usize) -> SpectralResult<PixelArray<f64>> {
        self.read_band_as::<f64>(band_index)
    }

    /// Read one full band (1-based index) in the requested sample type
    pub fn read_band_as<T: GdalType + Copy>(&self, band_index: usize) -> SpectralResult<PixelArray<T>> {
        if band_index < 1 || band_index > self.band_count {
            return Err(SpectralError::Index(format!(
                "Band {} outside [1, {}] for {}",
                band_index,
                self.band_count,
                self.path.display()
            )));
        }

        let (width, height) = (self.width, self.height);
        let rasterband = self.dataset.rasterband(band_index as isize)?;
        let buffer = rasterband.read_as::<T>((0, 0), (width, height), (width, height), None)?;

        Array2::from_shape_vec((height, width), buffer.data).map_err(|e| {
            SpectralError::Processing(format!("Failed to reshape band {}: {}", band_index, e))
        })
    }

    /// Read every band into a stack in a caller-chosen sample type
    pub fn read_all_as<T: GdalType + Copy>(&self) -> SpectralResult<PixelStack<T>> {
        let bands = (1..=self.band_count)
            .map(|b| self.read_band_as::<T>(b))
            .collect::<SpectralResult<Vec<_>>>()?;
        stack_bands(bands)
    }

    /// Read every band in the dataset's native sample type (taken from band 1)
    pub fn read_stack(&self) -> SpectralResult<RasterStack> {
        let band_type = self.dataset.rasterband(1)?.band_type();
        log::debug!("Reading {} bands of type {:?}", self.band_count, band_type);

        let stack = match band_type {
            GdalDataType::UInt8 => RasterStack::U8(self.read_all_as::<u8>()?),
            GdalDataType::UInt16 => RasterStack::U16(self.read_all_as::<u16>()?),
            GdalDataType::Int16 => RasterStack::I16(self.read_all_as::<i16>()?),
            GdalDataType::UInt32 => RasterStack::U32(self.read_all_as::<u32>()?),
            GdalDataType::Int32 => RasterStack::I32(self.read_all_as::<i32>()?),
            GdalDataType::Float32 => RasterStack::F32(self.read_all_as::<f32>()?),
            GdalDataType::Float64 => RasterStack::F64(self.read_all_as::<f64>()?),
            other => {
                log::warn!("Sample type {:?} has no native mapping, reading as float64", other);
                RasterStack::F64(self.read_all_as::<f64>()?)
            }
        };

        Ok(stack)
    }

    /// Paths of the subdatasets exposed by a container format, if any
    pub fn subdataset_paths(&self) -> Vec<String> {
        self.dataset
            .metadata_domain("SUBDATASETS")
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| {
                let (key, value) = entry.split_once('=')?;
                key.ends_with("_NAME").then(|| value.to_string())
            })
            .collect()
    }

    /// Release the dataset explicitly
    pub fn close(self) {
        log::debug!("Closing {}", self.path.display());
    }
}

/// Stack equally-shaped bands along a new leading axis
pub fn stack_bands<T: Clone>(bands: Vec<PixelArray<T>>) -> SpectralResult<PixelStack<T>> {
    let first_dim = match bands.first() {
        Some(band) => band.dim(),
        None => return Err(SpectralError::ShapeMismatch("No bands to stack".to_string())),
    };

    if let Some((i, band)) = bands.iter().enumerate().find(|(_, b)| b.dim() != first_dim) {
        return Err(SpectralError::ShapeMismatch(format!(
            "Band {} has shape {:?}, expected {:?}",
            i + 1,
            band.dim(),
            first_dim
        )));
    }

    let views: Vec<_> = bands.iter().map(|b| b.view()).collect();
    ndarray::stack(Axis(0), &views)
        .map_err(|e| SpectralError::ShapeMismatch(format!("Failed to stack bands: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_bands_shape() {
        let bands = vec![
            Array2::<f32>::zeros((4, 5)),
            Array2::<f32>::ones((4, 5)),
            Array2::<f32>::from_elem((4, 5), 2.0),
        ];
        let stack = stack_bands(bands).unwrap();

        assert_eq!(stack.dim(), (3, 4, 5));
        assert_eq!(stack[[2, 3, 4]], 2.0);
    }

    #[test]
    fn test_stack_bands_mismatch() {
        let bands = vec![Array2::<u16>::zeros((4, 5)), Array2::<u16>::zeros((5, 4))];
        assert!(matches!(stack_bands(bands), Err(SpectralError::ShapeMismatch(_))));
    }

    #[test]
    fn test_stack_bands_empty() {
        let bands: Vec<Array2<u8>> = Vec::new();
        assert!(stack_bands(bands).is_err());
    }

    #[test]
    fn test_open_missing_file() {
        let result = RasterAccess::open("/nonexistent/scene.img", Some("ENVI"));
        assert!(matches!(result, Err(SpectralError::NotFound(_))));
    }
}
