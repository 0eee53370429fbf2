//! Companion-file layout and processing parameters

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extension of persisted array artifacts
pub const ARRAY_EXTENSION: &str = "npy";

/// Extension of ENVI sidecar headers
pub const HEADER_EXTENSION: &str = "hdr";

/// Persisted array path for a source raster: same directory, same stem,
/// array extension
pub fn array_path_for<P: AsRef<Path>>(source: P) -> PathBuf {
    let source = source.as_ref();
    let stem = source
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    let mut path = source.with_file_name(stem);
    path.set_extension(ARRAY_EXTENSION);
    path
}

/// Path for a product derived from a persisted array: `<stem>_<suffix>.npy`
pub fn derived_path_for<P: AsRef<Path>>(array: P, suffix: &str) -> PathBuf {
    let array = array.as_ref();
    let stem = array
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    array.with_file_name(format!("{}_{}.{}", stem, suffix, ARRAY_EXTENSION))
}

/// The set of files that make up one dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPaths {
    /// Raster readable by GDAL
    pub source: PathBuf,
    /// ENVI text header carrying wavelengths, if any
    pub header: Option<PathBuf>,
    /// Persisted numeric array
    pub array: PathBuf,
}

impl DatasetPaths {
    /// Derive the companion paths from a source raster.
    ///
    /// The header is looked up as `<stem>.hdr` first, then `<source>.hdr`;
    /// it stays `None` when neither exists.
    pub fn from_source<P: AsRef<Path>>(source: P) -> Self {
        let source = source.as_ref().to_path_buf();
        let header = Self::probe_header(&source);
        let array = array_path_for(&source);

        log::debug!(
            "Dataset paths: source={}, header={:?}, array={}",
            source.display(),
            header,
            array.display()
        );

        Self {
            source,
            header,
            array,
        }
    }

    pub fn with_header<P: Into<PathBuf>>(mut self, header: P) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn with_array<P: Into<PathBuf>>(mut self, array: P) -> Self {
        self.array = array.into();
        self
    }

    /// Path for a product derived from this dataset, e.g. `<stem>_ndvi.npy`
    pub fn derived_path(&self, suffix: &str) -> PathBuf {
        derived_path_for(&self.array, suffix)
    }

    fn probe_header(source: &Path) -> Option<PathBuf> {
        let replaced = source.with_extension(HEADER_EXTENSION);
        let mut appended = source.as_os_str().to_os_string();
        appended.push(".");
        appended.push(HEADER_EXTENSION);

        [replaced, PathBuf::from(appended)]
            .into_iter()
            .find(|candidate| candidate != source && candidate.is_file())
    }
}

/// Parameters for the normalized-difference vegetation product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexParams {
    /// Target near-infrared wavelength (nm)
    pub nir_wavelength: f64,
    /// Target red wavelength (nm)
    pub red_wavelength: f64,
    /// 0-based band used for NIR when the header has no wavelengths
    pub fallback_nir_band: usize,
    /// 0-based band used for red when the header has no wavelengths
    pub fallback_red_band: usize,
    /// Suffix appended to the array stem for the output file
    pub output_suffix: String,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            nir_wavelength: 860.0,
            red_wavelength: 660.0,
            fallback_nir_band: 55,
            fallback_red_band: 95,
            output_suffix: "ndvi".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_path_for() {
        assert_eq!(
            array_path_for("/data/scenes/h20160212_003501.img"),
            PathBuf::from("/data/scenes/h20160212_003501.npy")
        );
        assert_eq!(array_path_for("relative.tif"), PathBuf::from("relative.npy"));
        assert_eq!(array_path_for("/data/no_extension"), PathBuf::from("/data/no_extension.npy"));
    }

    #[test]
    fn test_derived_path() {
        let paths = DatasetPaths::from_source("/data/scene.img");
        assert_eq!(paths.derived_path("ndvi"), PathBuf::from("/data/scene_ndvi.npy"));
    }

    #[test]
    fn test_header_probe_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scene.img");
        std::fs::write(&source, [0u8; 4]).unwrap();

        let paths = DatasetPaths::from_source(&source);
        assert_eq!(paths.header, None);

        let header = dir.path().join("scene.hdr");
        std::fs::write(&header, "ENVI\n").unwrap();
        let paths = DatasetPaths::from_source(&source);
        assert_eq!(paths.header, Some(header));

        let paths = paths.with_array(dir.path().join("cache.npy")).with_header("other.hdr");
        assert_eq!(paths.array, dir.path().join("cache.npy"));
        assert_eq!(paths.header, Some(PathBuf::from("other.hdr")));
    }

    #[test]
    fn test_appended_header_probe() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scene.img");
        let header = dir.path().join("scene.img.hdr");
        std::fs::write(&header, "ENVI\n").unwrap();

        assert_eq!(DatasetPaths::from_source(&source).header, Some(header));
    }
}
