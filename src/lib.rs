//! specscope: ENVI header parsing, raster caching and band math for
//! hyperspectral remote-sensing imagery
//!
//! Turns ENVI headers and GDAL-readable rasters into typed metadata and
//! `.npy`-cached arrays, then derives normalized-difference products and
//! per-pixel spectral curves for interactive inspection.

pub mod types;
pub mod config;
pub mod io;
pub mod core;
pub mod pipeline;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use types::{
    HeaderRecord, HeaderValue, GeoTransform, RasterStack, SpectralCurve, SpectralPoint,
    SpectralError, SpectralResult, PixelArray, PixelStack, DerivedIndexRaster,
};

pub use config::{DatasetPaths, IndexParams};
pub use io::{HeaderParser, RasterAccess, RasterHandle, ArrayStore};
pub use crate::core::{BandMath, DivisionPolicy, normalized_difference_with, SpectralIndex, SpectralSession, CurveMemo};
pub use pipeline::{convert, compute_index};
