use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Single-band pixel array (rows x cols)
pub type PixelArray<T> = Array2<T>;

/// Stacked multi-band pixel array (bands x rows x cols)
pub type PixelStack<T> = Array3<T>;

/// Derived index raster, NaN where the index is undefined
pub type DerivedIndexRaster = Array2<f64>;

/// Value stored under a header key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderValue {
    /// Plain `key = value` entry, or a brace-delimited description
    Scalar(String),
    /// Brace-delimited, comma-separated list
    List(Vec<String>),
}

impl HeaderValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            HeaderValue::Scalar(s) => Some(s),
            HeaderValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            HeaderValue::Scalar(_) => None,
            HeaderValue::List(items) => Some(items),
        }
    }
}

/// Parsed ENVI header: lowercase keys mapped to scalar or list values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderRecord {
    entries: HashMap<String, HeaderValue>,
}

impl HeaderRecord {
    pub(crate) fn insert(&mut self, key: String, value: HeaderValue) {
        // Later occurrences of a key replace earlier ones
        self.entries.insert(key, value);
    }

    /// Look up a key (case-insensitive)
    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.entries.get(&key.to_lowercase())
    }

    pub fn get_scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(HeaderValue::as_scalar)
    }

    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(HeaderValue::as_list)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Geospatial transformation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl From<[f64; 6]> for GeoTransform {
    fn from(gt: [f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }
}

impl GeoTransform {
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    /// Map a geographic coordinate to a fractional (row, col) pixel position.
    ///
    /// Only north-up transforms (zero rotation terms) are supported; the
    /// sign of `pixel_height` decides the row direction, so the usual
    /// negative height yields rows counted downward from the top edge.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if self.rotation_x != 0.0 || self.rotation_y != 0.0 {
            return None;
        }
        if self.pixel_width == 0.0 || self.pixel_height == 0.0 {
            return None;
        }
        let col = (x - self.top_left_x) / self.pixel_width;
        let row = (y - self.top_left_y) / self.pixel_height;
        Some((row, col))
    }
}

/// Multi-band array in the dataset's native sample type
#[derive(Debug, Clone, PartialEq)]
pub enum RasterStack {
    U8(PixelStack<u8>),
    U16(PixelStack<u16>),
    I16(PixelStack<i16>),
    U32(PixelStack<u32>),
    I32(PixelStack<i32>),
    F32(PixelStack<f32>),
    F64(PixelStack<f64>),
}

impl RasterStack {
    /// (bands, rows, cols)
    pub fn dim(&self) -> (usize, usize, usize) {
        match self {
            RasterStack::U8(a) => a.dim(),
            RasterStack::U16(a) => a.dim(),
            RasterStack::I16(a) => a.dim(),
            RasterStack::U32(a) => a.dim(),
            RasterStack::I32(a) => a.dim(),
            RasterStack::F32(a) => a.dim(),
            RasterStack::F64(a) => a.dim(),
        }
    }

    pub fn band_count(&self) -> usize {
        self.dim().0
    }

    pub fn dtype_name(&self) -> &'static str {
        match self {
            RasterStack::U8(_) => "uint8",
            RasterStack::U16(_) => "uint16",
            RasterStack::I16(_) => "int16",
            RasterStack::U32(_) => "uint32",
            RasterStack::I32(_) => "int32",
            RasterStack::F32(_) => "float32",
            RasterStack::F64(_) => "float64",
        }
    }

    /// Widen every sample to f64 for band math and spectral lookups
    pub fn to_f64(&self) -> PixelStack<f64> {
        match self {
            RasterStack::U8(a) => a.mapv(f64::from),
            RasterStack::U16(a) => a.mapv(f64::from),
            RasterStack::I16(a) => a.mapv(f64::from),
            RasterStack::U32(a) => a.mapv(f64::from),
            RasterStack::I32(a) => a.mapv(f64::from),
            RasterStack::F32(a) => a.mapv(f64::from),
            RasterStack::F64(a) => a.clone(),
        }
    }
}

/// One sample of a spectral curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralPoint {
    pub wavelength: f64,
    pub value: f64,
}

/// Per-band values at one pixel, in band order.
///
/// An empty curve is the out-of-bounds result of a pixel query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectralCurve {
    pub row: i64,
    pub col: i64,
    pub points: Vec<SpectralPoint>,
}

impl SpectralCurve {
    pub fn empty(row: i64, col: i64) -> Self {
        Self {
            row,
            col,
            points: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn wavelengths(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.wavelength).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Error types for spectral dataset processing
#[derive(Debug, thiserror::Error)]
pub enum SpectralError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid header format: {0}")]
    Format(String),

    #[error("Dataset not found or unreadable: {0}")]
    NotFound(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Index out of range: {0}")]
    Index(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Failed to read array file: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),

    #[error("Failed to write array file: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),
}

/// Result type for spectral operations
pub type SpectralResult<T> = Result<T, SpectralError>;
