//! I/O modules for ENVI headers, GDAL rasters and persisted arrays

pub mod header;
pub mod raster;
pub mod array_store;

pub use header::{HeaderParser, parse_header_file};
pub use raster::{RasterAccess, RasterHandle};
pub use array_store::ArrayStore;
