//! Derived products and per-pixel spectral lookups

pub mod band_math;
pub mod spectral_index;

// Re-export main types
pub use band_math::{
    BandMath, DivisionPolicy, normalized_difference, normalized_difference_with, nearest_band, safe_divide,
};
pub use spectral_index::{SpectralIndex, SpectralSession, CurveMemo};
