use crate::types::{
    GeoTransform, PixelStack, RasterStack, SpectralCurve, SpectralError, SpectralPoint, SpectralResult,
};
use std::collections::BTreeMap;

/// Pixel-to-spectrum lookup over a stacked (bands x rows x cols) array
#[derive(Debug, Clone)]
pub struct SpectralIndex {
    cube: PixelStack<f64>,
    wavelengths: Vec<f64>,
}

impl SpectralIndex {
    /// Pair a band stack with its wavelengths (one per band, header order)
    pub fn build(cube: PixelStack<f64>, wavelengths: Vec<f64>) -> SpectralResult<Self> {
        let (bands, rows, cols) = cube.dim();
        if bands != wavelengths.len() {
            return Err(SpectralError::ShapeMismatch(format!(
                "Array has {} bands but {} wavelengths were given",
                bands,
                wavelengths.len()
            )));
        }

        log::debug!("Spectral index over {} bands, {}x{} pixels", bands, rows, cols);
        Ok(Self { cube, wavelengths })
    }

    /// Build from a native-typed stack, widening samples to f64
    pub fn from_stack(stack: &RasterStack, wavelengths: Vec<f64>) -> SpectralResult<Self> {
        Self::build(stack.to_f64(), wavelengths)
    }

    /// (bands, rows, cols)
    pub fn dims(&self) -> (usize, usize, usize) {
        self.cube.dim()
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// Spectrum at a pixel; empty when the pixel lies outside the raster
    pub fn curve_at(&self, row: i64, col: i64) -> SpectralCurve {
        let (_, rows, cols) = self.cube.dim();
        let (r, c) = match (usize::try_from(row), usize::try_from(col)) {
            (Ok(r), Ok(c)) if r < rows && c < cols => (r, c),
            _ => return SpectralCurve::empty(row, col),
        };

        let points = self
            .wavelengths
            .iter()
            .zip(self.cube.slice(ndarray::s![.., r, c]).iter())
            .map(|(&wavelength, &value)| SpectralPoint { wavelength, value })
            .collect();

        SpectralCurve { row, col, points }
    }

    /// Spectrum at a geographic coordinate.
    ///
    /// Rows follow the sign of the geotransform's pixel height, so a
    /// north-up raster (negative height) counts rows down from the top edge
    /// like GDAL does. Rotated transforms yield an empty curve.
    pub fn curve_at_geo(&self, x: f64, y: f64, geotransform: &GeoTransform) -> SpectralCurve {
        match geotransform.geo_to_pixel(x, y) {
            Some((row, col)) if row.is_finite() && col.is_finite() => {
                self.curve_at(row.floor() as i64, col.floor() as i64)
            }
            _ => SpectralCurve::empty(-1, -1),
        }
    }
}

/// Curves collected during an interactive session, keyed by pixel
#[derive(Debug, Clone, Default)]
pub struct CurveMemo {
    curves: BTreeMap<(i64, i64), SpectralCurve>,
}

impl CurveMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: i64, col: i64) -> Option<&SpectralCurve> {
        self.curves.get(&(row, col))
    }

    pub fn insert(&mut self, curve: SpectralCurve) {
        self.curves.insert((curve.row, curve.col), curve);
    }

    /// Curves in (row, col) order
    pub fn curves(&self) -> impl Iterator<Item = &SpectralCurve> {
        self.curves.values()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn clear(&mut self) {
        log::debug!("Clearing {} memoized curves", self.curves.len());
        self.curves.clear();
    }
}

/// Interactive inspection session: a spectral index plus its curve memo
#[derive(Debug, Clone)]
pub struct SpectralSession {
    index: SpectralIndex,
    memo: CurveMemo,
}

impl SpectralSession {
    pub fn new(index: SpectralIndex) -> Self {
        Self {
            index,
            memo: CurveMemo::new(),
        }
    }

    pub fn index(&self) -> &SpectralIndex {
        &self.index
    }

    /// Spectrum at a pixel, remembered for later comparison.
    ///
    /// Out-of-range probes return an empty curve and are not remembered.
    pub fn curve_at(&mut self, row: i64, col: i64) -> SpectralCurve {
        if let Some(curve) = self.memo.get(row, col) {
            return curve.clone();
        }

        let curve = self.index.curve_at(row, col);
        if !curve.is_empty() {
            self.memo.insert(curve.clone());
        }
        curve
    }

    pub fn memoized_curves(&self) -> Vec<&SpectralCurve> {
        self.memo.curves().collect()
    }

    pub fn memo(&self) -> &CurveMemo {
        &self.memo
    }

    pub fn clear(&mut self) {
        self.memo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn test_cube() -> PixelStack<f64> {
        Array3::from_shape_fn((3, 10, 10), |(b, r, c)| (b * 100 + r * 10 + c) as f64)
    }

    #[test]
    fn test_curve_in_band_order() {
        let index = SpectralIndex::build(test_cube(), vec![650.0, 450.0, 550.0]).unwrap();
        let curve = index.curve_at(5, 5);

        assert_eq!(curve.len(), 3);
        assert_eq!(curve.wavelengths(), vec![650.0, 450.0, 550.0]);
        assert_eq!(curve.values(), vec![55.0, 155.0, 255.0]);
    }

    #[test]
    fn test_out_of_bounds_is_empty() {
        let index = SpectralIndex::build(test_cube(), vec![1.0, 2.0, 3.0]).unwrap();

        assert!(index.curve_at(-1, -1).is_empty());
        assert!(index.curve_at(100, 100).is_empty());
        assert!(index.curve_at(10, 0).is_empty());
        assert!(index.curve_at(0, 10).is_empty());
        assert_eq!(index.curve_at(9, 9).len(), 3);
    }

    #[test]
    fn test_wavelength_count_mismatch() {
        let result = SpectralIndex::build(test_cube(), vec![1.0, 2.0]);
        assert!(matches!(result, Err(SpectralError::ShapeMismatch(_))));
    }

    #[test]
    fn test_from_native_stack() {
        let stack = RasterStack::U16(Array3::from_elem((2, 4, 4), 40000));
        let index = SpectralIndex::from_stack(&stack, vec![500.0, 600.0]).unwrap();

        assert_eq!(index.dims(), (2, 4, 4));
        assert_eq!(index.curve_at(1, 1).values(), vec![40000.0, 40000.0]);
    }

    #[test]
    fn test_curve_at_geo() {
        let index = SpectralIndex::build(test_cube(), vec![1.0, 2.0, 3.0]).unwrap();
        let gt = GeoTransform::from([1000.0, 2.0, 0.0, 5000.0, 0.0, -2.0]);

        // x = 1000 + 2 * 3.5 -> col 3; y = 5000 - 2 * 7.2 -> row 7
        let curve = index.curve_at_geo(1007.0, 4985.6, &gt);
        assert_eq!((curve.row, curve.col), (7, 3));
        assert_eq!(curve.values()[0], 73.0);

        assert!(index.curve_at_geo(999.0, 5000.0, &gt).is_empty());
    }

    #[test]
    fn test_session_memo_accumulates_and_clears() {
        let index = SpectralIndex::build(test_cube(), vec![1.0, 2.0, 3.0]).unwrap();
        let mut session = SpectralSession::new(index);

        let first = session.curve_at(2, 3);
        session.curve_at(1, 1);
        session.curve_at(2, 3);
        session.curve_at(-5, 0);

        assert_eq!(session.memo().len(), 2);
        assert_eq!(session.memo().get(2, 3), Some(&first));

        let coords: Vec<_> = session.memoized_curves().iter().map(|c| (c.row, c.col)).collect();
        assert_eq!(coords, vec![(1, 1), (2, 3)]);

        session.clear();
        assert!(session.memo().is_empty());
        assert_eq!(session.curve_at(2, 3), first);
    }
}
