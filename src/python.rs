//! Python bindings for dashboard front ends

use crate::config::IndexParams;
use crate::core::SpectralSession;
use crate::io::{ArrayStore, HeaderParser};
use crate::types::{HeaderValue, SpectralCurve, SpectralError};
use crate::{pipeline, SpectralIndex};
use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
use pyo3::prelude::*;
use pyo3::types::PyDict;

fn to_py_err(e: SpectralError) -> PyErr {
    let msg = format!("{}", e);
    match e {
        SpectralError::Format(_) | SpectralError::ShapeMismatch(_) => {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(msg)
        }
        SpectralError::NotFound(_) => PyErr::new::<pyo3::exceptions::PyFileNotFoundError, _>(msg),
        SpectralError::Index(_) => PyErr::new::<pyo3::exceptions::PyIndexError, _>(msg),
        _ => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(msg),
    }
}

fn curve_pairs(curve: &SpectralCurve) -> Vec<(f64, f64)> {
    curve.points.iter().map(|p| (p.wavelength, p.value)).collect()
}

/// Python module definition
#[pymodule]
fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(parse_header, m)?)?;
    m.add_function(wrap_pyfunction!(convert, m)?)?;
    m.add_function(wrap_pyfunction!(compute_index, m)?)?;
    m.add_function(wrap_pyfunction!(load_array, m)?)?;
    m.add_class::<PySpectralIndex>()?;
    Ok(())
}

/// Parse an ENVI header into a dict of str / list[str]
#[pyfunction]
fn parse_header(py: Python, path: &str) -> PyResult<PyObject> {
    let header = HeaderParser::parse_file(path).map_err(to_py_err)?;
    let dict = PyDict::new(py);
    for key in header.keys() {
        match header.get(key) {
            Some(HeaderValue::Scalar(s)) => dict.set_item(key, s)?,
            Some(HeaderValue::List(items)) => dict.set_item(key, items.clone())?,
            None => {}
        }
    }
    Ok(dict.to_object(py))
}

#[pyfunction]
#[pyo3(signature = (input_path, driver = None))]
fn convert(input_path: &str, driver: Option<&str>) -> PyResult<String> {
    let output = pipeline::convert(input_path, driver).map_err(to_py_err)?;
    Ok(output.display().to_string())
}

#[pyfunction]
fn compute_index(array_path: &str, header_path: &str) -> PyResult<String> {
    let output = pipeline::compute_index(array_path, header_path, &IndexParams::default())
        .map_err(to_py_err)?;
    Ok(output.display().to_string())
}

/// Load a persisted stack as a float64 (bands, rows, cols) array
#[pyfunction]
fn load_array<'py>(py: Python<'py>, path: &str) -> PyResult<&'py PyArray3<f64>> {
    let stack = ArrayStore::load_stack(path).map_err(to_py_err)?;
    Ok(stack.to_f64().into_pyarray(py))
}

/// Python wrapper for SpectralSession
#[pyclass(name = "SpectralIndex")]
struct PySpectralIndex {
    inner: SpectralSession,
}

#[pymethods]
impl PySpectralIndex {
    #[new]
    fn new(cube: PyReadonlyArray3<f64>, wavelengths: Vec<f64>) -> PyResult<Self> {
        let index = SpectralIndex::build(cube.as_array().to_owned(), wavelengths).map_err(to_py_err)?;
        Ok(PySpectralIndex {
            inner: SpectralSession::new(index),
        })
    }

    #[staticmethod]
    fn from_files(array_path: &str, header_path: &str) -> PyResult<Self> {
        let inner = pipeline::open_session(array_path, header_path).map_err(to_py_err)?;
        Ok(PySpectralIndex { inner })
    }

    #[getter]
    fn shape(&self) -> (usize, usize, usize) {
        self.inner.index().dims()
    }

    /// List of (wavelength, value); empty outside the raster
    fn curve_at(&mut self, row: i64, col: i64) -> Vec<(f64, f64)> {
        curve_pairs(&self.inner.curve_at(row, col))
    }

    fn memoized(&self) -> Vec<((i64, i64), Vec<(f64, f64)>)> {
        self.inner
            .memoized_curves()
            .into_iter()
            .map(|c| ((c.row, c.col), curve_pairs(c)))
            .collect()
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn __repr__(&self) -> String {
        let (bands, rows, cols) = self.inner.index().dims();
        format!("SpectralIndex(bands={}, rows={}, cols={}, memoized={})", bands, rows, cols, self.inner.memo().len())
    }
}
