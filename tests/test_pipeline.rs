mod common;

use common::{sample_bands, write_raster};
use specscope::config::{DatasetPaths, IndexParams};
use specscope::io::ArrayStore;
use specscope::pipeline::{compute_index, compute_index_for, convert, open_session};
use specscope::types::SpectralError;
use approx::assert_relative_eq;
use ndarray::{Array2, Ix2};

const HEADER: &str = "ENVI
description = {
  Synthetic three-band scene}
samples = 5
lines = 6
bands = 3
wavelength units = Nanometers
wavelength = {
 560.0, 660.0,
 860.0}
";

#[test]
fn test_convert_then_compute_index() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("h20160212.tif");
    let bands = sample_bands();
    write_raster(&source, "GTiff", &bands);

    let array_path = convert(&source, Some("GTiff")).expect("Conversion failed");
    assert_eq!(array_path, dir.path().join("h20160212.npy"));

    let header_path = dir.path().join("h20160212.hdr");
    std::fs::write(&header_path, HEADER).expect("Failed to write header");

    let output = compute_index(&array_path, &header_path, &IndexParams::default())
        .expect("Index computation failed");
    assert_eq!(output, dir.path().join("h20160212_ndvi.npy"));

    let ndvi: Array2<f64> = ArrayStore::load::<f64, Ix2, _>(&output).expect("Failed to load index");
    assert_eq!(ndvi.dim(), (6, 5));

    // NIR is band 3 (2000 + 10r + c), red is band 2 (1000 + 10r + c)
    let nir = 2000.0 + 10.0 * 2.0 + 3.0;
    let red = 1000.0 + 10.0 * 2.0 + 3.0;
    assert_relative_eq!(ndvi[[2, 3]], (nir - red) / (nir + red), epsilon = 1e-12);
}

#[test]
fn test_zero_pixels_become_nan() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("dark.tif");
    let mut bands = sample_bands();
    for band in bands.iter_mut() {
        band[[0, 0]] = 0;
    }
    write_raster(&source, "GTiff", &bands);

    let paths = DatasetPaths::from_source(&source).with_header(dir.path().join("dark_meta.hdr"));
    std::fs::write(paths.header.as_ref().unwrap(), HEADER).expect("Failed to write header");

    specscope::pipeline::convert_dataset(&paths, None).expect("Conversion failed");
    let output = compute_index_for(&paths, &IndexParams::default()).expect("Index computation failed");

    let ndvi: Array2<f64> = ArrayStore::load::<f64, Ix2, _>(&output).expect("Failed to load index");
    assert!(ndvi[[0, 0]].is_nan());
    assert!(ndvi.iter().skip(1).all(|v| v.is_finite()));
}

#[test]
fn test_session_from_files() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("scene.tif");
    write_raster(&source, "GTiff", &sample_bands());
    let array_path = convert(&source, None).expect("Conversion failed");
    let header_path = dir.path().join("scene.hdr");
    std::fs::write(&header_path, HEADER).expect("Failed to write header");

    let mut session = open_session(&array_path, &header_path).expect("Failed to open session");
    let curve = session.curve_at(4, 1);

    assert_eq!(curve.wavelengths(), vec![560.0, 660.0, 860.0]);
    assert_eq!(curve.values(), vec![41.0, 1041.0, 2041.0]);
    assert!(session.curve_at(6, 0).is_empty());
    assert_eq!(session.memo().len(), 1);
}

#[test]
fn test_convert_missing_input() {
    let result = convert("/nonexistent/scene.img", Some("ENVI"));
    assert!(matches!(result, Err(SpectralError::NotFound(_))));
}

#[test]
fn test_compute_index_rejects_non_header() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let array_path = dir.path().join("cube.npy");
    ArrayStore::write_to(&ndarray::Array3::<f32>::zeros((2, 2, 2)), &array_path).unwrap();

    let bogus = dir.path().join("cube.hdr");
    std::fs::write(&bogus, "samples = 2\n").unwrap();

    let result = compute_index(&array_path, &bogus, &IndexParams::default());
    assert!(matches!(result, Err(SpectralError::Format(_))));
}
