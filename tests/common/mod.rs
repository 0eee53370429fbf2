use gdal::raster::{Buffer, GdalType, RasterCreationOption};
use gdal::DriverManager;
use ndarray::Array2;
use std::path::Path;

pub const TEST_GEOTRANSFORM: [f64; 6] = [500000.0, 30.0, 0.0, 4200000.0, 0.0, -30.0];

/// Write `bands` (all the same shape) to a new raster with the given driver
pub fn write_raster<T: GdalType + Copy>(path: &Path, driver: &str, bands: &[Array2<T>]) {
    write_raster_with_options(path, driver, bands, &[]);
}

/// [`write_raster`] with driver creation options
pub fn write_raster_with_options<T: GdalType + Copy>(
    path: &Path,
    driver: &str,
    bands: &[Array2<T>],
    options: &[RasterCreationOption],
) {
    let (height, width) = bands[0].dim();
    let driver = DriverManager::get_driver_by_name(driver).expect("Driver not available");
    let mut dataset = driver
        .create_with_band_type_with_options::<T, _>(
            path,
            width as isize,
            height as isize,
            bands.len() as isize,
            options,
        )
        .expect("Failed to create test raster");
    dataset
        .set_geo_transform(&TEST_GEOTRANSFORM)
        .expect("Failed to set geotransform");

    for (i, band) in bands.iter().enumerate() {
        let mut rasterband = dataset.rasterband(i as isize + 1).expect("Missing band");
        let flat: Vec<T> = band.iter().copied().collect();
        let buffer = Buffer::new((width, height), flat);
        rasterband
            .write((0, 0), (width, height), &buffer)
            .expect("Failed to write band");
    }
}

/// Write each band as its own TIFF directory, giving a multi-page GeoTIFF
#[allow(dead_code)]
pub fn write_multipage_tiff<T: GdalType + Copy>(path: &Path, bands: &[Array2<T>]) {
    let append = [RasterCreationOption {
        key: "APPEND_SUBDATASET",
        value: "YES",
    }];
    for (i, band) in bands.iter().enumerate() {
        let options: &[RasterCreationOption] = if i == 0 { &[] } else { &append };
        write_raster_with_options(path, "GTiff", std::slice::from_ref(band), options);
    }
}

/// Three 6x5 bands with distinct, position-dependent values
pub fn sample_bands() -> Vec<Array2<u16>> {
    (0..3)
        .map(|b| Array2::from_shape_fn((6, 5), |(r, c)| (b * 1000 + r * 10 + c) as u16))
        .collect()
}
