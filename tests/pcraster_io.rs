use hydrio::{
    mapstack_path, open_mfraster, open_raster, write_clone, DType, GeoTransform, HydrioError,
    MapstackOptions, MfRasterOptions, OpenRasterOptions, RasterArray, RasterDataset,
    RasterWriteOptions, ValueScale,
};
use ndarray::{array, Array3};
use rstest::{fixture, rstest};
use std::{collections::BTreeMap, path::Path};
use tempfile::TempDir;

#[fixture]
fn transform() -> GeoTransform {
    GeoTransform::from([0.5, 0.0, 3.0, 0.0, -0.5, -9.0])
}

fn pcraster(value_scale: ValueScale) -> RasterWriteOptions {
    RasterWriteOptions {
        driver: Some("PCRaster".into()),
        pcr_vs: Some(value_scale),
        ..Default::default()
    }
}

fn read(path: &Path) -> RasterArray {
    open_raster(path, &OpenRasterOptions::default()).unwrap()
}

#[rstest]
fn scalar_map(transform: GeoTransform) {
    let folder = TempDir::new().unwrap();
    let path = folder.path().join("test.map");
    let raster = RasterArray::new(array![[1f64, f64::NAN], [3., 4.]], transform).with_nodata(f64::NAN);
    raster.to_raster(&path, &pcraster(ValueScale::Scalar)).unwrap();

    let back = read(&path);
    assert_eq!(back.dtype(), DType::Float32);
    assert_eq!(back.shape(), (2, 2));
    assert!(back.transform().almost_eq(&transform, 1e-9));
    let values = back.mask_nodata().data().to_f64();
    assert_eq!(values[[0, 0, 0]], 1.);
    assert!(values[[0, 0, 1]].is_nan());
}

#[rstest]
#[case(ValueScale::Nominal)]
#[case(ValueScale::Ordinal)]
#[case(ValueScale::Scalar)]
fn nodata_required(transform: GeoTransform, #[case] value_scale: ValueScale) {
    let folder = TempDir::new().unwrap();
    let raster = RasterArray::new(array![[1i32, 2]], transform);
    let err = raster
        .to_raster(folder.path().join("test.map"), &pcraster(value_scale))
        .unwrap_err();
    assert!(matches!(err, HydrioError::MissingNodata(_)));
}

#[rstest]
fn ldd_without_nodata(transform: GeoTransform) {
    let folder = TempDir::new().unwrap();
    let path = folder.path().join("ldd.map");
    let raster = RasterArray::new(array![[5u8, 2], [6, 5]], transform);
    raster.to_raster(&path, &pcraster(ValueScale::Ldd)).unwrap();
    let back = read(&path);
    assert_eq!(back.dtype(), DType::UInt8);
    assert_eq!(back.data().to_f64()[[0, 1, 1]], 5.);
}

#[rstest]
fn stacked_layers(transform: GeoTransform) {
    let folder = TempDir::new().unwrap();
    let path = folder.path().join("precip.map");
    let data = Array3::from_shape_fn((3, 2, 2), |(layer, row, col)| (layer * 4 + row * 2 + col) as f32);
    let raster = RasterArray::new(data, transform)
        .with_nodata(-9999.)
        .with_band_dim("time", vec![0, 1, 2])
        .unwrap();
    raster.to_raster(&path, &pcraster(ValueScale::Scalar)).unwrap();

    for layer in 0..3 {
        let layer_path = mapstack_path(&path, layer);
        let back = read(&layer_path);
        assert_eq!(back.data().to_f64()[[0, 0, 0]], (layer * 4) as f64);
    }
    assert!(folder.path().join("precip00.003").exists());
    assert!(!folder.path().join("precip00.004").exists());
}

#[rstest]
fn stacked_layers_reopened(transform: GeoTransform) {
    let folder = TempDir::new().unwrap();
    let path = folder.path().join("precip.map");
    let data = Array3::from_shape_fn((3, 2, 2), |(layer, row, col)| (layer * 4 + row * 2 + col) as f32);
    RasterArray::new(data, transform)
        .with_nodata(-9999.)
        .to_raster(&path, &pcraster(ValueScale::Scalar))
        .unwrap();

    let layers: Vec<_> = (0..3).map(|layer| mapstack_path(&path, layer)).rev().collect();
    let options = MfRasterOptions {
        concat: true,
        mask_nodata: true,
        ..Default::default()
    };
    let dataset = open_mfraster(layers, &options).unwrap();
    assert_eq!(dataset.vars(), vec!["precip00"]);
    let stacked = dataset.get("precip00").unwrap();
    let band_dim = stacked.band_dim().unwrap();
    assert_eq!(band_dim.name, "dim0");
    assert_eq!(band_dim.coords, vec![1, 2, 3]);
    assert!(stacked.nodata().unwrap().is_nan());
    assert_eq!(stacked.data().to_f64()[[2, 0, 0]], 8.);
}

#[rstest]
fn clone_grid(transform: GeoTransform) {
    let folder = TempDir::new().unwrap();
    let clone_path = folder.path().join("clone.map");
    write_clone(&clone_path, transform, None, (2, 2)).unwrap();
    assert_eq!(read(&clone_path).dtype(), DType::UInt8);

    let elsewhere = GeoTransform::from([1.0, 0.0, 0.0, 0.0, -1.0, 0.0]);
    let raster = RasterArray::new(array![[1i32, 2], [3, -1]], elsewhere).with_nodata(-1.);
    let options = RasterWriteOptions {
        clone_path: Some(clone_path),
        ..pcraster(ValueScale::Nominal)
    };
    let path = folder.path().join("landuse.map");
    raster.to_raster(&path, &options).unwrap();
    let back = read(&path);
    assert_eq!(back.dtype(), DType::Int32);
    assert!(back.transform().almost_eq(&transform, 1e-9));
    assert_eq!(back.data().to_f64()[[0, 1, 0]], 3.);
}

#[rstest]
fn pcraster_mapstack(transform: GeoTransform) {
    let folder = TempDir::new().unwrap();
    let dataset = RasterDataset::from_arrays([
        RasterArray::new(array![[1i32, 2], [3, 4]], transform)
            .with_name("landuse")
            .with_nodata(-1.),
        RasterArray::new(array![[0.5f32, 1.], [1.5, 2.]], transform)
            .with_name("slope")
            .with_nodata(-9999.),
    ])
    .unwrap();
    let options = MapstackOptions {
        driver: "PCRaster".into(),
        pcr_vs_map: BTreeMap::from([("landuse".to_string(), ValueScale::Nominal)]),
        ..Default::default()
    };
    dataset.to_mapstack(folder.path(), &options).unwrap();
    assert_eq!(read(&folder.path().join("landuse.map")).dtype(), DType::Int32);
    assert_eq!(read(&folder.path().join("slope.map")).dtype(), DType::Float32);
}
