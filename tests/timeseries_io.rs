use hydrio::{
    open_geodataset, open_timeseries_from_table, Crs, GeoDatasetOptions, HydrioError,
    TimeseriesOptions, VectorOptions,
};
use rstest::{fixture, rstest};
use std::{fs, path::PathBuf};
use tempfile::TempDir;

struct Files {
    _folder: TempDir,
    locations: PathBuf,
    waterlevel: PathBuf,
}

#[fixture]
fn files() -> Files {
    let folder = TempDir::new().unwrap();
    let locations = folder.path().join("stations.csv");
    fs::write(
        &locations,
        "id,name,x,y\n1,upstream,4.5,52.1\n2,midstream,4.7,52.0\n3,outlet,5.0,51.9\n",
    )
    .unwrap();
    let waterlevel = folder.path().join("waterlevel.csv");
    fs::write(
        &waterlevel,
        "time,station_3,station_1\n2000-01-01,1.5,0.5\n2000-01-02,2.5,\n2000-01-03,3.5,1.0\n",
    )
    .unwrap();
    Files {
        _folder: folder,
        locations,
        waterlevel,
    }
}

#[rstest]
fn time_in_rows(files: Files) {
    let timeseries = open_timeseries_from_table(&files.waterlevel, &TimeseriesOptions::default()).unwrap();
    assert_eq!(timeseries.name(), "waterlevel");
    assert_eq!(timeseries.ids(), &[3, 1]);
    assert_eq!(timeseries.time().len(), 3);
    let outlet = timeseries.series(3).unwrap();
    assert_eq!(outlet, vec![1.5, 2.5, 3.5]);
    assert!(timeseries.series(1).unwrap()[1].is_nan());
}

#[test_log::test]
fn time_in_columns() {
    let folder = TempDir::new().unwrap();
    let path = folder.path().join("discharge.csv");
    fs::write(&path, "id,2000-01-01,2000-01-02\nq_1,10,11\nq_2,20,21\n").unwrap();
    let options = TimeseriesOptions {
        name: Some("q".into()),
        ..Default::default()
    };
    let timeseries = open_timeseries_from_table(&path, &options).unwrap();
    assert_eq!(timeseries.name(), "q");
    assert_eq!(timeseries.ids(), &[1, 2]);
    assert_eq!(timeseries.series(2), Some(vec![20., 21.]));
}

#[rstest]
#[case("id,a,b\nx_1,1,2\n", "time")]
#[case("time,a,b\n2000-01-01,1,2\n", "numeric")]
fn unusable_tables(#[case] content: &str, #[case] missing: &str) {
    let folder = TempDir::new().unwrap();
    let path = folder.path().join("table.csv");
    fs::write(&path, content).unwrap();
    let err = open_timeseries_from_table(&path, &TimeseriesOptions::default()).unwrap_err();
    match missing {
        "time" => assert!(matches!(err, HydrioError::NoTimeIndex(_))),
        _ => assert!(matches!(err, HydrioError::NoNumericIndex(_))),
    }
}

#[rstest]
fn timeseries_csv_roundtrip(files: Files) {
    let timeseries = open_timeseries_from_table(&files.waterlevel, &TimeseriesOptions::default()).unwrap();
    let path = files.waterlevel.with_file_name("copy.csv");
    timeseries.to_csv(&path).unwrap();
    let options = TimeseriesOptions {
        name: Some("waterlevel".into()),
        ..Default::default()
    };
    let back = open_timeseries_from_table(&path, &options).unwrap();
    assert_eq!(back.time(), timeseries.time());
    assert_eq!(back.ids(), timeseries.ids());
    assert_eq!(back.series(3), timeseries.series(3));
}

#[rstest]
fn geodataset_with_data(files: Files) {
    let options = GeoDatasetOptions {
        vector: VectorOptions {
            crs: Some(Crs::Epsg(4326)),
            ..Default::default()
        },
        ..Default::default()
    };
    let dataset = open_geodataset(&files.locations, Some(files.waterlevel.as_path()), &options).unwrap();
    assert_eq!(dataset.ids(), &[1, 2, 3]);
    assert_eq!(dataset.vars(), vec!["waterlevel"]);
    let waterlevel = dataset.get("waterlevel").unwrap();
    assert_eq!(waterlevel.ids(), &[1, 2, 3]);
    assert!(waterlevel.series(2).unwrap().iter().all(|value| value.is_nan()));
    assert_eq!(waterlevel.series(3), Some(vec![1.5, 2.5, 3.5]));
}

#[rstest]
fn geodataset_without_data(files: Files) {
    let options = GeoDatasetOptions {
        vector: VectorOptions {
            crs: Some(Crs::Epsg(4326)),
            ..Default::default()
        },
        ..Default::default()
    };
    let dataset = open_geodataset(&files.locations, None, &options).unwrap();
    assert_eq!(dataset.ids(), &[1, 2, 3]);
    assert!(dataset.vars().is_empty());
}

#[rstest]
fn geodataset_missing_data(files: Files) {
    let options = GeoDatasetOptions::default();
    let missing = files.waterlevel.with_file_name("missing.csv");
    let err = open_geodataset(&files.locations, Some(missing.as_path()), &options).unwrap_err();
    assert!(matches!(err, HydrioError::DataFileNotFound(_)));
}
