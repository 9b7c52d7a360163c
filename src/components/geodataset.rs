use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};

use crate::{
    components::{
        drivers::VectorDriver,
        timeseries::{open_timeseries_from_table, TimeSeries, TimeseriesOptions},
        vector::{
            reader::{open_vector, VectorOptions},
            GeoTable,
        },
    },
    errors::{HydrioError, Result},
};

/// Options of [open_geodataset].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoDatasetOptions {
    pub vector: VectorOptions,
    pub timeseries: TimeseriesOptions,
}

/// Point locations with timeseries variables aligned to their ids.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoDataset {
    geometry: GeoTable,
    ids: Vec<i64>,
    vars: BTreeMap<String, TimeSeries>,
}

impl GeoDataset {
    /// Ids come from the table index, or the row number when it is not integral.
    pub fn new(geometry: GeoTable) -> Self {
        let ids = geometry.integer_index().unwrap_or_else(|| {
            warn!("geometry index is not integral, using row numbers as ids");
            (0..geometry.len() as i64).collect()
        });
        Self {
            geometry,
            ids,
            vars: BTreeMap::new(),
        }
    }

    /// Adds a variable reordered to the geometry ids.
    pub fn insert(&mut self, timeseries: TimeSeries) -> Result<()> {
        let missing: Vec<i64> = timeseries
            .ids()
            .iter()
            .filter(|id| !self.ids.contains(id))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(HydrioError::IndexNotSubset {
                name: timeseries.name().to_string(),
                missing,
            });
        }
        let aligned = timeseries.reindex(&self.ids);
        self.vars.insert(aligned.name().to_string(), aligned);
        Ok(())
    }

    pub fn geometry(&self) -> &GeoTable {
        &self.geometry
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn vars(&self) -> Vec<&str> {
        self.vars.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&TimeSeries> {
        self.vars.get(name)
    }
}

/// Reads point locations and, optionally, a timeseries table of values at them.
pub fn open_geodataset<P: AsRef<Path>>(
    locs: P,
    data: Option<&Path>,
    options: &GeoDatasetOptions,
) -> Result<GeoDataset> {
    let locs = locs.as_ref();
    if !locs.exists() {
        return Err(HydrioError::LocationFileNotFound(locs.to_path_buf()));
    }
    if let Some(data) = data.filter(|data| !data.exists()) {
        return Err(HydrioError::DataFileNotFound(data.to_path_buf()));
    }
    let mut vector_options = options.vector.clone();
    if let VectorDriver::Table(_) = VectorDriver::for_path(locs, vector_options.driver.as_deref()) {
        vector_options.assert_gtype = Some(vec!["Point".into()]);
    }
    let mut dataset = GeoDataset::new(open_vector(locs, &vector_options)?);
    if let Some(data) = data {
        dataset.insert(open_timeseries_from_table(data, &options.timeseries)?)?;
    }
    info!(
        "opened geodataset with {} location(s) and variables {:?}",
        dataset.ids().len(),
        dataset.vars()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{components::timeseries::parse_datetime, crs_geo::WGS84};
    use geo::point;
    use ndarray::array;

    fn locations() -> GeoTable {
        GeoTable::new(
            vec![point!(x: 0., y: 0.).into(), point!(x: 1., y: 1.).into()],
            Some(WGS84),
        )
        .with_index(Some("id"), vec![1.into(), 2.into()])
        .unwrap()
    }

    fn series(ids: Vec<i64>) -> TimeSeries {
        let time = vec![parse_datetime("2000-01-01").unwrap()];
        TimeSeries::new("waterlevel", "index", time, ids, array![[5.]]).unwrap()
    }

    #[test]
    fn aligns_to_geometry_ids() {
        let mut dataset = GeoDataset::new(locations());
        dataset.insert(series(vec![2])).unwrap();
        let aligned = dataset.get("waterlevel").unwrap();
        assert_eq!(aligned.ids(), &[1, 2]);
        assert!(aligned.values()[[0, 0]].is_nan());
        assert_eq!(aligned.values()[[0, 1]], 5.);
    }

    #[test]
    fn ids_must_be_subset() {
        let mut dataset = GeoDataset::new(locations());
        let err = dataset.insert(series(vec![7])).unwrap_err();
        assert!(matches!(err, HydrioError::IndexNotSubset { missing, .. } if missing == vec![7]));
    }

    #[test]
    fn options_from_empty_map() {
        use serde::de::value::{Error, MapDeserializer};

        let entries = std::iter::empty::<(&str, &str)>();
        let options = GeoDatasetOptions::deserialize(MapDeserializer::<_, Error>::new(entries)).unwrap();
        assert_eq!(options.vector.index_col, Some(0));
        assert_eq!(options.timeseries.index_dim, "index");
    }

    #[test]
    fn missing_files() {
        let options = GeoDatasetOptions::default();
        let err = open_geodataset("missing.csv", None, &options).unwrap_err();
        assert!(matches!(err, HydrioError::LocationFileNotFound(_)));
    }
}
