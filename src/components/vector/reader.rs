use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{
    components::{
        drivers::{TableDriver, VectorDriver},
        vector::{
            filter::{Mask, SpatialFilter},
            ogr, parse_kinds, table, GeoTable,
        },
    },
    crs_geo::Crs,
    errors::{HydrioError, Result},
    predicate::Predicate,
};

/// Options of [open_vector] and [open_vector_from_table].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorOptions {
    /// Driver name, derived from the file extension when unset.
    pub driver: Option<String>,
    /// Used when the file has no crs of its own.
    pub crs: Option<Crs>,
    /// Reproject to this crs after reading.
    pub dst_crs: Option<Crs>,
    /// `[xmin, ymin, xmax, ymax]` in EPSG:4326.
    pub bbox: Option<[f64; 4]>,
    /// Polygon filter; takes precedence over `bbox`.
    #[serde(skip)]
    pub geom: Option<Mask>,
    pub predicate: Predicate,
    /// Allowed geometry kind names, e.g. `["Point"]`.
    pub assert_gtype: Option<Vec<String>>,
    pub x_dim: Option<String>,
    pub y_dim: Option<String>,
    /// Column of csv and spreadsheet tables used as index.
    pub index_col: Option<usize>,
}

impl Default for VectorOptions {
    fn default() -> Self {
        Self {
            driver: None,
            crs: None,
            dst_crs: None,
            bbox: None,
            geom: None,
            predicate: Predicate::default(),
            assert_gtype: None,
            x_dim: None,
            y_dim: None,
            index_col: Some(0),
        }
    }
}

impl VectorOptions {
    fn spatial_filter(&self) -> Result<Option<SpatialFilter>> {
        if let Some(mask) = &self.geom {
            mask.validate()?;
            return Ok(Some(SpatialFilter::Mask(mask.clone())));
        }
        Ok(self.bbox.map(|bounds| SpatialFilter::Bbox { bounds, crs: None }))
    }
}

fn check_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(HydrioError::FileNotFound(path.to_path_buf()))
    }
}

/// Reads a csv, spreadsheet or xy file of point coordinates.
pub fn open_vector_from_table<P: AsRef<Path>>(path: P, options: &VectorOptions) -> Result<GeoTable> {
    let path = path.as_ref();
    let driver = TableDriver::for_path(path, options.driver.as_deref())?;
    check_exists(path)?;
    let table = table::read(path, driver, options)?;
    Ok(match &options.crs {
        Some(crs) => table.set_crs(crs.clone()),
        None => table,
    })
}

/// Reads any vector file into a [GeoTable], optionally filtered and reprojected.
pub fn open_vector<P: AsRef<Path>>(path: P, options: &VectorOptions) -> Result<GeoTable> {
    let path = path.as_ref();
    let kinds = options.assert_gtype.as_deref().map(parse_kinds).transpose()?;
    let filter = options.spatial_filter()?;
    check_exists(path)?;

    let mut table = match VectorDriver::for_path(path, options.driver.as_deref()) {
        VectorDriver::Table(driver) => table::read(path, driver, options)?,
        VectorDriver::Ogr(driver) => ogr::read(path, driver.as_deref())?,
    };
    if let Some(kinds) = &kinds {
        table.assert_geometry_kinds(kinds, path)?;
    }
    if table.crs().is_none() {
        let crs = options.crs.clone().ok_or(HydrioError::MissingCrs)?;
        table = table.set_crs(crs);
    }
    if let Some(dst_crs) = &options.dst_crs {
        table = table.to_crs(dst_crs)?;
    }
    if let Some(filter) = &filter {
        table = table.filter(filter, options.predicate)?;
    }
    info!("opened {} row(s) from {}", table.len(), path.display());
    Ok(table)
}
