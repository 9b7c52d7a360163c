use log::info;
use std::path::Path;

use crate::{
    components::{
        drivers::{TableDriver, VectorDriver},
        vector::{
            ogr::{self, Layout},
            table, GeoTable,
        },
    },
    errors::Result,
};

/// Writes `table` with the driver named or implied by the extension of `path`.
///
/// Csv, spreadsheet and xy files hold points only, as coordinate columns.
pub fn write_vector<P: AsRef<Path>>(table: &GeoTable, path: P, driver: Option<&str>) -> Result<()> {
    let path = path.as_ref();
    match VectorDriver::for_path(path, driver) {
        VectorDriver::Table(TableDriver::Csv) => table::write_csv(table, path)?,
        VectorDriver::Table(TableDriver::Xy) => table::write_xy(table, path)?,
        VectorDriver::Table(TableDriver::Excel) => {
            ogr::write(table, path, "XLSX", Layout::Coordinates)?
        }
        VectorDriver::Ogr(name) => ogr::write(
            table,
            path,
            &VectorDriver::ogr_name(path, name.as_deref()),
            Layout::Geometry,
        )?,
    }
    info!("wrote {} row(s) to {}", table.len(), path.display());
    Ok(())
}

/// Writes the point coordinates of `table` as `x y` lines.
pub fn write_xy<P: AsRef<Path>>(table: &GeoTable, path: P) -> Result<()> {
    table::write_xy(table, path.as_ref())
}
