use std::path::Path;

use crate::errors::{HydrioError, Result};

/// Raster formats with a known file extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterDriver {
    GTiff,
    PCRaster,
    AAIGrid,
    NetCdf,
    Gpkg,
    Other(String),
}

impl RasterDriver {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "gtiff" => RasterDriver::GTiff,
            "pcraster" => RasterDriver::PCRaster,
            "aaigrid" => RasterDriver::AAIGrid,
            "netcdf" => RasterDriver::NetCdf,
            "gpkg" => RasterDriver::Gpkg,
            _ => RasterDriver::Other(name.to_string()),
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        Some(match extension.to_ascii_lowercase().as_str() {
            "tif" | "tiff" => RasterDriver::GTiff,
            "map" => RasterDriver::PCRaster,
            "asc" => RasterDriver::AAIGrid,
            "nc" => RasterDriver::NetCdf,
            "gpkg" => RasterDriver::Gpkg,
            _ => return None,
        })
    }

    /// An explicit `driver` wins, then the extension of `path`, then GTiff.
    pub fn for_path(path: &Path, driver: Option<&str>) -> Self {
        match driver {
            Some(name) => Self::from_name(name),
            None => path
                .extension()
                .and_then(|extension| extension.to_str())
                .and_then(Self::from_extension)
                .unwrap_or(RasterDriver::GTiff),
        }
    }

    pub fn gdal_name(&self) -> &str {
        match self {
            RasterDriver::GTiff => "GTiff",
            RasterDriver::PCRaster => "PCRaster",
            RasterDriver::AAIGrid => "AAIGrid",
            RasterDriver::NetCdf => "netCDF",
            RasterDriver::Gpkg => "GPKG",
            RasterDriver::Other(name) => name,
        }
    }

    pub fn extension(&self) -> Result<&'static str> {
        match self {
            RasterDriver::GTiff => Ok("tif"),
            RasterDriver::PCRaster => Ok("map"),
            RasterDriver::AAIGrid => Ok("asc"),
            RasterDriver::NetCdf => Ok("nc"),
            RasterDriver::Gpkg => Ok("gpkg"),
            RasterDriver::Other(name) => Err(HydrioError::UnknownExtension(name.clone())),
        }
    }
}

/// Plain text and spreadsheet point tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableDriver {
    Csv,
    Excel,
    Xy,
}

impl TableDriver {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "csv" => TableDriver::Csv,
            "xls" | "xlsx" | "excel" => TableDriver::Excel,
            "xy" => TableDriver::Xy,
            _ => return None,
        })
    }

    pub fn for_path(path: &Path, driver: Option<&str>) -> Result<Self> {
        let name = driver_name(path, driver);
        Self::from_name(&name).ok_or(HydrioError::UnknownDriver(name))
    }
}

/// How a vector file is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorDriver {
    Table(TableDriver),
    /// OGR, optionally restricted to one driver.
    Ogr(Option<String>),
}

impl VectorDriver {
    pub fn for_path(path: &Path, driver: Option<&str>) -> Self {
        match TableDriver::from_name(&driver_name(path, driver)) {
            Some(table) => VectorDriver::Table(table),
            None => VectorDriver::Ogr(driver.map(String::from)),
        }
    }

    /// OGR driver used to write a file, by name or extension.
    pub(crate) fn ogr_name(path: &Path, driver: Option<&str>) -> String {
        if let Some(name) = driver {
            return name.to_string();
        }
        match driver_name(path, None).as_str() {
            "gpkg" => "GPKG",
            "shp" => "ESRI Shapefile",
            "fgb" => "FlatGeobuf",
            "xlsx" | "xls" => "XLSX",
            "csv" => "CSV",
            _ => "GeoJSON",
        }
        .to_string()
    }
}

fn driver_name(path: &Path, driver: Option<&str>) -> String {
    driver
        .map(String::from)
        .or_else(|| {
            path.extension()
                .and_then(|extension| extension.to_str())
                .map(str::to_ascii_lowercase)
        })
        .unwrap_or_default()
}
