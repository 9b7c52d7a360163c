use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{
    components::{
        backends::gdal_backend,
        drivers::RasterDriver,
        raster::{data::DType, RasterArray, RasterWriteOptions},
        transforms::GeoTransform,
    },
    crs_geo::Crs,
    errors::{HydrioError, Result},
};

/// PCRaster value scale; fixes the cell type of a map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueScale {
    Boolean,
    Nominal,
    Ordinal,
    #[default]
    Scalar,
    Directional,
    Ldd,
}

impl ValueScale {
    pub fn dtype(&self) -> DType {
        match self {
            ValueScale::Boolean | ValueScale::Ldd => DType::UInt8,
            ValueScale::Nominal | ValueScale::Ordinal => DType::Int32,
            ValueScale::Scalar | ValueScale::Directional => DType::Float32,
        }
    }

    pub fn gdal_name(&self) -> &'static str {
        match self {
            ValueScale::Boolean => "VS_BOOLEAN",
            ValueScale::Nominal => "VS_NOMINAL",
            ValueScale::Ordinal => "VS_ORDINAL",
            ValueScale::Scalar => "VS_SCALAR",
            ValueScale::Directional => "VS_DIRECTION",
            ValueScale::Ldd => "VS_LDD",
        }
    }

    /// PCRaster missing value of the cell type.
    pub fn missing_value(&self) -> f64 {
        match self.dtype() {
            DType::UInt8 => 255.,
            DType::Int32 => i32::MIN as f64,
            _ => f64::NAN,
        }
    }
}

impl fmt::Display for ValueScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueScale::Boolean => "boolean",
            ValueScale::Nominal => "nominal",
            ValueScale::Ordinal => "ordinal",
            ValueScale::Scalar => "scalar",
            ValueScale::Directional => "directional",
            ValueScale::Ldd => "ldd",
        };
        f.write_str(name)
    }
}

impl FromStr for ValueScale {
    type Err = HydrioError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "boolean" => ValueScale::Boolean,
            "nominal" => ValueScale::Nominal,
            "ordinal" => ValueScale::Ordinal,
            "scalar" => ValueScale::Scalar,
            "directional" => ValueScale::Directional,
            "ldd" => ValueScale::Ldd,
            _ => return Err(HydrioError::UnknownValueScale(s.to_string())),
        })
    }
}

/// File of layer `layer` of a stacked map: the stem cut or padded with `0`
/// to eight characters and the one based layer number as extension.
pub fn mapstack_path(path: &Path, layer: usize) -> PathBuf {
    let stem: String = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .unwrap_or_default()
        .chars()
        .take(8)
        .collect();
    path.with_file_name(format!("{stem:0<8}.{:03}", layer + 1))
}

fn clone_grid(clone_path: &Path) -> Result<(GeoTransform, Option<Crs>)> {
    let dataset = gdal_backend::open_dataset(clone_path)?;
    Ok(gdal_backend::grid_of(&dataset))
}

/// Writes `raster` as PCRaster map(s), one file per layer for stacked arrays.
pub(crate) fn write_map(raster: &RasterArray, path: &Path, options: &RasterWriteOptions) -> Result<()> {
    let value_scale = options.pcr_vs.unwrap_or_default();
    let mut raster = raster.clone();
    if let Some(clone_path) = &options.clone_path {
        let (transform, crs) = clone_grid(clone_path)?;
        raster = raster.with_grid(transform, crs);
    }
    let nodata = match raster.nodata() {
        Some(nodata) if nodata.is_nan() && !value_scale.dtype().is_float() => {
            value_scale.missing_value()
        }
        Some(nodata) => nodata,
        None if value_scale == ValueScale::Ldd => value_scale.missing_value(),
        None => return Err(HydrioError::MissingNodata(value_scale.to_string())),
    };
    let raster = raster.set_nodata(nodata).astype(value_scale.dtype());

    let mut write_options = RasterWriteOptions {
        creation_options: options.creation_options.clone(),
        ..Default::default()
    };
    write_options.creation_options.insert(
        "PCRASTER_VALUESCALE".into(),
        value_scale.gdal_name().into(),
    );
    if raster.ndim() == 3 {
        for layer in 0..raster.band_count() {
            let layer_path = mapstack_path(path, layer);
            debug!("writing layer {layer} to {}", layer_path.display());
            gdal_backend::write_raster(
                &raster.band(layer)?,
                &layer_path,
                &RasterDriver::PCRaster,
                &write_options,
            )?;
        }
        Ok(())
    } else {
        gdal_backend::write_raster(&raster, path, &RasterDriver::PCRaster, &write_options)
    }
}

/// Boolean map of ones defining the grid other maps are written on.
pub fn write_clone<P: AsRef<Path>>(
    path: P,
    transform: impl Into<GeoTransform>,
    crs: Option<Crs>,
    shape: (usize, usize),
) -> Result<()> {
    let mut clone = RasterArray::new(Array2::from_elem(shape, 1u8), transform).with_nodata(255.);
    clone.set_crs(crs);
    let options = RasterWriteOptions {
        driver: Some(RasterDriver::PCRaster.gdal_name().to_string()),
        pcr_vs: Some(ValueScale::Boolean),
        ..Default::default()
    };
    clone.to_raster(path, &options)
}
