pub mod data;
pub mod dataset;

use log::{debug, info};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::Debug,
    path::{Path, PathBuf},
};

use crate::{
    components::{
        backends::gdal_backend,
        drivers::RasterDriver,
        pcraster::{self, ValueScale},
        transforms::GeoTransform,
        Metadata,
    },
    crs_geo::Crs,
    errors::{HydrioError, Result},
    indexes::Indexes,
};
use data::{is_nodata, DType, DataType, RasterData};

/// Named leading dimension of a stacked raster, e.g. time steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandDim {
    pub name: String,
    pub coords: Vec<i64>,
}

/// Options of [open_raster].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenRasterOptions {
    /// Convert nodata cells to `NaN`.
    pub mask_nodata: bool,
    /// Used when the file does not define a nodata value.
    pub nodata: Option<f64>,
    pub bands: Indexes,
}

/// Reads the selected bands of a single raster file.
pub fn open_raster<P: AsRef<Path>>(path: P, options: &OpenRasterOptions) -> Result<RasterArray> {
    let path = path.as_ref();
    let raster = gdal_backend::read_raster(path, options)?;
    info!("opened {raster:?} from {}", path.display());
    Ok(if options.mask_nodata {
        raster.mask_nodata()
    } else {
        raster
    })
}

/// Options of [RasterArray::to_raster].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterWriteOptions {
    /// GDAL driver name, derived from the file extension when unset.
    pub driver: Option<String>,
    pub crs: Option<Crs>,
    /// Replaces the current nodata value and any `NaN` in the output.
    pub nodata: Option<f64>,
    pub dtype: Option<DType>,
    pub tags: Metadata,
    /// Write block by block instead of whole bands.
    pub windowed: bool,
    /// Must equal the number of bands when given.
    pub count: Option<usize>,
    pub tiled: bool,
    pub compress: Option<String>,
    /// Extra driver creation options.
    pub creation_options: BTreeMap<String, String>,
    pub pcr_vs: Option<ValueScale>,
    pub clone_path: Option<PathBuf>,
}

/// Georeferenced cells of one variable.
#[derive(Clone, PartialEq)]
pub struct RasterArray {
    name: Option<String>,
    data: RasterData,
    transform: GeoTransform,
    crs: Option<Crs>,
    nodata: Option<f64>,
    tags: Metadata,
    band_dim: Option<BandDim>,
}

impl Debug for RasterArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterArray")
            .field("name", &self.name)
            .field("dtype", &self.data.dtype())
            .field("shape", &self.data.shape())
            .field("crs", &self.crs)
            .field("nodata", &self.nodata)
            .field("band_dim", &self.band_dim.as_ref().map(|dim| &dim.name))
            .finish()
    }
}

impl RasterArray {
    pub(crate) fn init(
        name: Option<String>,
        data: RasterData,
        transform: GeoTransform,
        crs: Option<Crs>,
        nodata: Option<f64>,
        tags: Metadata,
    ) -> Self {
        let raster = Self {
            name,
            data,
            transform,
            crs,
            nodata,
            tags,
            band_dim: None,
        };
        debug!("new {raster:?}");
        raster
    }

    pub fn new(data: impl Into<RasterData>, transform: impl Into<GeoTransform>) -> Self {
        Self::init(
            None,
            data.into(),
            transform.into(),
            None,
            None,
            Metadata::new(),
        )
    }

    /// Single band grid of `shape` (rows, cols) filled with `nodata`.
    pub fn full_from_transform<T: DataType>(
        transform: impl Into<GeoTransform>,
        shape: (usize, usize),
        nodata: T,
        name: Option<&str>,
    ) -> Self {
        let (rows, cols) = shape;
        let data = RasterData::full(T::DTYPE, (1, rows, cols), nodata.to_f64());
        Self::init(
            name.map(String::from),
            data,
            transform.into(),
            None,
            Some(nodata.to_f64()),
            Metadata::new(),
        )
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_crs(mut self, crs: impl Into<Crs>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    /// Only sets the attribute, cells are left untouched.
    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn with_tags(mut self, tags: Metadata) -> Self {
        self.tags.extend(tags);
        self
    }

    pub fn with_band_dim(mut self, name: impl Into<String>, coords: Vec<i64>) -> Result<Self> {
        if coords.len() != self.band_count() {
            return Err(HydrioError::ColumnLength {
                name: name.into(),
                expected: self.band_count(),
                found: coords.len(),
            });
        }
        self.band_dim = Some(BandDim {
            name: name.into(),
            coords,
        });
        Ok(self)
    }

    /// Turns the band axis into a named dimension with coordinates `0..bands`.
    pub fn expand_dims(self, name: impl Into<String>) -> Self {
        let coords = (0..self.band_count() as i64).collect();
        Self {
            band_dim: Some(BandDim {
                name: name.into(),
                coords,
            }),
            ..self
        }
    }

    /// Moves the cells onto another grid without resampling.
    pub fn with_grid(mut self, transform: GeoTransform, crs: Option<Crs>) -> Self {
        self.transform = transform;
        self.crs = crs;
        self
    }

    /// Band `index` as a single band array.
    pub fn band(&self, index: usize) -> Result<RasterArray> {
        let count = self.band_count();
        if index >= count {
            return Err(HydrioError::BandIndex { index, count });
        }
        Ok(Self {
            data: self.data.select_bands(&[index]),
            band_dim: None,
            ..self.clone()
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn data(&self) -> &RasterData {
        &self.data
    }

    pub fn into_data(self) -> RasterData {
        self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn tags(&self) -> &Metadata {
        &self.tags
    }

    pub fn band_dim(&self) -> Option<&BandDim> {
        self.band_dim.as_ref()
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.data.shape();
        (rows, cols)
    }

    pub fn band_count(&self) -> usize {
        self.data.band_count()
    }

    /// 2 for a single unnamed band, 3 otherwise.
    pub fn ndim(&self) -> usize {
        if self.band_dim.is_none() && self.band_count() == 1 {
            2
        } else {
            3
        }
    }

    pub fn bounds(&self) -> geo::Rect {
        self.transform.bounds(self.shape())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn set_crs(&mut self, crs: Option<Crs>) {
        self.crs = crs;
    }

    /// Converts nodata cells to `NaN`, promoting integers to `Float64`.
    pub fn mask_nodata(mut self) -> Self {
        if let Some(nodata) = self.nodata {
            self.data = self.data.mask_nodata(nodata);
            self.nodata = Some(f64::NAN);
        } else if !self.data.dtype().is_float() {
            self.data = self.data.cast(DType::Float64);
        }
        self
    }

    /// Sets a new nodata value, rewriting cells holding the old one or `NaN`.
    pub fn set_nodata(mut self, nodata: f64) -> Self {
        if let Some(old) = self.nodata.filter(|old| !is_nodata(*old, nodata)) {
            self.data.replace(old, nodata);
        }
        if self.data.dtype().is_float() && !nodata.is_nan() {
            self.data.replace(f64::NAN, nodata);
        }
        self.nodata = Some(nodata);
        self
    }

    pub fn astype(mut self, dtype: DType) -> Self {
        self.data = self.data.cast(dtype);
        self
    }

    /// Cells where `keep` is false become nodata (`NaN` without one).
    pub fn apply_mask(&mut self, keep: &Array2<bool>) {
        let fill = self.nodata.unwrap_or(f64::NAN);
        self.data.apply_mask(keep, fill);
    }

    pub fn count_nodata(&self) -> usize {
        self.nodata
            .map_or(0, |nodata| self.data.count_equal(nodata))
    }

    /// Same transform within `1e-6` and same shape.
    pub fn identical_grid(&self, other: &RasterArray) -> bool {
        self.shape() == other.shape() && self.transform.almost_eq(&other.transform, 1e-6)
    }

    fn prepared(&self, options: &RasterWriteOptions) -> RasterArray {
        let mut raster = self.clone();
        if let Some(crs) = &options.crs {
            raster.crs = Some(crs.clone());
        }
        if let Some(nodata) = options.nodata {
            raster = raster.set_nodata(nodata);
        }
        if let Some(dtype) = options.dtype {
            raster = raster.astype(dtype);
        }
        raster.tags.extend(options.tags.clone());
        raster
    }

    pub fn to_raster<P: AsRef<Path>>(&self, path: P, options: &RasterWriteOptions) -> Result<()> {
        let path = path.as_ref();
        let bands = self.band_count();
        if let Some(count) = options.count.filter(|count| *count != bands) {
            return Err(HydrioError::BandCount { count, bands });
        }
        let driver = RasterDriver::for_path(path, options.driver.as_deref());
        let raster = self.prepared(options);
        info!("writing {raster:?} to {} with {}", path.display(), driver.gdal_name());
        match driver {
            RasterDriver::PCRaster => pcraster::write_map(&raster, path, options),
            _ => gdal_backend::write_raster(&raster, path, &driver, options),
        }
    }
}
