pub mod backends;
pub mod drivers;
pub mod files;
pub mod geodataset;
pub mod pcraster;
pub mod raster;
pub mod timeseries;
pub mod transforms;
pub mod vector;

pub use drivers::{RasterDriver, TableDriver, VectorDriver};
pub use files::{open_mfraster, MfRasterOptions, RasterSources};
pub use geodataset::{open_geodataset, GeoDataset, GeoDatasetOptions};
pub use pcraster::{mapstack_path, write_clone, ValueScale};
pub use raster::{
    data::{DType, DataType, RasterData},
    dataset::{MapstackOptions, RasterDataset},
    open_raster, BandDim, OpenRasterOptions, RasterArray, RasterWriteOptions,
};
pub use timeseries::{open_timeseries_from_table, TimeSeries, TimeseriesOptions};
pub use transforms::GeoTransform;
pub use vector::{
    filter::{Mask, SpatialFilter},
    kind::GeometryKind,
    reader::{open_vector, open_vector_from_table, VectorOptions},
    value::Value,
    writer::{write_vector, write_xy},
    GeoTable,
};

use std::collections::BTreeMap;
pub type Metadata = BTreeMap<String, String>;
