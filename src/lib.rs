//! Readers and writers for the vector, timeseries and raster files
//! hydrological models are built from.

mod components;
mod crs_geo;
mod errors;
mod indexes;
mod predicate;

pub use components::*;
pub use crs_geo::{Crs, CrsGeometry, WGS84};
pub use errors::{ErrorKind, HydrioError, Result};
pub use indexes::Indexes;
pub use predicate::Predicate;
