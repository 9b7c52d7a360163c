use std::{fmt, str::FromStr};

use gdal::spatial_ref::SpatialRef;
use geo::{BoundingRect, CoordNum, Rect};
use proj::{Proj, Transform};
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Coordinate reference system, either an EPSG code or any
/// definition GDAL and PROJ understand (WKT, PROJ string, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    Epsg(u32),
    Definition(String),
}

pub const WGS84: Crs = Crs::Epsg(4326);

impl Crs {
    pub fn epsg(&self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(*code),
            Crs::Definition(definition) => epsg_from_wkt(definition),
        }
    }

    /// Reads a WKT string, keeping the EPSG code when the root node has one.
    pub fn from_wkt(wkt: &str) -> Option<Self> {
        let wkt = wkt.trim();
        if wkt.is_empty() {
            return None;
        }
        Some(match epsg_from_wkt(wkt) {
            Some(code) => Crs::Epsg(code),
            None => Crs::Definition(wkt.to_string()),
        })
    }

    pub fn from_spatial_ref(srs: &SpatialRef) -> Result<Option<Self>> {
        Ok(Self::from_wkt(&srs.to_wkt()?))
    }

    pub fn to_spatial_ref(&self) -> Result<SpatialRef> {
        Ok(match self {
            Crs::Epsg(code) => SpatialRef::from_epsg(*code)?,
            Crs::Definition(definition) => SpatialRef::from_definition(definition)?,
        })
    }

    /// Same system, comparing EPSG codes where both sides have one.
    pub fn equivalent(&self, other: &Crs) -> bool {
        match (self.epsg(), other.epsg()) {
            (Some(lhs), Some(rhs)) => lhs == rhs,
            _ => self == other,
        }
    }

    /// `None` when no reprojection is needed.
    pub(crate) fn transformer(&self, to: &Crs) -> Result<Option<Proj>> {
        if self.equivalent(to) {
            return Ok(None);
        }
        let proj = Proj::new_known_crs(&self.to_string(), &to.to_string(), None)?;
        Ok(Some(proj))
    }
}

/// WKT1 ends the root node with its authority, e.g. `AUTHORITY["EPSG","3857"]]`.
fn epsg_from_wkt(wkt: &str) -> Option<u32> {
    let (_, code) = wkt
        .trim_end()
        .strip_suffix("\"]]")?
        .rsplit_once("AUTHORITY[\"EPSG\",\"")?;
    code.parse().ok()
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{code}"),
            Crs::Definition(definition) => f.write_str(definition),
        }
    }
}

impl FromStr for Crs {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let code = s
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("epsg:"))
            .map_or(s, |_| &s[5..]);
        Ok(match code.parse() {
            Ok(code) => Crs::Epsg(code),
            Err(_) => Crs::Definition(s.to_string()),
        })
    }
}

impl From<u32> for Crs {
    fn from(value: u32) -> Self {
        Crs::Epsg(value)
    }
}

impl From<&str> for Crs {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(crs) => crs,
            Err(infallible) => match infallible {},
        }
    }
}

/// Geometry tagged with the [Crs] its coordinates are in.
#[derive(Debug, Clone, PartialEq)]
pub struct CrsGeometry<G> {
    crs: Crs,
    geometry: G,
}

impl<G> CrsGeometry<G> {
    pub fn new(crs: Crs, geometry: G) -> Self {
        Self { crs, geometry }
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn into_geometry(self) -> G {
        self.geometry
    }
}

impl<G: Transform<f64, Output = G> + Clone> CrsGeometry<G> {
    pub fn with_crs(mut self, crs: &Crs) -> Result<Self> {
        if let Some(proj) = self.crs.transformer(crs)? {
            self.geometry.transform(&proj)?;
            self.crs = crs.clone();
        }
        Ok(self)
    }

    /// Clones if crs is same.
    pub fn projected_geometry(&self, crs: &Crs) -> Result<G> {
        match self.crs.transformer(crs)? {
            Some(proj) => Ok(self.geometry.transformed(&proj)?),
            None => Ok(self.geometry.clone()),
        }
    }
}

impl<G: BoundingRect<f64>> CrsGeometry<G> {
    pub fn bounding_rect(&self) -> Option<CrsGeometry<Rect<f64>>> {
        let geometry: Option<Rect<f64>> = self.geometry.bounding_rect().into();
        Some(CrsGeometry::new(self.crs.clone(), geometry?))
    }
}

pub(crate) fn rect_from_bounds<T: CoordNum>(bounds: [T; 4]) -> Rect<T> {
    let [xmin, ymin, xmax, ymax] = bounds;
    Rect::new((xmin, ymin), (xmax, ymax))
}
